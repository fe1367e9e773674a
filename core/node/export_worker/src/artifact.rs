use std::io::{Cursor, Write};

use enserver_crypto_primitives::ecdsa_util;
use enserver_export_proto::{SignatureInfo as WireSignatureInfo, TemporaryExposureKey, TEKSignature, TEKSignatureList, TemporaryExposureKeyExport};
use enserver_types::SignatureInfo;
use prost::Message;

use crate::signing::SigningKeyProvider;

/// 16-byte magic prefix every `export.bin` body starts with (spec §4.5
/// step 4), ahead of the protobuf-encoded `TemporaryExposureKeyExport`.
pub const HEADER_MAGIC: &[u8; 16] = b"EK Export v1    ";

pub struct FileRecords {
    pub keys: Vec<TemporaryExposureKey>,
    pub revised_keys: Vec<TemporaryExposureKey>,
}

pub struct BuiltFile {
    pub export_bin: Vec<u8>,
    pub export_sig: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("signing failed: {0}")]
    SignFailed(String),
    #[error("zip assembly failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("zip write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds `export.bin` + `export.sig` for one file of a batch (spec §4.5
/// step 4): canonical protobuf body with the `EK Export v1` header,
/// SHA-256'd and ECDSA-signed once per configured `SignatureInfo`.
pub async fn build_file(
    start_unix: i64,
    end_unix: i64,
    region: &str,
    batch_num: i32,
    batch_size: i32,
    records: FileRecords,
    signature_infos: &[SignatureInfo],
    signing_keys: &dyn SigningKeyProvider,
) -> Result<BuiltFile, ArtifactError> {
    let export = TemporaryExposureKeyExport {
        start_timestamp: start_unix,
        end_timestamp: end_unix,
        region: region.to_string(),
        batch_num,
        batch_size,
        signature_infos: signature_infos.iter().map(WireSignatureInfo::from).collect(),
        keys: records.keys,
        revised_keys: records.revised_keys,
    };

    let mut export_bin = HEADER_MAGIC.to_vec();
    export_bin.extend_from_slice(&export.encode_to_vec());

    let mut signatures = Vec::with_capacity(signature_infos.len());
    for info in signature_infos {
        let signing_key = signing_keys
            .resolve(info)
            .await
            .map_err(ArtifactError::SignFailed)?;
        let signature = ecdsa_util::sign_sha256_der(&signing_key, &export_bin);
        signatures.push(TEKSignature {
            signature_info: Some(WireSignatureInfo::from(info)),
            batch_num,
            batch_size,
            signature,
        });
    }
    let export_sig = TEKSignatureList { signatures }.encode_to_vec();

    Ok(BuiltFile { export_bin, export_sig })
}

/// Zips `export.bin`/`export.sig` into a single in-memory archive for
/// upload (spec §4.5 step 4: "Assemble a ZIP with entries `export.bin` and
/// `export.sig`").
pub fn zip_file(file: &BuiltFile) -> Result<Vec<u8>, ArtifactError> {
    let mut buf = Vec::new();
    {
        let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options: zip::write::FileOptions = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        writer.start_file("export.bin", options)?;
        writer.write_all(&file.export_bin)?;
        writer.start_file("export.sig", options)?;
        writer.write_all(&file.export_sig)?;
        writer.finish()?;
    }
    Ok(buf)
}

/// Deterministic bare filename so re-uploads overwrite (spec §4.5 step 5);
/// the caller prefixes `{bucket}/{filenameRoot}/` when talking to C3.
pub fn filename_for(start_unix: i64, end_unix: i64, batch_num: i32) -> String {
    format!("{start_unix}-{end_unix}-{batch_num}.zip")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::InMemorySigningKeyProvider;
    use enserver_types::SignatureInfoId;
    use p256::ecdsa::{SigningKey, VerifyingKey};
    use rand::rngs::OsRng;

    fn signature_info() -> SignatureInfo {
        SignatureInfo {
            id: SignatureInfoId(1),
            signing_key_resource_id: "resource-a".to_string(),
            key_id: "key-1".to_string(),
            key_version: "v1".to_string(),
            bundle_id: "com.example.app".to_string(),
            app_package_name: "com.example.app".to_string(),
        }
    }

    #[tokio::test]
    async fn builds_and_verifies_a_signed_file() {
        let signing_key = SigningKey::random(&mut OsRng);
        let verifying_key = VerifyingKey::from(&signing_key);
        let provider = InMemorySigningKeyProvider::new().with_key("resource-a", signing_key);
        let infos = vec![signature_info()];

        let file = build_file(
            1_600_000_000,
            1_600_003_600,
            "US",
            1,
            1,
            FileRecords { keys: vec![], revised_keys: vec![] },
            &infos,
            &provider,
        )
        .await
        .unwrap();

        assert!(file.export_bin.starts_with(HEADER_MAGIC));

        let sig_list = TEKSignatureList::decode(file.export_sig.as_slice()).unwrap();
        assert_eq!(sig_list.signatures.len(), 1);
        let der = &sig_list.signatures[0].signature;
        ecdsa_util::verify(&verifying_key, &file.export_bin, der).unwrap();
    }

    #[test]
    fn zip_contains_both_entries() {
        let file = BuiltFile { export_bin: b"bin".to_vec(), export_sig: b"sig".to_vec() };
        let bytes = zip_file(&file).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("export.bin").is_ok());
        assert!(archive.by_name("export.sig").is_ok());
    }
}
