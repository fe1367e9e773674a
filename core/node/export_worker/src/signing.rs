use std::collections::HashMap;

use async_trait::async_trait;
use enserver_types::SignatureInfo;
use p256::ecdsa::SigningKey;

/// Narrow seam to the signing-key store: `SignatureInfo.signing_key_resource_id`
/// is opaque to the core (spec §3 doc comment on `SignatureInfo`) and
/// resolved here, the same way [`enserver_revision_token::RevisionKeyProvider`]
/// resolves a revision key id into AEAD key material. A production
/// deployment backs this with a real KMS; [`InMemorySigningKeyProvider`] is
/// the local-development/test stand-in, mirroring
/// `enserver_object_store::InMemoryObjectStore`.
#[async_trait]
pub trait SigningKeyProvider: Send + Sync {
    async fn resolve(&self, info: &SignatureInfo) -> Result<SigningKey, String>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemorySigningKeyProvider {
    keys: HashMap<String, SigningKey>,
}

impl InMemorySigningKeyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, resource_id: impl Into<String>, key: SigningKey) -> Self {
        self.keys.insert(resource_id.into(), key);
        self
    }
}

#[async_trait]
impl SigningKeyProvider for InMemorySigningKeyProvider {
    async fn resolve(&self, info: &SignatureInfo) -> Result<SigningKey, String> {
        self.keys
            .get(&info.signing_key_resource_id)
            .cloned()
            .ok_or_else(|| format!("no signing key for resource {}", info.signing_key_resource_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enserver_types::SignatureInfoId;
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
    async fn resolves_a_registered_key() {
        let key = SigningKey::random(&mut OsRng);
        let provider = InMemorySigningKeyProvider::new().with_key("resource-a", key.clone());
        let resolved = provider.resolve(&signature_info()).await.unwrap();
        assert_eq!(resolved.to_bytes(), key.to_bytes());
    }

    #[tokio::test]
    async fn unknown_resource_is_an_error() {
        let provider = InMemorySigningKeyProvider::new();
        assert!(provider.resolve(&signature_info()).await.is_err());
    }
}
