use enserver_types::{SignatureInfo, SignatureInfoId};
use sqlx::PgConnection;

use crate::error::Result;
use crate::models::StorageSignatureInfo;

/// Repository for `signature_info` (C2): the signing-key bindings an
/// `ExportConfig` references, consulted by the worker (C9) when
/// assembling a `TEKSignatureList`.
pub struct SignatureInfoDal<'a> {
    pub conn: &'a mut PgConnection,
}

impl<'a> SignatureInfoDal<'a> {
    pub async fn find_many(&mut self, ids: &[SignatureInfoId]) -> Result<Vec<SignatureInfo>> {
        let raw_ids: Vec<i64> = ids.iter().map(|id| id.0).collect();
        let rows: Vec<StorageSignatureInfo> = sqlx::query_as(
            r#"
            SELECT id, signing_key_resource_id, key_id, key_version, bundle_id, app_package_name
            FROM signature_info WHERE id = ANY($1)
            "#,
        )
        .bind(&raw_ids)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows.into_iter().map(SignatureInfo::from).collect())
    }
}
