use enserver_types::{AuthorizedApp, HealthAuthorityId};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageAuthorizedApp {
    pub app_package_name: String,
    pub allowed_regions: Vec<String>,
    pub allowed_health_authority_ids: Vec<i64>,
    pub bypass_verification: bool,
    pub bypass_revision_token: bool,
}

impl From<StorageAuthorizedApp> for AuthorizedApp {
    fn from(row: StorageAuthorizedApp) -> Self {
        AuthorizedApp {
            app_package_name: row.app_package_name,
            allowed_regions: row.allowed_regions.into_iter().collect(),
            allowed_health_authority_ids: row
                .allowed_health_authority_ids
                .into_iter()
                .map(HealthAuthorityId)
                .collect(),
            bypass_verification: row.bypass_verification,
            bypass_revision_token: row.bypass_revision_token,
        }
    }
}
