use enserver_types::AuthorizedApp;
use sqlx::PgConnection;

use crate::error::Result;
use crate::models::StorageAuthorizedApp;

/// Repository for `authorized_app` (C2), backing the registry cache (C4).
pub struct AuthorizedAppDal<'a> {
    pub conn: &'a mut PgConnection,
}

impl<'a> AuthorizedAppDal<'a> {
    pub async fn find(&mut self, app_package_name: &str) -> Result<Option<AuthorizedApp>> {
        let row: Option<StorageAuthorizedApp> = sqlx::query_as(
            r#"
            SELECT app_package_name, allowed_regions, allowed_health_authority_ids,
                   bypass_verification, bypass_revision_token
            FROM authorized_app WHERE app_package_name = $1
            "#,
        )
        .bind(app_package_name)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row.map(AuthorizedApp::from))
    }

    pub async fn all(&mut self) -> Result<Vec<AuthorizedApp>> {
        let rows: Vec<StorageAuthorizedApp> = sqlx::query_as(
            r#"
            SELECT app_package_name, allowed_regions, allowed_health_authority_ids,
                   bypass_verification, bypass_revision_token
            FROM authorized_app ORDER BY app_package_name
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows.into_iter().map(AuthorizedApp::from).collect())
    }
}
