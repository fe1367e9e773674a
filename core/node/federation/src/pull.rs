use std::time::Duration;

use chrono::Utc;
use enserver_db::{DbPool, ExposureDal, FederationDal};
use enserver_types::FederationCursor;

use crate::error::FederationError;
use crate::metrics::METRICS;
use crate::partner::FederationPartner;
use crate::proto::federation_client::FederationClient;
use crate::proto::FetchRequest;

/// Runs one full pull cycle against `partner` (C11): streams pages from
/// its `Fetch` RPC, inserting every TEK and advancing the persisted
/// cursor after each page, so a mid-stream interruption resumes from the
/// last committed page instead of restarting (spec §4.7: "interruption
/// is safe"). Returns the number of TEKs imported.
pub async fn pull_once(
    partner: &FederationPartner,
    pool: &DbPool,
    rpc_timeout: Duration,
) -> Result<usize, FederationError> {
    let cursor = {
        let mut conn = pool.raw().acquire().await.map_err(|e| FederationError::Internal(e.into()))?;
        FederationDal { conn: &mut conn }
            .find(partner.id)
            .await
            .map_err(|e| FederationError::Internal(e.into()))?
    };
    let last_fetch_state = cursor.as_ref().and_then(|c| c.cursor.clone()).unwrap_or_default();

    let mut client = FederationClient::connect(partner.endpoint.clone()).await?;
    let request = tonic::Request::new(FetchRequest {
        last_fetch_state,
        regions_included: partner.include_regions.clone(),
        regions_excluded: partner.exclude_regions.clone(),
    });

    let mut stream = tokio::time::timeout(rpc_timeout, client.fetch(request))
        .await
        .map_err(|_| FederationError::Internal(anyhow::anyhow!("fetch call timed out")))??
        .into_inner();

    let mut imported = 0usize;
    while let Some(page) = stream.message().await? {
        if page.keys.is_empty() {
            continue;
        }

        let mut tx = pool.begin().await.map_err(|e| FederationError::Internal(e.into()))?;
        for key in page.keys {
            match key.into_exposure(partner.id, page.fetch_response_key_timestamp.clone()) {
                Some(exposure) => {
                    ExposureDal { conn: &mut tx }
                        .insert_federated(&exposure, Some(partner.id))
                        .await
                        .map_err(|e| FederationError::Internal(e.into()))?;
                    imported += 1;
                    METRICS.pull_keys_imported.inc();
                }
                None => METRICS.pull_bad_key_length.inc(),
            }
        }

        let next_cursor = FederationCursor {
            health_authority_id: partner.id,
            cursor: Some(page.fetch_response_key_timestamp),
            last_synced_at: Utc::now(),
        };
        FederationDal { conn: &mut tx }
            .upsert(&next_cursor)
            .await
            .map_err(|e| FederationError::Internal(e.into()))?;
        tx.commit().await.map_err(|e| FederationError::Internal(e.into()))?;
    }

    Ok(imported)
}

/// Pulls from every configured partner in turn, counting failures rather
/// than aborting the whole run on one partner's outage (spec §4.7: each
/// partner's cursor is independent).
pub async fn pull_all(
    partners: &[FederationPartner],
    pool: &DbPool,
    rpc_timeout: Duration,
) -> usize {
    let mut total_imported = 0usize;
    for partner in partners {
        match pull_once(partner, pool, rpc_timeout).await {
            Ok(imported) => total_imported += imported,
            Err(err) => {
                METRICS.pull_failures.inc();
                tracing::error!(
                    health_authority_id = partner.id.0,
                    error = %err,
                    "federation pull failed; cursor unchanged, will retry next run"
                );
            }
        }
    }
    total_imported
}

#[cfg(test)]
mod tests {
    use super::*;
    use enserver_types::HealthAuthorityId;

    #[test]
    fn partner_builder_carries_regions() {
        let partner = FederationPartner::new(HealthAuthorityId(1), "http://localhost:9000")
            .with_regions(vec!["US".to_string()], vec!["CA".to_string()]);
        assert_eq!(partner.include_regions, vec!["US".to_string()]);
        assert_eq!(partner.exclude_regions, vec!["CA".to_string()]);
    }
}
