use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use enserver_db::ExposureDal;
use enserver_types::{AuthorizedApp, Exposure, HealthAuthorityId, RevisionToken};

use crate::transform::TransformedKey;

/// What happened to one submitted key once weighed against the stored
/// row and the caller's revision token (spec §4.3 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionOutcome {
    Inserted,
    Revised,
    DroppedDuplicate,
}

/// Applies the insert-or-revise-or-drop decision for one key, inside the
/// caller's open transaction. Spec §3 invariant (e): a revision is an
/// in-place update of the existing row, never a second row for the same
/// key bytes; spec §4.3 step 4: revision requires either the app's
/// `bypass_revision_token` policy or a claim for this exact
/// `(key, interval_number, interval_count)` triple in the decoded token.
pub async fn apply_revision_decision(
    dal: &mut ExposureDal<'_>,
    key: &TransformedKey,
    claimed_by_token: Option<&RevisionToken>,
    app: &AuthorizedApp,
    app_package_name: &str,
    health_authority_id: Option<HealthAuthorityId>,
    regions: &BTreeSet<String>,
    traveler: bool,
    now: DateTime<Utc>,
) -> enserver_db::Result<RevisionOutcome> {
    let existing = dal.find_by_key(&key.key_bytes).await?;

    let Some(existing) = existing else {
        dal.insert_new(&Exposure {
            key_bytes: key.key_bytes,
            transmission_risk: key.transmission_risk,
            app_package_name: app_package_name.to_string(),
            rolling_start_interval_number: key.rolling_start_interval_number,
            rolling_period: key.rolling_period,
            regions: regions.clone(),
            traveler,
            created_at: now,
            local_provenance: true,
            federation_sync_id: None,
            health_authority_id,
            report_type: key.report_type,
            days_since_onset_of_symptoms: key.days_since_onset_of_symptoms,
            revised: None,
            export_import_id: None,
        })
        .await?;
        return Ok(RevisionOutcome::Inserted);
    };

    if !app.bypass_revision_token {
        let claimed = claimed_by_token
            .map(|token| {
                token.claims(
                    &key.key_bytes,
                    key.rolling_start_interval_number,
                    key.rolling_period,
                )
            })
            .unwrap_or(false);
        if !claimed {
            return Ok(RevisionOutcome::DroppedDuplicate);
        }
    }

    if !existing.report_type.may_revise_to(key.report_type) {
        return Ok(RevisionOutcome::DroppedDuplicate);
    }

    let applied = dal
        .apply_revision(&key.key_bytes, key.report_type, key.days_since_onset_of_symptoms, now)
        .await?;
    Ok(if applied {
        RevisionOutcome::Revised
    } else {
        RevisionOutcome::DroppedDuplicate
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use enserver_test_support::{sample_authorized_app, test_db_pool};
    use enserver_types::ReportType;

    fn key(byte: u8) -> TransformedKey {
        TransformedKey {
            key_bytes: [byte; 16],
            rolling_start_interval_number: 100,
            rolling_period: 144,
            transmission_risk: 1,
            report_type: ReportType::ConfirmedTest,
            days_since_onset_of_symptoms: Some(2),
        }
    }

    #[tokio::test]
    async fn fresh_key_is_inserted() {
        let Some(pool) = test_db_pool().await else {
            return;
        };
        let mut conn = pool.raw().acquire().await.unwrap();
        let mut dal = ExposureDal { conn: &mut conn };
        let app = sample_authorized_app("com.example.app");
        let outcome = apply_revision_decision(
            &mut dal,
            &key(9),
            None,
            &app,
            "com.example.app",
            None,
            &BTreeSet::new(),
            false,
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(outcome, RevisionOutcome::Inserted);
    }
}
