use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::HealthAuthorityId;

/// `[0, 14]` inclusive, 15 buckets, per spec §3 ("histogram oldest-TEK-days
/// [0..14]").
pub const OLDEST_TEK_DAYS_BUCKETS: usize = 15;
/// `[0, 28]` inclusive, 29 buckets, per spec §3 ("histogram onset-age-days
/// [0..28]").
pub const ONSET_AGE_DAYS_BUCKETS: usize = 29;

/// Per-(PHA, hour) publish statistics. Created lazily, mutated
/// read-modify-write inside the publish transaction, immutable after 48h
/// (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthAuthorityStats {
    pub health_authority_id: HealthAuthorityId,
    pub hour: DateTime<Utc>,
    pub publish_count: i64,
    pub tek_count: i64,
    pub revision_count: i64,
    pub oldest_tek_days_histogram: [i64; OLDEST_TEK_DAYS_BUCKETS],
    pub onset_age_days_histogram: [i64; ONSET_AGE_DAYS_BUCKETS],
    pub missing_onset_count: i64,
    /// Counts publishes accepted under a revision token decoded with a
    /// prior-but-not-yet-deleted AEAD key (resolves the open question in
    /// spec §9 — see DESIGN.md). Does not gate acceptance, only observes it.
    pub aging_revision_key_count: i64,
}

impl HealthAuthorityStats {
    pub fn new_for_hour(health_authority_id: HealthAuthorityId, at: DateTime<Utc>) -> Self {
        Self {
            health_authority_id,
            hour: truncate_to_hour(at),
            publish_count: 0,
            tek_count: 0,
            revision_count: 0,
            oldest_tek_days_histogram: [0; OLDEST_TEK_DAYS_BUCKETS],
            onset_age_days_histogram: [0; ONSET_AGE_DAYS_BUCKETS],
            missing_onset_count: 0,
            aging_revision_key_count: 0,
        }
    }

    pub fn is_immutable(&self, now: DateTime<Utc>) -> bool {
        now - self.hour >= chrono::Duration::hours(48)
    }

    pub fn record_publish(&mut self) {
        self.publish_count += 1;
    }

    pub fn record_tek(&mut self, oldest_tek_days: i64) {
        self.tek_count += 1;
        let bucket = oldest_tek_days.clamp(0, (OLDEST_TEK_DAYS_BUCKETS - 1) as i64) as usize;
        self.oldest_tek_days_histogram[bucket] += 1;
    }

    pub fn record_revision(&mut self) {
        self.revision_count += 1;
    }

    pub fn record_onset_age(&mut self, days: Option<i64>) {
        match days {
            Some(days) => {
                let bucket = days.clamp(0, (ONSET_AGE_DAYS_BUCKETS - 1) as i64) as usize;
                self.onset_age_days_histogram[bucket] += 1;
            }
            None => self.missing_onset_count += 1,
        }
    }

    pub fn record_aging_revision_key(&mut self) {
        self.aging_revision_key_count += 1;
    }
}

pub fn truncate_to_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_clamps_out_of_range_values() {
        let mut stats = HealthAuthorityStats::new_for_hour(HealthAuthorityId(1), Utc::now());
        stats.record_tek(1000);
        assert_eq!(
            stats.oldest_tek_days_histogram[OLDEST_TEK_DAYS_BUCKETS - 1],
            1
        );
        stats.record_onset_age(Some(-5));
        assert_eq!(stats.onset_age_days_histogram[0], 1);
    }

    #[test]
    fn missing_onset_counted_separately() {
        let mut stats = HealthAuthorityStats::new_for_hour(HealthAuthorityId(1), Utc::now());
        stats.record_onset_age(None);
        assert_eq!(stats.missing_onset_count, 1);
        assert_eq!(stats.onset_age_days_histogram.iter().sum::<i64>(), 0);
    }

    #[test]
    fn immutable_after_48_hours() {
        let stats = HealthAuthorityStats::new_for_hour(HealthAuthorityId(1), Utc::now());
        assert!(!stats.is_immutable(Utc::now()));
        assert!(stats.is_immutable(Utc::now() + chrono::Duration::hours(49)));
    }
}
