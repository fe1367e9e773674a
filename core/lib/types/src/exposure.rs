use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::HealthAuthorityId;

/// A 16-byte Temporary Exposure Key seed, as broadcast by a device.
pub type KeyBytes = [u8; 16];

pub const MIN_ROLLING_PERIOD: i32 = 1;
pub const MAX_ROLLING_PERIOD: i32 = 144;

/// Diagnosis/report classification carried on a TEK.
///
/// Precedence for revisions (spec §4.3 step 4): `Unknown < SelfReport ==
/// Recursive < ClinicalDiagnosis < ConfirmedTest`. `Revoked` is terminal:
/// once set, no further revision is permitted regardless of the
/// precedence of the attempted new type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_type", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum ReportType {
    Unknown,
    ConfirmedTest,
    ClinicalDiagnosis,
    SelfReport,
    /// Produced only via federation import; never a revision target from publish.
    Recursive,
    Revoked,
}

impl ReportType {
    /// Revision precedence. Two types with equal precedence (`SelfReport`,
    /// `Recursive`) cannot revise one another.
    pub fn precedence(self) -> u8 {
        match self {
            ReportType::Unknown => 0,
            ReportType::SelfReport | ReportType::Recursive => 1,
            ReportType::ClinicalDiagnosis => 2,
            ReportType::ConfirmedTest => 3,
            ReportType::Revoked => 4,
        }
    }

    pub fn is_revoked(self) -> bool {
        matches!(self, ReportType::Revoked)
    }

    /// True if `self` may be revised to `new`, per spec §4.3 step 4 and
    /// the testable property in §8 ("precedence(A) < precedence(B)").
    pub fn may_revise_to(self, new: ReportType) -> bool {
        if self.is_revoked() {
            return false;
        }
        self.precedence() < new.precedence()
    }
}

/// A single prior state captured on revision (spec §3: "revised_* shadow
/// columns capturing a single prior state"). Bounded history by design —
/// see DESIGN.md for the rationale carried over from spec §9.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisedShadow {
    pub report_type: ReportType,
    pub days_since_onset_of_symptoms: Option<i32>,
    pub revised_at: DateTime<Utc>,
}

/// One Temporary Exposure Key row, as persisted by the data store (C2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exposure {
    pub key_bytes: KeyBytes,
    pub transmission_risk: i32,
    pub app_package_name: String,
    pub rolling_start_interval_number: i32,
    pub rolling_period: i32,
    pub regions: BTreeSet<String>,
    pub traveler: bool,
    pub created_at: DateTime<Utc>,
    pub local_provenance: bool,
    pub federation_sync_id: Option<String>,
    pub health_authority_id: Option<HealthAuthorityId>,
    pub report_type: ReportType,
    pub days_since_onset_of_symptoms: Option<i32>,
    pub revised: Option<RevisedShadow>,
    pub export_import_id: Option<String>,
}

impl Exposure {
    /// Spec §8: "for all TEK rows R, `len(R.key_bytes) = 16` and
    /// `R.rolling_period ∈ [1,144]`." `key_bytes` is a fixed-size array so
    /// the length half of the invariant is a type-level guarantee; this
    /// checks the rest.
    pub fn is_structurally_valid(&self) -> bool {
        (MIN_ROLLING_PERIOD..=MAX_ROLLING_PERIOD).contains(&self.rolling_period)
    }

    /// Regions are normalized to uppercase per spec §3.
    pub fn normalize_regions(regions: impl IntoIterator<Item = String>) -> BTreeSet<String> {
        regions.into_iter().map(|r| r.to_uppercase()).collect()
    }

    /// The last interval covered by this key's rolling period, used by
    /// "release same-day keys" and max-interval-age filtering (spec §4.3).
    pub fn last_interval(&self) -> i32 {
        self.rolling_start_interval_number + self.rolling_period
    }
}
