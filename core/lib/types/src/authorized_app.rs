use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::HealthAuthorityId;

/// Per-app publish policy (spec §3). Keyed by app package name, not a
/// synthetic id, since that is how publish requests identify the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedApp {
    pub app_package_name: String,
    pub allowed_regions: BTreeSet<String>,
    pub allowed_health_authority_ids: BTreeSet<HealthAuthorityId>,
    pub bypass_verification: bool,
    pub bypass_revision_token: bool,
}

impl AuthorizedApp {
    pub fn allows_region(&self, region: &str) -> bool {
        self.allowed_regions.is_empty() || self.allowed_regions.contains(region)
    }

    pub fn allows_health_authority(&self, id: HealthAuthorityId) -> bool {
        self.allowed_health_authority_ids.is_empty()
            || self.allowed_health_authority_ids.contains(&id)
    }
}
