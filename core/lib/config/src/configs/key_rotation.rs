use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the revision-key rotation job (C13), spec §4.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRotationConfig {
    /// A new allowed key is minted once the current one reaches this age.
    pub new_key_period: Duration,
    /// A demoted key is deleted once it has aged this long past demotion,
    /// invalidating any revision tokens still referencing it.
    pub delete_old_key_period: Duration,
}

impl Default for KeyRotationConfig {
    fn default() -> Self {
        Self {
            new_key_period: Duration::from_secs(7 * 24 * 3600),
            delete_old_key_period: Duration::from_secs(24 * 3600),
        }
    }
}
