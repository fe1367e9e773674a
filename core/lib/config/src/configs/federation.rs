use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the federation push/pull transport (C10/C11), spec §4.7.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Soft cap on records returned per `Fetch` stream call (push side).
    pub max_records_per_call: usize,
    /// Overall deadline for one RPC.
    pub rpc_timeout: Duration,
    /// Disables the mTLS/JWT-audience interceptor; test-only override.
    pub allow_any_client: bool,
    /// Regions included by default when a pull request omits its own filter.
    pub default_include_regions: Vec<String>,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            max_records_per_call: 500,
            rpc_timeout: Duration::from_secs(30),
            allow_any_client: false,
            default_include_regions: Vec::new(),
        }
    }
}
