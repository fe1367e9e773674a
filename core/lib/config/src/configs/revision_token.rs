use serde::{Deserialize, Serialize};

/// Tunables for the revision-token codec (C5), spec §4.1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionTokenConfig {
    /// Additional authenticated data bound into every seal/open call. A
    /// fixed constant, per spec §4.1 ("AAD = configured constant").
    pub aad: Vec<u8>,
    /// Decoded token payloads shorter than this (after un-padding) are
    /// rejected, per spec §4.1.
    pub min_decoded_length: usize,
}

impl Default for RevisionTokenConfig {
    fn default() -> Self {
        Self {
            aad: b"enserver-revision-token-v1".to_vec(),
            min_decoded_length: 16,
        }
    }
}
