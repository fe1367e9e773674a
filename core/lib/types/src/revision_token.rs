use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::exposure::KeyBytes;

/// Wire version of `RevisionToken`, bumped whenever the canonical
/// serialization changes (spec §3: "Version, timestamp, list of...").
pub const REVISION_TOKEN_WIRE_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionTokenEntry {
    pub key_bytes: KeyBytes,
    pub interval_number: i32,
    pub interval_count: i32,
}

/// The decoded capability: exactly which `(key, interval_number,
/// interval_count)` triples the holder may revise (spec §4.1, §4.3 step 4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionToken {
    pub version: u8,
    pub timestamp: DateTime<Utc>,
    pub entries: Vec<RevisionTokenEntry>,
}

impl RevisionToken {
    pub fn new(entries: Vec<RevisionTokenEntry>, now: DateTime<Utc>) -> Self {
        Self {
            version: REVISION_TOKEN_WIRE_VERSION,
            timestamp: now,
            entries,
        }
    }

    pub fn claims(&self, key_bytes: &KeyBytes, interval_number: i32, interval_count: i32) -> bool {
        self.entries.iter().any(|e| {
            &e.key_bytes == key_bytes
                && e.interval_number == interval_number
                && e.interval_count == interval_count
        })
    }
}
