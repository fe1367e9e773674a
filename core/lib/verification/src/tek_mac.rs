use base64::{engine::general_purpose::STANDARD, Engine};

/// One submitted TEK, reduced to the fields the `tekmac` canonical
/// encoding binds (spec §4.2 step 4).
#[derive(Debug, Clone)]
pub struct TekForMac {
    pub key_bytes: [u8; 16],
    pub interval_number: i32,
    pub interval_count: i32,
    pub transmission_risk: i32,
}

/// Canonical encoding: TEKs sorted by key bytes ascending, each rendered
/// as `base64(key).interval_number.interval_count.transmission_risk`,
/// joined by `,` (spec §4.2 step 4). Stable under reordering of the
/// input, which is what lets `tekmac` validate identically for any
/// permutation of the same TEK set.
pub fn canonical_encoding(teks: &[TekForMac]) -> String {
    let mut sorted: Vec<&TekForMac> = teks.iter().collect();
    sorted.sort_by(|a, b| a.key_bytes.cmp(&b.key_bytes));
    sorted
        .iter()
        .map(|tek| {
            format!(
                "{}.{}.{}.{}",
                STANDARD.encode(tek.key_bytes),
                tek.interval_number,
                tek.interval_count,
                tek.transmission_risk
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}
