use chrono::{DateTime, TimeZone, Utc};

/// Truncates `at` down to the nearest multiple of `window`, per spec §4.4:
/// "truncation boundary is `TruncateWindow` ... start and end are
/// truncated down to a multiple of it."
pub fn truncate_down(at: DateTime<Utc>, window: std::time::Duration) -> DateTime<Utc> {
    let window_secs = window.as_secs().max(1) as i64;
    let floored = (at.timestamp().div_euclid(window_secs)) * window_secs;
    Utc.timestamp_opt(floored, 0).single().unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn truncates_to_hour_boundary() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 13, 45, 30).unwrap();
        let truncated = truncate_down(at, std::time::Duration::from_secs(3600));
        assert_eq!(truncated, Utc.with_ymd_and_hms(2026, 1, 1, 13, 0, 0).unwrap());
    }
}
