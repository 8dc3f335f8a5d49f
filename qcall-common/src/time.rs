//! Timestamp utilities

use chrono::{DateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC time formatted as RFC 3339 with second precision
/// (the `timestamp` field of every API response)
pub fn rfc3339_now() -> String {
    now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // After 2000-01-01, before 2100-01-01
        assert!(timestamp.timestamp() > 946_684_800);
        assert!(timestamp.timestamp() < 4_102_444_800);
    }

    #[test]
    fn test_rfc3339_now_is_utc_seconds() {
        let stamp = rfc3339_now();
        assert!(stamp.ends_with('Z'), "expected UTC suffix: {}", stamp);
        assert!(!stamp.contains('.'), "expected second precision: {}", stamp);
        assert!(DateTime::parse_from_rfc3339(&stamp).is_ok());
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0), Duration::ZERO);
        assert_eq!(millis_to_duration(100), Duration::from_millis(100));
        assert_eq!(millis_to_duration(10_000), Duration::from_secs(10));
    }
}
