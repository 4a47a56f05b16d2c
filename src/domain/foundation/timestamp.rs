//! Timestamp value object.
//!
//! Results are stamped once at creation. Ordering on `Timestamp` is what
//! history listings sort by, newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// UTC instant, serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wraps a stored instant.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(rfc3339: &str) -> Timestamp {
        Timestamp::from_datetime(
            DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    #[test]
    fn now_is_current() {
        let before = Utc::now();
        let ts = Timestamp::now();
        assert!(ts.as_datetime() >= &before);
        assert!(*ts.as_datetime() <= Utc::now());
    }

    #[test]
    fn newest_first_sort() {
        let older = Timestamp::from_datetime(Utc::now() - Duration::minutes(5));
        let newer = Timestamp::now();

        let mut stamps = vec![older, newer];
        stamps.sort_by(|a, b| b.cmp(a));
        assert_eq!(stamps, vec![newer, older]);
    }

    #[test]
    fn serializes_as_rfc3339() {
        let json = serde_json::to_string(&at("2026-01-02T03:04:05Z")).unwrap();
        assert_eq!(json, "\"2026-01-02T03:04:05Z\"");

        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, at("2026-01-02T03:04:05Z"));
    }
}
