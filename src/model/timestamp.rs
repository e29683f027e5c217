//! Entity timestamps.
//!
//! Archives carry timestamps either as Unix milliseconds or as RFC 3339
//! strings. Both are accepted and written back in the form they came in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A `createdAt` / `updatedAt` value as found in an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Unix milliseconds
    Millis(i64),
    /// Date string, normally RFC 3339
    Text(String),
}

impl Timestamp {
    /// The current time in milliseconds.
    #[must_use]
    pub fn now() -> Self {
        Self::Millis(Utc::now().timestamp_millis())
    }

    /// Unix milliseconds, or `None` for a string that is not RFC 3339.
    #[must_use]
    pub fn millis(&self) -> Option<i64> {
        match self {
            Self::Millis(ms) => Some(*ms),
            Self::Text(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.timestamp_millis()),
        }
    }
}

impl From<i64> for Timestamp {
    fn from(ms: i64) -> Self {
        Self::Millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_both_forms() {
        let millis: Timestamp = serde_json::from_value(serde_json::json!(1_737_367_200_000_i64)).unwrap();
        let text: Timestamp = serde_json::from_value(serde_json::json!("2025-01-20T10:00:00Z")).unwrap();

        assert_eq!(millis, Timestamp::Millis(1_737_367_200_000));
        assert_eq!(text.millis(), Some(1_737_367_200_000));
    }

    #[test]
    fn test_keeps_original_form() {
        let value = serde_json::json!("2025-01-20T10:00:00+02:00");
        let ts: Timestamp = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&ts).unwrap(), value);
    }

    #[test]
    fn test_unparseable_text_has_no_millis() {
        assert_eq!(Timestamp::Text("yesterday".into()).millis(), None);
    }
}
