//! Raw feed payloads as fetched by the poll loops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};

/// The most recently fetched payload of a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub raw: Value,
    pub fetched_at: DateTime<Utc>,
}

impl FeedSnapshot {
    pub fn new(raw: Value) -> Self {
        Self {
            raw,
            fetched_at: Utc::now(),
        }
    }

    /// First item of an array payload; the main feed is newest-first.
    pub fn first_item(&self) -> Result<&Value> {
        match &self.raw {
            Value::Array(items) => items
                .first()
                .ok_or_else(|| AppError::malformed("feed returned an empty array")),
            other => Err(AppError::malformed(format!(
                "feed payload is not an array: {}",
                type_name(other)
            ))),
        }
    }

    /// Short content hash for log lines.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(&self.raw).unwrap_or_default();
        let digest = Sha256::digest(&bytes);
        hex::encode(&digest[..6])
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_first_item() {
        let snapshot = FeedSnapshot::new(json!([{"code": 551}, {"code": 556}]));
        assert_eq!(snapshot.first_item().unwrap()["code"], 551);
    }

    #[test]
    fn test_first_item_rejects_empty_and_objects() {
        assert!(FeedSnapshot::new(json!([])).first_item().is_err());
        assert!(FeedSnapshot::new(json!({"code": 551})).first_item().is_err());
    }

    #[test]
    fn test_fingerprint_follows_content() {
        let a = FeedSnapshot::new(json!([{"code": 551}]));
        let b = FeedSnapshot::new(json!([{"code": 551}]));
        let c = FeedSnapshot::new(json!([{"code": 556}]));
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 12);
    }
}
