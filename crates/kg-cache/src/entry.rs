use chrono::{DateTime, Utc};
use kg_types::RetrievalResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One persisted cache record: the serialized result plus `key`, `created_at`
/// and `ttl` (seconds, fractional below one second) alongside its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub ttl: f64,
    #[serde(flatten)]
    pub result: RetrievalResult,
}

impl CacheEntry {
    pub fn new(key: String, created_at: DateTime<Utc>, ttl: Duration, result: RetrievalResult) -> Self {
        Self {
            key,
            created_at,
            ttl: ttl.as_secs_f64(),
            result,
        }
    }

    /// Expired once strictly more than `ttl` has passed, at millisecond resolution.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.created_at);
        age.num_milliseconds() as f64 > (self.ttl * 1000.0).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kg_types::{RetrievalParams, StrategyKind};

    #[test]
    fn entry_flattens_result_fields() {
        let result = RetrievalResult::empty(StrategyKind::EntityCentric, "q", RetrievalParams::default());
        let created = Utc::now();
        let entry = CacheEntry::new("abc".into(), created, Duration::from_secs(60), result);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["key"], "abc");
        assert_eq!(json["ttl"], 60.0);
        assert_eq!(json["strategy"], "entity");
        assert_eq!(json["total_results"], 0);
        assert!(json["created_at"].is_string());

        assert!(!entry.is_expired(created + chrono::Duration::seconds(60)));
        assert!(entry.is_expired(created + chrono::Duration::seconds(61)));
    }

    #[test]
    fn sub_second_ttl_keeps_its_precision() {
        let result = RetrievalResult::empty(StrategyKind::Hybrid, "q", RetrievalParams::default());
        let created = Utc::now();
        let entry = CacheEntry::new("abc".into(), created, Duration::from_millis(500), result);
        assert_eq!(serde_json::to_value(&entry).unwrap()["ttl"], 0.5);
        assert!(!entry.is_expired(created + chrono::Duration::milliseconds(1)));
        assert!(!entry.is_expired(created + chrono::Duration::milliseconds(500)));
        assert!(entry.is_expired(created + chrono::Duration::milliseconds(501)));
    }

    #[test]
    fn whole_second_ttl_from_older_entries_still_reads() {
        let created = Utc::now();
        let mut json = serde_json::to_value(CacheEntry::new(
            "abc".into(),
            created,
            Duration::from_secs(1),
            RetrievalResult::empty(StrategyKind::Hybrid, "q", RetrievalParams::default()),
        ))
        .unwrap();
        json["ttl"] = serde_json::json!(60);
        let entry: CacheEntry = serde_json::from_value(json).unwrap();
        assert!(!entry.is_expired(created + chrono::Duration::seconds(60)));
    }
}
