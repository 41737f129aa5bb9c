//! `CacheEntry` (spec §3): keyed by an anonymized fingerprint, never a raw PII
//! key.

use chrono::{DateTime, Utc};

use super::result::SearchResult;

/// A cached search result (spec §3). `fingerprint` is a hash of the
/// normalized query, never reversible to the original PII fields.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub result: SearchResult,
    pub created_at: DateTime<Utc>,
    pub ttl_seconds: u64,
}

impl CacheEntry {
    pub fn new(fingerprint: impl Into<String>, result: SearchResult, ttl_seconds: u64) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            result,
            created_at: Utc::now(),
            ttl_seconds,
        }
    }

    /// Spec §8 invariant: `now > created_at + ttl` must make `lookup` act as
    /// if the entry doesn't exist.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let expires_at = self.created_at + chrono::Duration::seconds(self.ttl_seconds as i64);
        now > expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::query::Language;

    #[test]
    fn entry_expires_strictly_after_ttl_elapses() {
        let mut entry = CacheEntry::new("fp", SearchResult::not_found(Language::En), 60);
        let just_before = entry.created_at + chrono::Duration::seconds(60);
        assert!(!entry.is_expired_at(just_before));

        let just_after = entry.created_at + chrono::Duration::seconds(61);
        assert!(entry.is_expired_at(just_after));

        entry.ttl_seconds = 0;
        assert!(!entry.is_expired_at(entry.created_at));
    }
}
