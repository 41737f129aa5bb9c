//! On-disk result cache (spec §6 "Persisted state layout", §9 supplemented
//! LRU eviction). One file per fingerprint under `<root>/cache/`; no other
//! on-disk state belongs to this crate.

use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::error::SearchError;
use crate::model::cache::CacheEntry;
use crate::model::query::{SearchKind, SearchQuery};
use crate::model::result::SearchResult;

/// Derives a stable, non-reversible fingerprint from the *normalized* query
/// fields (spec §3 `CacheEntry` invariant "never stores raw PII keys in
/// plaintext"). Two queries differing only in whitespace/case hash
/// identically.
pub fn fingerprint(query: &SearchQuery) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.language.to_string().as_bytes());
    hasher.update(query.kind.label().as_bytes());
    match &query.kind {
        SearchKind::ByName(n) => {
            hasher.update(n.first_name.trim().to_ascii_lowercase().as_bytes());
            hasher.update(n.last_name.trim().to_ascii_lowercase().as_bytes());
            if let Some(m) = &n.middle_name {
                hasher.update(m.trim().to_ascii_lowercase().as_bytes());
            }
            hasher.update(n.date_of_birth.format("%Y-%m-%d").to_string().as_bytes());
            hasher.update(n.country_of_birth.trim().to_ascii_lowercase().as_bytes());
        }
        SearchKind::ByAlienNumber(a) => hasher.update(a.digits().as_bytes()),
        SearchKind::ByFacility(f) => {
            for field in [&f.facility_name, &f.city, &f.state, &f.zip_code] {
                if let Some(v) = field {
                    hasher.update(v.trim().to_ascii_lowercase().as_bytes());
                }
            }
        }
    }
    format!("{:x}", hasher.finalize())
}

/// Many-reader, single-writer on-disk cache (spec §5 "Shared resources").
/// Each lookup/store opens and closes its own file; there is no in-process
/// shared mutable state to synchronize, consistent with the file-per-entry
/// layout.
pub struct ResultCache {
    root: PathBuf,
    max_entries: usize,
}

impl ResultCache {
    pub fn new(root: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self {
            root: root.into(),
            max_entries,
        }
    }

    fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.root.join(format!("{fingerprint}.entry"))
    }

    /// Returns a fresh, non-expired entry if present; expired entries read as
    /// a miss without being eagerly deleted (the next `store` sweep handles
    /// cleanup opportunistically per spec's no-background-sweeper model).
    pub fn lookup(&self, fingerprint: &str) -> Option<SearchResult> {
        let bytes = std::fs::read(self.entry_path(fingerprint)).ok()?;
        let entry: CacheEntry = serde_json::from_slice(&bytes).ok()?;
        if entry.is_expired_at(Utc::now()) {
            return None;
        }
        Some(entry.result)
    }

    /// Writes `result` under `fingerprint`, then opportunistically evicts the
    /// least-recently-created entries once the on-disk set exceeds
    /// `max_entries` (spec §9 supplement "Cache eviction").
    pub fn store(&self, fingerprint: &str, result: SearchResult, ttl_seconds: u64) -> Result<(), SearchError> {
        std::fs::create_dir_all(&self.root)?;
        let entry = CacheEntry::new(fingerprint, result, ttl_seconds);
        let bytes = serde_json::to_vec(&entry)?;
        std::fs::write(self.entry_path(fingerprint), bytes)?;
        self.evict_if_over_capacity()?;
        Ok(())
    }

    fn evict_if_over_capacity(&self) -> Result<(), SearchError> {
        let mut entries = list_entries(&self.root)?;
        if entries.len() <= self.max_entries {
            return Ok(());
        }
        entries.sort_by_key(|(_, created_at)| *created_at);
        let overflow = entries.len() - self.max_entries;
        for (path, _) in entries.into_iter().take(overflow) {
            let _ = std::fs::remove_file(path);
        }
        Ok(())
    }
}

fn list_entries(root: &Path) -> Result<Vec<(PathBuf, chrono::DateTime<Utc>)>, SearchError> {
    let mut out = Vec::new();
    let Ok(dir) = std::fs::read_dir(root) else {
        return Ok(out);
    };
    for entry in dir {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("entry") {
            continue;
        }
        if let Ok(bytes) = std::fs::read(&path) {
            if let Ok(cache_entry) = serde_json::from_slice::<CacheEntry>(&bytes) {
                out.push((path, cache_entry.created_at));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::query::Language;
    use chrono::NaiveDate;

    fn query() -> SearchQuery {
        SearchQuery::by_name("Jane", "Doe", None, NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(), "Mexico")
    }

    #[test]
    fn fingerprint_is_stable_across_whitespace_and_case() {
        let a = query();
        let mut b = query();
        if let SearchKind::ByName(n) = &mut b.kind {
            n.first_name = "  JANE  ".to_string();
            n.country_of_birth = "MEXICO".to_string();
        }
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn store_then_lookup_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path(), 10);
        let fp = fingerprint(&query());
        cache.store(&fp, SearchResult::not_found(Language::En), 3600).unwrap();
        assert!(cache.lookup(&fp).is_some());
    }

    #[test]
    fn expired_entry_reads_as_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path(), 10);
        let fp = fingerprint(&query());
        cache.store(&fp, SearchResult::not_found(Language::En), 0).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(cache.lookup(&fp).is_none());
    }

    #[test]
    fn eviction_keeps_pool_at_max_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path(), 2);
        for i in 0..4 {
            cache
                .store(&format!("fp-{i}"), SearchResult::not_found(Language::En), 3600)
                .unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let remaining = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 2);
    }

    #[test]
    fn miss_on_unknown_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path(), 10);
        assert!(cache.lookup("does-not-exist").is_none());
    }
}
