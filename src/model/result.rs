//! `SearchResult` and `Record` (spec §3): produced by the session pipeline,
//! optionally ranked by the fuzzy matcher, consumed once by the caller.

use chrono::{DateTime, Utc};

use super::query::Language;
use crate::model::proxy::ProxyKind;

/// Outcome status of a search (spec §3, §6 response envelope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Found,
    NotFound,
    Error,
    Partial,
}

/// A single result row (spec §3 `Record`). Unknown/absent fields are
/// explicit empty strings, never a null sentinel (spec §4.F "Result
/// extraction").
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Record {
    pub alien_number: String,
    pub full_name: String,
    pub date_of_birth: String,
    pub country_of_birth: String,
    pub facility_name: String,
    pub facility_location: String,
    pub custody_status: String,
    pub last_updated: String,
    /// Present only when the fuzzy matcher ranked this record (spec §3).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Metadata describing how a `SearchResult` was produced (spec §3, §4.H
/// step 6 "assemble metadata").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchMetadata {
    pub timestamp: DateTime<Utc>,
    pub processing_duration_ms: u64,
    pub language: Language,
    pub corrections_applied: Vec<String>,
    pub total_candidates: usize,
    /// Number of attempt-loop retries consumed before completion or failure
    /// (spec §8 scenario 4: "metadata indicates ≥1 retry").
    pub retries: u32,
    /// Kind of the proxy used on the attempt that finally completed the
    /// search, if any (spec §8 scenario 4: "final proxy kind is
    /// residential").
    pub final_proxy_kind: Option<ProxyKind>,
    /// Human-readable summary of threat-level transitions observed during
    /// this search (spec §4.H step 6).
    pub threat_transitions: Vec<String>,
}

impl SearchMetadata {
    pub fn new(language: Language) -> Self {
        Self {
            timestamp: Utc::now(),
            processing_duration_ms: 0,
            language,
            corrections_applied: Vec::new(),
            total_candidates: 0,
            retries: 0,
            final_proxy_kind: None,
            threat_transitions: Vec::new(),
        }
    }
}

/// Result of a single search invocation (spec §3 `SearchResult`). Created
/// once per invocation, consumed once, optionally cached.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResult {
    pub status: SearchStatus,
    pub records: Vec<Record>,
    pub metadata: SearchMetadata,
}

impl SearchResult {
    pub fn not_found(language: Language) -> Self {
        Self {
            status: SearchStatus::NotFound,
            records: Vec::new(),
            metadata: SearchMetadata::new(language),
        }
    }

    pub fn found(records: Vec<Record>, language: Language) -> Self {
        let mut metadata = SearchMetadata::new(language);
        metadata.total_candidates = records.len();
        Self {
            status: SearchStatus::Found,
            records,
            metadata,
        }
    }
}
