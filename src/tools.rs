//! Tool-invocation data shapes (spec §6): one request struct per operation in
//! the enumerated table, and the two response envelopes every operation
//! replies with. The transport that decodes an inbound call into one of
//! these, dispatches it to an [`crate::orchestrator::Orchestrator`], and
//! encodes the result back out is external to this crate — these types are
//! the contract it dispatches through, grounded on the `StatuslineInput`/
//! response struct pairing in the teacher's `network_segment.rs` (a plain
//! `serde`-derived input struct per entry point, decoded once at the top of
//! `main.rs` and never touched again downstream).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ErrorKind, SearchError};
use crate::model::query::{AlienNumberQuery, FacilityQuery, Language, SearchQuery};
use crate::model::result::{Record, SearchMetadata, SearchResult, SearchStatus};

/// `search_by_name` (spec §6): required `first_name`, `last_name`,
/// `date_of_birth`; everything else falls back to the active `Config`'s
/// search defaults when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchByNameRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub date_of_birth: NaiveDate,
    pub country_of_birth: String,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub fuzzy: Option<bool>,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
    #[serde(default)]
    pub date_tolerance_days: Option<u32>,
}

impl SearchByNameRequest {
    pub fn into_query(self, config: &Config) -> SearchQuery {
        let mut query = SearchQuery::by_name(
            self.first_name,
            self.last_name,
            self.middle_name,
            self.date_of_birth,
            self.country_of_birth,
        );
        query.language = self.language.unwrap_or(config.language.default);
        query.fuzzy = self.fuzzy.unwrap_or(config.search.default_fuzzy);
        query.confidence_threshold = self
            .confidence_threshold
            .unwrap_or(config.search.default_confidence_threshold);
        query.date_tolerance_days = self.date_tolerance_days;
        query
    }
}

/// `search_by_alien_number` (spec §6): required `alien_number`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchByAlienNumberRequest {
    pub alien_number: String,
    #[serde(default)]
    pub language: Option<Language>,
}

impl SearchByAlienNumberRequest {
    pub fn into_query(self, config: &Config) -> Result<SearchQuery, SearchError> {
        let alien_number = AlienNumberQuery::parse(&self.alien_number)?;
        let mut query = SearchQuery::by_alien_number(alien_number);
        query.language = self.language.unwrap_or(config.language.default);
        Ok(query)
    }
}

/// `search_by_facility` (spec §6): requires at least one of `facility_name`,
/// `{city, state}`, or `zip_code` — enforced by `SearchQuery::validate`, not
/// here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchByFacilityRequest {
    #[serde(default)]
    pub facility_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub facility_type: Option<String>,
    #[serde(default)]
    pub active_only: Option<bool>,
    #[serde(default)]
    pub language: Option<Language>,
}

impl SearchByFacilityRequest {
    pub fn into_query(self, config: &Config) -> SearchQuery {
        let facility = FacilityQuery {
            facility_name: self.facility_name,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            facility_type: self.facility_type,
            active_only: self.active_only.unwrap_or(false),
        };
        let mut query = SearchQuery::by_facility(facility);
        query.language = self.language.unwrap_or(config.language.default);
        query
    }
}

/// One entry in a `bulk_search` request's `searches` array (spec §6 "array of
/// above shapes"). Tagged by `kind` so a transport can decode a
/// heterogeneous array without knowing the shape ahead of time.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BulkSearchItem {
    ByName(SearchByNameRequest),
    ByAlienNumber(SearchByAlienNumberRequest),
    ByFacility(SearchByFacilityRequest),
}

impl BulkSearchItem {
    pub fn into_query(self, config: &Config) -> Result<SearchQuery, SearchError> {
        match self {
            BulkSearchItem::ByName(r) => Ok(r.into_query(config)),
            BulkSearchItem::ByAlienNumber(r) => r.into_query(config),
            BulkSearchItem::ByFacility(r) => Ok(r.into_query(config)),
        }
    }
}

/// `bulk_search` (spec §6): 1-10 searches, `max_concurrent` 1-5,
/// `stop_on_error` defaulting to `false`. Defaults and the 10-item cap are
/// enforced by `Orchestrator::search_bulk`, not here.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkSearchRequest {
    pub searches: Vec<BulkSearchItem>,
    #[serde(default)]
    pub max_concurrent: Option<usize>,
    #[serde(default)]
    pub stop_on_error: Option<bool>,
}

/// `parse_natural_query` (spec §6): required `query` text. `auto_execute`
/// governs whether the transport should immediately run the parsed query
/// through the orchestrator or just return it for confirmation; this crate
/// only produces the parsed `SearchQuery` either way (see
/// [`crate::natural_query::parse_natural_query`]) — deciding whether to
/// execute it is the transport's call, not this crate's.
#[derive(Debug, Clone, Deserialize)]
pub struct ParseNaturalQueryRequest {
    pub query: String,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub auto_execute: bool,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
}

/// Success envelope (spec §6 "Response envelope: `{status, results[],
/// search_metadata}` on success").
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub status: SearchStatus,
    pub results: Vec<Record>,
    pub search_metadata: SearchMetadata,
}

impl From<SearchResult> for SearchResponse {
    fn from(result: SearchResult) -> Self {
        Self {
            status: result.status,
            results: result.records,
            search_metadata: result.metadata,
        }
    }
}

/// Failure envelope (spec §6 "`{error: {kind, message}}` on failure").
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<SearchError> for ErrorEnvelope {
    fn from(err: SearchError) -> Self {
        Self {
            error: ErrorBody {
                kind: err.kind,
                message: err.message,
            },
        }
    }
}

/// Either envelope, for a transport that wants one serializable value per
/// call regardless of outcome (spec §3 `SearchResult`'s `status = error`
/// variant covers the in-band case; this covers the out-of-band one, where
/// the orchestrator returned `Err` before a `SearchResult` ever existed).
pub type ToolOutcome = Result<SearchResponse, ErrorEnvelope>;

pub fn to_outcome(result: Result<SearchResult, SearchError>) -> ToolOutcome {
    result.map(SearchResponse::from).map_err(ErrorEnvelope::from)
}
