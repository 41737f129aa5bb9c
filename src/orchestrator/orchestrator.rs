//! `Orchestrator` (spec §2.H, §4.H, ~15% share): the top-level driver.
//! Validates input, checks the cache, drives one search to completion
//! through the session pipeline, adjusts strategy on failure, ranks on
//! success, and assembles the final metadata.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::watch;
use uuid::Uuid;

use super::cache::{fingerprint, ResultCache};
use super::retry::{calculate_retry_backoff, classify_attempt_error, AttemptOutcome};
use crate::browser_fallback::{BrowserFallback, UnavailableBrowserFallback};
use crate::config::Config;
use crate::coordinator::AntiDetectionCoordinator;
use crate::diagnostics::{DiagnosticEvent, EventKind, RotatingLogger};
use crate::error::{ErrorKind, SearchError};
use crate::fuzzy;
use crate::model::proxy::ProxyKind;
use crate::model::query::SearchQuery;
use crate::model::result::{SearchMetadata, SearchResult, SearchStatus};
use crate::model::session::{RequestKind, ResponseClassification, SessionState, ThreatLevel};
use crate::session::{HttpTransport, ReqwestHttpTransport, SessionPhase, SessionPipeline};

/// Per-search overall deadline (spec §5 "Timeouts... default 120s"). Not a
/// configuration knob — §6's enumerated option table only exposes the
/// per-request timeout.
const OVERALL_DEADLINE: Duration = Duration::from_secs(120);

/// How long `red` pauses the session before requesting a pool refresh and
/// offering the attempt to the browser fallback (spec §4.E "red: pause the
/// session; request pool refresh from A; optionally hand control to the
/// external browser-automation fallback").
const RED_PAUSE: Duration = Duration::from_secs(2);

/// Maximum `searches` accepted by `search_bulk` (spec §6 `bulk_search`
/// envelope, "1..10").
const MAX_BULK_SEARCHES: usize = 10;

/// Maps a surfaced pipeline error to the classification the coordinator
/// needs to advance threat state (spec §4.H step 4b). `SessionPipeline::run`
/// already collapsed the HTTP status into an `ErrorKind`, so the status
/// carried in the reconstructed classification is a representative value —
/// `next_threat_level` only discriminates on the classification *variant*
/// here, never on the exact status.
fn classification_for_error(kind: ErrorKind) -> Option<ResponseClassification> {
    match kind {
        ErrorKind::Blocked => Some(ResponseClassification::Blocked { status: 403 }),
        ErrorKind::CaptchaRequired => Some(ResponseClassification::Captcha),
        ErrorKind::RateLimited => Some(ResponseClassification::RateLimited { status: 429 }),
        ErrorKind::UpstreamTimeout => Some(ResponseClassification::ServerError { status: 504 }),
        ErrorKind::ParseFailure | ErrorKind::NoProxyAvailable | ErrorKind::Validation | ErrorKind::Cancelled | ErrorKind::Internal => None,
    }
}

fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
}

fn check_cancelled(cancel: &Option<watch::Receiver<bool>>, correlation_id: Uuid) -> Result<(), SearchError> {
    if is_cancelled(cancel) {
        Err(SearchError::cancelled("search cancelled").with_correlation_id(correlation_id))
    } else {
        Ok(())
    }
}

/// Drives searches end to end (spec §4.H). Owns the long-lived pieces — the
/// anti-detection coordinator and the on-disk result cache — that outlive
/// any single search; a fresh [`crate::model::session::SessionState`] and
/// HTTP transport are created per attempt.
pub struct Orchestrator {
    config: Config,
    coordinator: AntiDetectionCoordinator,
    cache: ResultCache,
    logger: Option<RotatingLogger>,
    browser_fallback: Arc<dyn BrowserFallback>,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        let coordinator = AntiDetectionCoordinator::new(&config);
        let cache = ResultCache::new(cache_root(), config.cache.max_entries);
        Self {
            config,
            coordinator,
            cache,
            logger: None,
            browser_fallback: Arc::new(UnavailableBrowserFallback),
        }
    }

    /// Enables JSONL diagnostics logging at `path` (spec's logging-sinks
    /// non-goal excludes export destinations, not the logger itself).
    pub fn with_diagnostics_log(mut self, path: PathBuf) -> Self {
        self.logger = Some(RotatingLogger::new(path));
        self
    }

    /// Plugs in a real browser-automation rescue strategy for the `red`
    /// threat path (spec §4.E). Without this, `red` still pauses and
    /// refreshes the proxy pool, but the fallback hand-off is always
    /// `SearchError::Internal` via [`UnavailableBrowserFallback`].
    pub fn with_browser_fallback(mut self, fallback: Arc<dyn BrowserFallback>) -> Self {
        self.browser_fallback = fallback;
        self
    }

    fn log(&self, correlation_id: Uuid, kind: EventKind) {
        if let Some(logger) = &self.logger {
            let _ = logger.log(&DiagnosticEvent::new(correlation_id, kind));
        }
    }

    /// Runs one search to completion (spec §4.H contract).
    pub async fn search(&self, query: SearchQuery) -> Result<SearchResult, SearchError> {
        self.search_cancellable(query, None).await
    }

    /// Same as [`Self::search`], but checked at every suspension point named
    /// in spec §5 (pre-request delay, retry backoff) so a caller can abort a
    /// long-running search without waiting for it to settle naturally.
    pub async fn search_cancellable(
        &self,
        query: SearchQuery,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<SearchResult, SearchError> {
        let correlation_id = Uuid::new_v4();
        query.validate().map_err(|e| e.with_correlation_id(correlation_id).with_redacted_query(query.redacted()))?;

        let fp = fingerprint(&query);
        if self.config.cache.enabled {
            if let Some(cached) = self.cache.lookup(&fp) {
                self.log(correlation_id, EventKind::CacheHit { fingerprint: fp.clone() });
                return Ok(cached);
            }
            self.log(correlation_id, EventKind::CacheMiss { fingerprint: fp.clone() });
        }

        let deadline = Instant::now() + OVERALL_DEADLINE;
        let result = self.run_attempts(&query, correlation_id, cancel, deadline).await;

        match result {
            Ok(search_result) => {
                if self.config.cache.enabled && search_result.status != SearchStatus::Error {
                    let _ = self.cache.store(&fp, search_result.clone(), self.config.cache.ttl_seconds);
                }
                self.log(
                    correlation_id,
                    EventKind::SearchCompleted {
                        status: format!("{:?}", search_result.status).to_ascii_lowercase(),
                        duration_ms: search_result.metadata.processing_duration_ms,
                        candidates: search_result.metadata.total_candidates,
                    },
                );
                Ok(search_result)
            }
            Err(err) => Err(err.with_redacted_query(query.redacted())),
        }
    }

    async fn run_attempts(
        &self,
        query: &SearchQuery,
        correlation_id: Uuid,
        cancel: Option<watch::Receiver<bool>>,
        deadline: Instant,
    ) -> Result<SearchResult, SearchError> {
        /// What the attempt loop settled on: a phase that still needs ranking
        /// and metadata assembly, or a `SearchResult` the browser fallback
        /// already produced end to end.
        enum Settled {
            Phase(SessionPhase),
            Rescued(SearchResult),
        }

        let start = Instant::now();
        let mut session = SessionState::new(correlation_id, query.language);
        session.behavior = crate::model::behavior::BehaviorProfile::new(self.config.behavior.profile);

        let transport = ReqwestHttpTransport::new(self.config.http.timeout_seconds);
        let request_deadline = Duration::from_secs(self.config.http.timeout_seconds);
        let max_attempts = self.config.retry.max_attempts.max(1);

        let mut rng = SmallRng::from_entropy();
        let mut retries_used = 0u32;
        let mut parse_failure_retry_used = false;
        let mut no_proxy_retry_used = false;
        let mut threat_transitions = Vec::new();

        let settled = loop {
            if Instant::now() >= deadline {
                break Err(SearchError::upstream_timeout("overall search deadline exceeded").with_correlation_id(correlation_id));
            }
            check_cancelled(&cancel, correlation_id)?;

            let snapshot = match self.coordinator.prepare(&mut session, RequestKind::FormFetch).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    // No proxy was acquired yet on this path, so there is
                    // nothing to release; the retry bookkeeping is otherwise
                    // identical to a failed attempt (spec §4.H "no healthy
                    // proxy... retried once after requesting a pool
                    // refresh").
                    match classify_attempt_error(err) {
                        AttemptOutcome::Fatal(err) => break Err(err),
                        AttemptOutcome::Transient(err) => {
                            if err.kind == ErrorKind::NoProxyAvailable {
                                if no_proxy_retry_used {
                                    break Err(err);
                                }
                                no_proxy_retry_used = true;
                                self.coordinator.refresh_proxies(&self.config).await;
                            }
                            retries_used += 1;
                            if retries_used > max_attempts {
                                break Err(err);
                            }
                            check_cancelled(&cancel, correlation_id)?;
                            let backoff = calculate_retry_backoff(retries_used - 1, self.config.retry.backoff_base_ms, &mut rng);
                            tokio::time::sleep(backoff).await;
                            continue;
                        }
                    }
                }
            };
            tokio::time::sleep(snapshot.pre_delay).await;
            check_cancelled(&cancel, correlation_id)?;

            let pipeline = SessionPipeline::new(&transport as &dyn HttpTransport, &self.config.http.base_url);
            let attempt = tokio::time::timeout(request_deadline, pipeline.run(&mut session, query, &snapshot.headers)).await;

            let outcome = match attempt {
                Err(_elapsed) => Err(SearchError::upstream_timeout("per-request deadline exceeded").with_correlation_id(correlation_id)),
                Ok(inner) => inner,
            };

            match outcome {
                Ok(phase) => {
                    let classification = match &phase {
                        SessionPhase::Results(_) => ResponseClassification::Results,
                        SessionPhase::NotFound => ResponseClassification::NotFound,
                    };
                    let before = session.threat_level;
                    self.coordinator.observe(&mut session, classification).await;
                    if session.threat_level != before {
                        threat_transitions.push(format!("{before:?}->{:?}", session.threat_level));
                    }
                    if let Some(proxy) = session.proxy.clone() {
                        self.coordinator.proxy_pool().release(&proxy, true).await;
                    }
                    break Ok(Settled::Phase(phase));
                }
                Err(err) => {
                    if let Some(classification) = classification_for_error(err.kind) {
                        let before = session.threat_level;
                        self.coordinator.observe(&mut session, classification).await;
                        if session.threat_level != before {
                            let reason = format!("{:?}", err.kind);
                            self.log(
                                correlation_id,
                                EventKind::ThreatLevelChanged {
                                    from: format!("{before:?}"),
                                    to: format!("{:?}", session.threat_level),
                                    reason,
                                },
                            );
                            threat_transitions.push(format!("{before:?}->{:?}", session.threat_level));
                        }
                    }
                    if let Some(proxy) = session.proxy.clone() {
                        self.coordinator.proxy_pool().release(&proxy, false).await;
                    }

                    if session.threat_level == ThreatLevel::Red {
                        check_cancelled(&cancel, correlation_id)?;
                        tokio::time::sleep(RED_PAUSE).await;
                        self.coordinator.refresh_proxies(&self.config).await;
                        if let Ok(rescued) = self.browser_fallback.run(&session, query).await {
                            self.log(correlation_id, EventKind::RetryAttempted {
                                attempt: retries_used,
                                error_kind: "red_browser_fallback".to_string(),
                                backoff_ms: RED_PAUSE.as_millis() as u64,
                            });
                            break Ok(Settled::Rescued(rescued));
                        }
                    }

                    match classify_attempt_error(err) {
                        AttemptOutcome::Fatal(err) => break Err(err),
                        AttemptOutcome::Transient(err) => {
                            match err.kind {
                                ErrorKind::ParseFailure if parse_failure_retry_used => break Err(err),
                                ErrorKind::ParseFailure => parse_failure_retry_used = true,
                                ErrorKind::NoProxyAvailable if no_proxy_retry_used => break Err(err),
                                ErrorKind::NoProxyAvailable => {
                                    no_proxy_retry_used = true;
                                    self.coordinator.refresh_proxies(&self.config).await;
                                }
                                _ => {}
                            }

                            retries_used += 1;
                            if retries_used > max_attempts {
                                break Err(err);
                            }

                            self.log(
                                correlation_id,
                                EventKind::RetryAttempted {
                                    attempt: retries_used,
                                    error_kind: err.kind.to_string(),
                                    backoff_ms: 0,
                                },
                            );

                            check_cancelled(&cancel, correlation_id)?;
                            let backoff = calculate_retry_backoff(retries_used - 1, self.config.retry.backoff_base_ms, &mut rng);
                            tokio::time::sleep(backoff).await;
                            check_cancelled(&cancel, correlation_id)?;
                        }
                    }
                }
            }
        };

        let settled = settled?;
        let final_proxy_kind: Option<ProxyKind> = session.proxy.as_ref().map(|p| p.kind);

        let mut result = match settled {
            Settled::Phase(SessionPhase::NotFound) => SearchResult::not_found(query.language),
            Settled::Phase(SessionPhase::Results(records)) => {
                let records = if query.fuzzy {
                    fuzzy::rank(query, records).into_iter().map(|(record, _)| record).collect()
                } else {
                    records
                };
                SearchResult::found(records, query.language)
            }
            // The fallback already produced a complete result; only the
            // shared run-level metadata below still needs filling in.
            Settled::Rescued(rescued) => rescued,
        };
        result.metadata.processing_duration_ms = start.elapsed().as_millis() as u64;
        result.metadata.retries = retries_used;
        result.metadata.final_proxy_kind = final_proxy_kind;
        result.metadata.threat_transitions = threat_transitions;
        Ok(result)
    }

    /// Schedules up to `max_concurrent` orchestrator runs (spec §4.H "Bulk
    /// mode"). Output preserves input order; a per-item failure occupies its
    /// own slot instead of aborting the batch, unless `stop_on_error` is set,
    /// in which case any slot not yet started once a failure lands surfaces
    /// `cancelled` rather than running at all.
    pub async fn search_bulk(
        &self,
        queries: Vec<SearchQuery>,
        max_concurrent: usize,
        stop_on_error: bool,
    ) -> Vec<Result<SearchResult, SearchError>> {
        let max_concurrent = max_concurrent.clamp(1, 5);
        let truncated = queries.len() > MAX_BULK_SEARCHES;
        let queries: Vec<SearchQuery> = queries.into_iter().take(MAX_BULK_SEARCHES).collect();

        let stop_flag = Arc::new(AtomicBool::new(false));
        let indexed: Vec<(usize, SearchQuery)> = queries.into_iter().enumerate().collect();

        let mut results: Vec<(usize, Result<SearchResult, SearchError>)> = stream::iter(indexed)
            .map(|(idx, query)| {
                let stop_flag = stop_flag.clone();
                async move {
                    if stop_on_error && stop_flag.load(AtomicOrdering::Acquire) {
                        return (idx, Err(SearchError::cancelled("skipped after a prior bulk-search failure")));
                    }
                    let outcome = self.search(query).await;
                    if stop_on_error && outcome.is_err() {
                        stop_flag.store(true, AtomicOrdering::Release);
                    }
                    (idx, outcome)
                }
            })
            .buffer_unordered(max_concurrent)
            .collect()
            .await;

        results.sort_by_key(|(idx, _)| *idx);
        let mut out: Vec<Result<SearchResult, SearchError>> = results.into_iter().map(|(_, r)| r).collect();
        if truncated {
            out.push(Err(SearchError::validation(format!(
                "bulk_search accepts at most {MAX_BULK_SEARCHES} searches; remainder dropped"
            ))));
        }
        out
    }
}

fn cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("detainee-locator-core")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::query::Language;
    use chrono::NaiveDate;

    fn name_query() -> SearchQuery {
        let mut q = SearchQuery::by_name("Jane", "Doe", None, NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(), "Mexico");
        q.language = Language::En;
        q
    }

    #[test]
    fn classification_for_error_covers_block_signals() {
        assert!(matches!(classification_for_error(ErrorKind::Blocked), Some(ResponseClassification::Blocked { .. })));
        assert!(matches!(classification_for_error(ErrorKind::CaptchaRequired), Some(ResponseClassification::Captcha)));
        assert!(classification_for_error(ErrorKind::Validation).is_none());
        assert!(classification_for_error(ErrorKind::Cancelled).is_none());
    }

    #[tokio::test]
    async fn validation_failure_surfaces_before_any_network_activity() {
        let orchestrator = Orchestrator::new(Config {
            proxy: crate::config::ProxyConfig { enabled: false, ..Default::default() },
            ..Default::default()
        });
        let mut q = name_query();
        if let crate::model::query::SearchKind::ByName(n) = &mut q.kind {
            n.first_name = "   ".to_string();
        }
        let err = orchestrator.search(q).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn bulk_search_preserves_order_and_reports_per_item_errors() {
        let orchestrator = Orchestrator::new(Config {
            proxy: crate::config::ProxyConfig { enabled: false, ..Default::default() },
            cache: crate::config::CacheConfig { enabled: false, ..Default::default() },
            ..Default::default()
        });
        let good = name_query();
        let mut bad = name_query();
        if let crate::model::query::SearchKind::ByName(n) = &mut bad.kind {
            n.last_name = "   ".to_string();
        }
        let queries = vec![bad.clone(), bad];
        let results = orchestrator.search_bulk(queries, 2, false).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| matches!(r, Err(e) if e.kind == ErrorKind::Validation)));
        let _ = good;
    }

    #[tokio::test]
    async fn bulk_search_clamps_max_concurrent_into_range() {
        let orchestrator = Orchestrator::new(Config::default());
        let mut bad = name_query();
        if let crate::model::query::SearchKind::ByName(n) = &mut bad.kind {
            n.first_name = "".to_string();
        }
        let results = orchestrator.search_bulk(vec![bad], 99, false).await;
        assert_eq!(results.len(), 1);
    }
}
