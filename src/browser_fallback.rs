//! Browser-automation fallback seam (spec §9 design note: CAPTCHA/hard-block
//! recovery via a real browser is out of this crate's scope, but the
//! orchestrator needs a stable point to hand a stuck search off to one).
//! Grounded on the teacher's `HealthCheckClient` trait
//! (`proxy_health/client.rs`): a one-method `async_trait` abstraction with a
//! default implementation the crate ships and a real implementation left for
//! the embedder to provide, gated the same way here rather than behind a
//! Cargo feature — there is no in-tree "production" browser driver to gate.

use async_trait::async_trait;

use crate::error::SearchError;
use crate::model::query::SearchQuery;
use crate::model::result::SearchResult;
use crate::model::session::SessionState;

/// A rescue strategy for a search the session pipeline could not complete on
/// its own (spec §4.F terminal `Blocked`/`Captcha` classifications). Given
/// the session state at the point of failure and the original query, it
/// either produces a `SearchResult` some other way or fails with its own
/// `SearchError`.
///
/// Implementations are expected to be slow relative to the rest of this
/// crate (spinning up or reusing a real browser) and are never on the hot
/// path of a normal search; the orchestrator only reaches for one after its
/// own retry budget is exhausted.
#[async_trait]
pub trait BrowserFallback: Send + Sync {
    async fn run(&self, session: &SessionState, query: &SearchQuery) -> Result<SearchResult, SearchError>;
}

/// Default fallback: no browser automation is configured. Every call fails
/// with `SearchError::Internal`, naming the capability as missing rather
/// than misclassifying it as a retryable or upstream condition.
pub struct UnavailableBrowserFallback;

#[async_trait]
impl BrowserFallback for UnavailableBrowserFallback {
    async fn run(&self, _session: &SessionState, _query: &SearchQuery) -> Result<SearchResult, SearchError> {
        Err(SearchError::internal(
            "browser automation fallback is not configured for this embedding",
        ))
    }
}
