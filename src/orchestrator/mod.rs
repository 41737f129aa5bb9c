//! Search Orchestrator (spec §2.H, §4.H, ~15% share): validates input,
//! checks cache, drives the session pipeline through retries and fallbacks,
//! ranks on success, assembles metadata.

mod cache;
mod orchestrator;
mod retry;

pub use cache::{fingerprint, ResultCache};
pub use orchestrator::Orchestrator;
pub use retry::{calculate_retry_backoff, classify_attempt_error, AttemptOutcome};
