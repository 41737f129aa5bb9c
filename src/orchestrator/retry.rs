//! Retry loop primitives (spec §4.H step 4, §9 supplemented "Explicit retry
//! outcomes"). Backoff shape is grounded on the `calculate_retry_backoff`
//! pattern in the citescrape crawl orchestrator: exponential, jittered,
//! capped.

use std::time::Duration;

use rand::Rng;

use crate::error::{ErrorKind, SearchError};

const MAX_BACKOFF_MS: u64 = 30_000;
const JITTER_FRACTION: f64 = 0.2;

/// Outcome of classifying a failed attempt in the orchestrator's retry loop
/// (spec §9 "Explicit retry outcomes" design note). A successful attempt
/// never passes through here — the loop only calls this on an `Err`.
pub enum AttemptOutcome {
    Transient(SearchError),
    Fatal(SearchError),
}

/// Whether the orchestrator's *attempt loop* should spend another try on
/// this error kind. Wider than [`SearchError::is_retryable`]: spec §4.H step
/// 4b has the loop itself escalate threat level and retry on `blocked`/
/// `captcha_required` classifications, even though those kinds are marked
/// non-retryable in the §7 error-kind table — that flag describes whether an
/// external caller should retry the *final* surfaced error, not whether this
/// loop retries internally.
fn is_orchestrator_retryable(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::RateLimited
            | ErrorKind::UpstreamTimeout
            | ErrorKind::ParseFailure
            | ErrorKind::NoProxyAvailable
            | ErrorKind::Blocked
            | ErrorKind::CaptchaRequired
    )
}

/// Classifies a pipeline error into an `AttemptOutcome`: orchestrator-level
/// retryable kinds become `Transient`, everything else (`validation`,
/// `cancelled`, `internal`) is `Fatal` and ends the loop immediately (spec
/// §7 "non-recoverable kinds surface immediately").
pub fn classify_attempt_error(err: SearchError) -> AttemptOutcome {
    if is_orchestrator_retryable(err.kind) {
        AttemptOutcome::Transient(err)
    } else {
        AttemptOutcome::Fatal(err)
    }
}

/// Exponential backoff with jitter, capped (spec §4.H "bounded retries...
/// exponential backoff with jitter"). `attempt` is 0-based: the delay before
/// the second attempt uses `attempt = 0`.
pub fn calculate_retry_backoff(attempt: u32, base_ms: u64, rng: &mut impl Rng) -> Duration {
    let exp_delay = base_ms.saturating_mul(1u64 << attempt.min(10));
    let jitter = rng.gen_range(-JITTER_FRACTION..=JITTER_FRACTION);
    let jittered = (exp_delay as f64 * (1.0 + jitter)).max(0.0) as u64;
    Duration::from_millis(jittered.min(MAX_BACKOFF_MS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn backoff_grows_exponentially_before_jitter_cap() {
        let mut rng = SmallRng::seed_from_u64(1);
        let first = calculate_retry_backoff(0, 500, &mut rng).as_millis();
        let second = calculate_retry_backoff(1, 500, &mut rng).as_millis();
        // Jitter is only ±20%, so attempt 1's jittered floor (1000ms * 0.8)
        // always exceeds attempt 0's jittered ceiling (500ms * 1.2).
        assert!(second > first);
    }

    #[test]
    fn backoff_never_exceeds_cap() {
        let mut rng = SmallRng::seed_from_u64(2);
        let delay = calculate_retry_backoff(20, 500, &mut rng);
        assert!(delay.as_millis() as u64 <= MAX_BACKOFF_MS);
    }

    #[test]
    fn non_retryable_kind_classifies_as_fatal() {
        let err = SearchError::validation("bad input");
        assert!(matches!(classify_attempt_error(err), AttemptOutcome::Fatal(_)));
    }

    #[test]
    fn retryable_kind_classifies_as_transient() {
        let err = SearchError::rate_limited("slow down");
        assert!(matches!(classify_attempt_error(err), AttemptOutcome::Transient(_)));
    }

    #[test]
    fn blocked_classifies_as_transient_for_the_orchestrator_loop() {
        let err = SearchError::blocked("403 from upstream");
        assert!(matches!(classify_attempt_error(err), AttemptOutcome::Transient(_)));
    }
}
