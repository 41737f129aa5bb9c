//! Quarantine/backoff bookkeeping (spec §3, §8): a proxy with
//! `consecutive_failures >= 3` is withheld from `acquire` until its backoff
//! window elapses. Backoff starts at 60s, doubles per renewed quarantine, and
//! is capped at 30 minutes (spec §4.A).

use std::time::{Duration, Instant};

const INITIAL_BACKOFF: Duration = Duration::from_secs(60);
const MAX_BACKOFF: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
pub struct QuarantineState {
    pub current_backoff: Duration,
    pub quarantined_until: Option<Instant>,
}

impl Default for QuarantineState {
    fn default() -> Self {
        Self {
            current_backoff: INITIAL_BACKOFF,
            quarantined_until: None,
        }
    }
}

impl QuarantineState {
    /// Invoked once a handle crosses the `consecutive_failures >= 3`
    /// threshold. Each successive call doubles the backoff window, capped at
    /// [`MAX_BACKOFF`].
    pub fn enter(&mut self, now: Instant) {
        self.quarantined_until = Some(now + self.current_backoff);
        self.current_backoff = (self.current_backoff * 2).min(MAX_BACKOFF);
    }

    pub fn is_quarantined_at(&self, now: Instant) -> bool {
        matches!(self.quarantined_until, Some(until) if now < until)
    }

    /// A clean success resets the backoff ladder back to the initial window;
    /// a proxy that recovers and stays healthy shouldn't carry a multi-minute
    /// penalty from a transient blip.
    pub fn reset(&mut self) {
        self.current_backoff = INITIAL_BACKOFF;
        self.quarantined_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarantine_window_doubles_and_caps() {
        let mut q = QuarantineState::default();
        let t0 = Instant::now();
        q.enter(t0);
        assert_eq!(q.current_backoff, Duration::from_secs(120));
        q.enter(t0);
        assert_eq!(q.current_backoff, Duration::from_secs(240));

        for _ in 0..20 {
            q.enter(t0);
        }
        assert_eq!(q.current_backoff, MAX_BACKOFF);
    }

    #[test]
    fn is_quarantined_only_until_window_elapses() {
        let mut q = QuarantineState::default();
        let t0 = Instant::now();
        q.enter(t0);
        assert!(q.is_quarantined_at(t0));
        assert!(q.is_quarantined_at(t0 + Duration::from_secs(59)));
        assert!(!q.is_quarantined_at(t0 + Duration::from_secs(61)));
    }

    #[test]
    fn reset_clears_quarantine_and_backoff() {
        let mut q = QuarantineState::default();
        let t0 = Instant::now();
        q.enter(t0);
        q.enter(t0);
        q.reset();
        assert_eq!(q.current_backoff, INITIAL_BACKOFF);
        assert!(!q.is_quarantined_at(t0));
    }
}
