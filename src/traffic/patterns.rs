//! Pattern-specific refill rate computation (spec §4.D). Each pattern is a
//! pure function of elapsed time and recent outcomes; [`bucket::Inner`]
//! owns the mutable token count and calls these to learn the current rate.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::config::RatePattern;

const ADAPTIVE_BLOCK_THRESHOLD: f64 = 0.2;
const ADAPTIVE_STEP: f64 = 0.1;
const RAMP_WINDOW: Duration = Duration::from_secs(300);
const RANDOM_WINDOW: Duration = Duration::from_secs(30);
const OUTCOME_WINDOW: usize = 50;
/// Silence window length as a multiple of the burst window (spec "silence
/// proportional to burst size").
const BURST_SILENCE_FACTOR: f64 = 3.0;

/// Mutable state a pattern needs beyond "now" — ramps and the random
/// pattern remember when their current window started; adaptive remembers
/// recent block/success outcomes; burst remembers which phase of its
/// burst/silence duty cycle it's in.
pub struct PatternState {
    pattern: RatePattern,
    base_rate: f64,
    max_rate: f64,
    started_at: Instant,
    random_window_start: Instant,
    current_random_rate: f64,
    adaptive_rate: f64,
    recent_blocked: VecDeque<bool>,
    burst_allowance: f64,
    burst_phase_start: Instant,
    burst_in_silence: bool,
}

impl PatternState {
    pub fn new(pattern: RatePattern, base_rate: f64, burst_allowance: f64) -> Self {
        let now = Instant::now();
        Self {
            pattern,
            base_rate,
            max_rate: base_rate * 3.0,
            started_at: now,
            random_window_start: now,
            current_random_rate: base_rate,
            adaptive_rate: base_rate,
            recent_blocked: VecDeque::with_capacity(OUTCOME_WINDOW),
            burst_allowance: burst_allowance.max(1.0),
            burst_phase_start: now,
            burst_in_silence: false,
        }
    }

    /// Current target requests-per-second, reevaluated on every call.
    pub fn current_rate(&mut self, now: Instant, rng: &mut impl Rng) -> f64 {
        match self.pattern {
            RatePattern::Steady => self.base_rate,
            RatePattern::Burst => self.burst_rate(now),
            RatePattern::Ramp => {
                let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
                let progress = (elapsed / RAMP_WINDOW.as_secs_f64()).clamp(0.0, 1.0);
                self.base_rate + (self.max_rate - self.base_rate) * progress
            }
            RatePattern::Random => {
                if now.saturating_duration_since(self.random_window_start) >= RANDOM_WINDOW {
                    self.random_window_start = now;
                    self.current_random_rate = rng.gen_range(self.base_rate * 0.5..=self.max_rate);
                }
                self.current_random_rate
            }
            RatePattern::Adaptive => self.adaptive_rate,
        }
    }

    /// Drives the burst/silence duty cycle: `max_rate` for a burst window
    /// sized to drain `burst_allowance` tokens, then zero for a silence
    /// window proportional to that same burst size, repeating (spec "bursts
    /// of k allowed, followed by silence proportional to burst size").
    fn burst_rate(&mut self, now: Instant) -> f64 {
        let burst_window = Duration::from_secs_f64((self.burst_allowance / self.base_rate.max(0.01)).max(1.0));
        let silence_window = burst_window.mul_f64(BURST_SILENCE_FACTOR);
        let phase_len = if self.burst_in_silence { silence_window } else { burst_window };

        if now.saturating_duration_since(self.burst_phase_start) >= phase_len {
            self.burst_phase_start = now;
            self.burst_in_silence = !self.burst_in_silence;
        }

        if self.burst_in_silence {
            0.0
        } else {
            self.max_rate
        }
    }

    /// Feeds an observed outcome to the adaptive pattern: rate steps down
    /// when the recent block rate exceeds threshold, up on sustained
    /// success (spec §4.D "adaptive").
    pub fn observe_outcome(&mut self, blocked: bool) {
        if self.recent_blocked.len() >= OUTCOME_WINDOW {
            self.recent_blocked.pop_front();
        }
        self.recent_blocked.push_back(blocked);

        if !matches!(self.pattern, RatePattern::Adaptive) {
            return;
        }

        let block_rate = self.recent_blocked.iter().filter(|b| **b).count() as f64
            / self.recent_blocked.len().max(1) as f64;

        if block_rate > ADAPTIVE_BLOCK_THRESHOLD {
            self.adaptive_rate = (self.adaptive_rate * (1.0 - ADAPTIVE_STEP)).max(self.base_rate * 0.1);
        } else if self.recent_blocked.len() == OUTCOME_WINDOW && !self.recent_blocked.iter().any(|b| *b) {
            self.adaptive_rate = (self.adaptive_rate * (1.0 + ADAPTIVE_STEP)).min(self.max_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn steady_rate_never_changes() {
        let mut state = PatternState::new(RatePattern::Steady, 10.0, 1.0);
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(state.current_rate(Instant::now(), &mut rng), 10.0);
    }

    #[test]
    fn adaptive_rate_decreases_on_high_block_rate() {
        let mut state = PatternState::new(RatePattern::Adaptive, 10.0, 1.0);
        for _ in 0..10 {
            state.observe_outcome(true);
        }
        assert!(state.adaptive_rate < 10.0);
    }

    #[test]
    fn adaptive_rate_recovers_after_sustained_success() {
        let mut state = PatternState::new(RatePattern::Adaptive, 10.0, 1.0);
        for _ in 0..10 {
            state.observe_outcome(true);
        }
        let degraded = state.adaptive_rate;
        for _ in 0..OUTCOME_WINDOW {
            state.observe_outcome(false);
        }
        assert!(state.adaptive_rate > degraded);
    }

    #[test]
    fn burst_rate_starts_high_then_falls_silent() {
        let mut state = PatternState::new(RatePattern::Burst, 10.0, 5.0);
        let mut rng = SmallRng::seed_from_u64(1);
        let start = Instant::now();
        assert_eq!(state.current_rate(start, &mut rng), state.max_rate);

        // burst_window = 5.0 / 10.0 = 0.5s; well past it the pattern must
        // have dropped into silence.
        let after_burst = start + Duration::from_millis(600);
        assert_eq!(state.current_rate(after_burst, &mut rng), 0.0);
    }

    #[test]
    fn burst_rate_differs_from_steady_for_the_same_base_rate() {
        let mut burst = PatternState::new(RatePattern::Burst, 10.0, 5.0);
        let mut steady = PatternState::new(RatePattern::Steady, 10.0, 5.0);
        let mut rng = SmallRng::seed_from_u64(1);
        let now = Instant::now() + Duration::from_millis(600);
        assert_ne!(burst.current_rate(now, &mut rng), steady.current_rate(now, &mut rng));
    }
}
