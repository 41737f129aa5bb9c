//! Global admission gate (spec §4.D). A lazily-refilled token bucket whose
//! rate is computed by [`super::patterns::PatternState`], gated by a
//! priority-aware FIFO queue: higher priority jumps shorter queues, but a
//! waiter that gets skipped too many times is promoted to the front
//! regardless (spec "never starve lower priority beyond a configured
//! limit").

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use tokio::time::sleep;

use super::patterns::PatternState;
use crate::config::RatePattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// A waiter never actually blocked on is starved at most this many times
/// before being promoted ahead of higher-priority arrivals.
const MAX_SKIPS_BEFORE_PROMOTION: u32 = 8;

struct Ticket {
    seq: u64,
    priority: Priority,
    skips: u32,
}

struct Inner {
    tokens: f64,
    capacity: f64,
    last_refill: Instant,
    pattern: PatternState,
    rng: SmallRng,
    queue: VecDeque<Ticket>,
    next_seq: u64,
}

impl Inner {
    fn refill(&mut self, now: Instant) {
        let rate = self.pattern.current_rate(now, &mut self.rng);
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + rate * elapsed).min(self.capacity);
        self.last_refill = now;
    }

    /// True if `seq` is at the front of the effective queue: either the
    /// genuine highest-priority earliest arrival, or a waiter that has been
    /// skipped past its promotion limit.
    fn is_next(&self, seq: u64) -> bool {
        if let Some(promoted) = self.queue.iter().find(|t| t.skips >= MAX_SKIPS_BEFORE_PROMOTION) {
            return promoted.seq == seq;
        }
        self.queue
            .iter()
            .max_by(|a, b| a.priority.cmp(&b.priority).then(b.seq.cmp(&a.seq)))
            .map(|front| front.seq == seq)
            .unwrap_or(false)
    }

    fn record_skip_for_others(&mut self, seq: u64) {
        for t in self.queue.iter_mut().filter(|t| t.seq != seq) {
            t.skips += 1;
        }
    }
}

pub struct TrafficDistributor {
    inner: Mutex<Inner>,
}

impl TrafficDistributor {
    pub fn new(pattern: RatePattern, requests_per_minute: u32, burst_allowance: u32) -> Self {
        let base_rate = requests_per_minute as f64 / 60.0;
        Self {
            inner: Mutex::new(Inner {
                tokens: burst_allowance as f64,
                capacity: (burst_allowance.max(1)) as f64,
                last_refill: Instant::now(),
                pattern: PatternState::new(pattern, base_rate, burst_allowance as f64),
                rng: SmallRng::from_entropy(),
                queue: VecDeque::new(),
                next_seq: 0,
            }),
        }
    }

    /// Blocks cooperatively until a token is available for this caller.
    pub async fn await_admission(&self, priority: Priority) {
        let seq = {
            let mut inner = self.inner.lock().await;
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.queue.push_back(Ticket { seq, priority, skips: 0 });
            seq
        };

        loop {
            let wait = {
                let mut inner = self.inner.lock().await;
                let now = Instant::now();
                inner.refill(now);

                if inner.is_next(seq) && inner.tokens >= 1.0 {
                    inner.tokens -= 1.0;
                    inner.queue.retain(|t| t.seq != seq);
                    None
                } else {
                    if inner.tokens >= 1.0 {
                        inner.record_skip_for_others(seq);
                    }
                    Some(Duration::from_millis(50))
                }
            };

            match wait {
                None => return,
                Some(d) => sleep(d).await,
            }
        }
    }

    /// Feeds an observed response outcome into the adaptive pattern.
    pub async fn observe_outcome(&self, blocked: bool) {
        let mut inner = self.inner.lock().await;
        inner.pattern.observe_outcome(blocked);
    }
}
