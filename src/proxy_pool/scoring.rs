//! Composite health score (spec §4.A): `0.5·success_rate + 0.2·reputation +
//! 0.2·(1 - normalized_latency) + 0.1·recency_bonus`, plus a flat `+0.1`
//! bonus for residential handles and a flat `-0.1` penalty for handles used
//! within the last `RECENT_USE_WINDOW_SECS` (load-spreading).

use std::time::Instant;

use crate::model::proxy::{ProxyHandle, ProxyKind};

/// Proxies idle longer than this get the full recency bonus; this spreads
/// load across the pool instead of hammering whichever handle scored highest
/// a moment ago.
const RECENCY_WINDOW_SECS: f64 = 60.0;
/// Handles used more recently than this eat the flat recent-use penalty,
/// independent of `recency_bonus`'s gradual falloff.
const RECENT_USE_WINDOW_SECS: f64 = 5.0;
const RESIDENTIAL_BONUS: f64 = 0.1;
const RECENT_USE_PENALTY: f64 = 0.1;

fn normalized_latency(handle: &ProxyHandle, max_latency_ms: f64) -> f64 {
    if max_latency_ms <= 0.0 {
        return 0.0;
    }
    (handle.average_latency_ms / max_latency_ms).clamp(0.0, 1.0)
}

fn recency_bonus(handle: &ProxyHandle, now: Instant) -> f64 {
    match handle.last_used_at {
        None => 1.0,
        Some(last) => {
            let idle_secs = now.saturating_duration_since(last).as_secs_f64();
            (idle_secs / RECENCY_WINDOW_SECS).clamp(0.0, 1.0)
        }
    }
}

fn recent_use_penalty(handle: &ProxyHandle, now: Instant) -> f64 {
    match handle.last_used_at {
        Some(last) if now.saturating_duration_since(last).as_secs_f64() < RECENT_USE_WINDOW_SECS => RECENT_USE_PENALTY,
        _ => 0.0,
    }
}

/// `max_latency_ms` should be the highest `average_latency_ms` observed
/// across the pool's non-quarantined handles, so latency is scored relative
/// to the pool's own distribution rather than an arbitrary absolute scale.
pub fn composite_score(handle: &ProxyHandle, max_latency_ms: f64, now: Instant) -> f64 {
    let base = 0.5 * handle.success_rate.clamp(0.0, 1.0)
        + 0.2 * handle.reputation.clamp(0.0, 1.0)
        + 0.2 * (1.0 - normalized_latency(handle, max_latency_ms))
        + 0.1 * recency_bonus(handle, now);
    let residential_bonus = if handle.kind == ProxyKind::Residential { RESIDENTIAL_BONUS } else { 0.0 };
    (base + residential_bonus - recent_use_penalty(handle, now)).max(0.0)
}
