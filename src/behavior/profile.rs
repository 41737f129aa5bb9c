//! [`BehaviorProfile`] construction (spec §3: "initialized on first use").

use crate::model::behavior::{BehaviorProfile, TimingProfile};

/// Builds a session's behavior profile from its configured timing family.
/// Typing cadence and attention span are fixed starting points; only
/// `fatigue_coefficient` and `consecutive_requests` evolve afterward, and
/// only upward (spec §3 "fatigue coefficient monotonically nondecreasing").
pub fn new_profile(timing_profile: TimingProfile) -> BehaviorProfile {
    BehaviorProfile::new(timing_profile)
}
