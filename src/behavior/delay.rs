//! `delay_for(session, request_kind) -> Duration` (spec §4.C), applying the
//! five adjustments in order: base sample, request-kind multiplier, fatigue,
//! error penalty, clamp.

use std::time::Duration;

use rand::Rng;

use crate::model::behavior::BehaviorProfile;
use crate::model::session::{RequestKind, ResponseClassification};

const MIN_DELAY: Duration = Duration::from_millis(100);
const MAX_DELAY: Duration = Duration::from_secs(30);
const FATIGUE_STEP: f64 = 0.10;
const FATIGUE_CAP: f64 = 3.0;

fn request_kind_multiplier(kind: RequestKind) -> f64 {
    match kind {
        RequestKind::FormFetch => 0.8,
        RequestKind::FormSubmit => 1.4,
        RequestKind::Navigation => 1.0,
        RequestKind::Retry => 1.8,
    }
}

/// Recomputes the fatigue coefficient for the *next* delay given the
/// session's current consecutive-request count. Every `attention_span`
/// requests adds another 10% cumulative slowdown, capped at 3x base.
pub fn fatigue_coefficient(behavior: &BehaviorProfile) -> f64 {
    if behavior.attention_span == 0 {
        return behavior.fatigue_coefficient;
    }
    let steps = behavior.consecutive_requests / behavior.attention_span;
    (1.0 + FATIGUE_STEP * steps as f64).min(FATIGUE_CAP)
}

/// Computes one inter-request delay. `last_classification` is the
/// classification of the *previous* request on this session, if any —
/// step 4 adds a 1.0-3.0s jitter when it was a failure.
pub fn delay_for(
    behavior: &BehaviorProfile,
    kind: RequestKind,
    last_classification: Option<ResponseClassification>,
    rng: &mut impl Rng,
) -> Duration {
    let (base, variance) = behavior.profile.base_and_variance();
    let sample = base + rng.gen_range(-variance..=variance);
    let mut seconds = sample.max(0.0) * request_kind_multiplier(kind);

    seconds *= fatigue_coefficient(behavior);

    if let Some(classification) = last_classification {
        if classification.is_block_signal() || classification.is_generic_client_error() {
            seconds += rng.gen_range(1.0..=3.0);
        }
    }

    let clamped = seconds.clamp(MIN_DELAY.as_secs_f64(), MAX_DELAY.as_secs_f64());
    Duration::from_secs_f64(clamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::behavior::TimingProfile;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn profile() -> BehaviorProfile {
        BehaviorProfile::new(TimingProfile::Normal)
    }

    #[test]
    fn delay_is_always_within_bounds() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..200 {
            let d = delay_for(&profile(), RequestKind::Retry, None, &mut rng);
            assert!(d >= MIN_DELAY && d <= MAX_DELAY);
        }
    }

    #[test]
    fn fatigue_increases_every_attention_span_requests() {
        let mut behavior = profile();
        assert_eq!(fatigue_coefficient(&behavior), 1.0);
        behavior.consecutive_requests = behavior.attention_span;
        assert!((fatigue_coefficient(&behavior) - 1.10).abs() < 1e-9);
        behavior.consecutive_requests = behavior.attention_span * 50;
        assert_eq!(fatigue_coefficient(&behavior), FATIGUE_CAP);
    }

    #[test]
    fn error_penalty_increases_delay_on_average() {
        let mut rng_a = SmallRng::seed_from_u64(99);
        let mut rng_b = SmallRng::seed_from_u64(99);
        let without = delay_for(&profile(), RequestKind::Navigation, None, &mut rng_a);
        let with = delay_for(
            &profile(),
            RequestKind::Navigation,
            Some(ResponseClassification::Blocked { status: 403 }),
            &mut rng_b,
        );
        assert!(with >= without);
    }
}
