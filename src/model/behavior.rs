//! `BehaviorProfile` (spec §3, §4.C): per-session timing distribution choice
//! and its adjustment state. Pure data; sampling logic lives in
//! [`crate::behavior`].

/// Named timing distribution families (spec §4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    Fast,
    Normal,
    Slow,
}

impl Default for TimingProfile {
    fn default() -> Self {
        TimingProfile::Normal
    }
}

impl TimingProfile {
    /// `(base_seconds, variance_seconds)` per spec §4.C.
    pub fn base_and_variance(self) -> (f64, f64) {
        match self {
            TimingProfile::Fast => (1.0, 0.5),
            TimingProfile::Normal => (2.0, 1.0),
            TimingProfile::Slow => (4.0, 2.0),
        }
    }
}

/// Per-session behavioral state (spec §3 `BehaviorProfile`). The fatigue
/// coefficient is monotonically nondecreasing within a session, per the
/// spec's lifecycle note.
#[derive(Debug, Clone)]
pub struct BehaviorProfile {
    pub profile: TimingProfile,
    pub typing_cadence_chars_per_sec: f64,
    pub fatigue_coefficient: f64,
    pub attention_span: u32,
    pub consecutive_requests: u32,
}

impl BehaviorProfile {
    pub fn new(profile: TimingProfile) -> Self {
        Self {
            profile,
            typing_cadence_chars_per_sec: 4.5,
            fatigue_coefficient: 1.0,
            attention_span: 7,
            consecutive_requests: 0,
        }
    }
}

impl Default for BehaviorProfile {
    fn default() -> Self {
        Self::new(TimingProfile::default())
    }
}
