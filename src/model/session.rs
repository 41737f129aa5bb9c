//! `SessionState` (spec §3, §4.F): owned by the session pipeline, one per
//! active search attempt. Cookies and CSRF tokens never cross sessions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use super::behavior::BehaviorProfile;
use super::proxy::ProxyHandle;
use super::query::Language;

/// Coordinator threat level (spec §4.E), tracked per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    Green,
    Yellow,
    Orange,
    Red,
}

impl Default for ThreatLevel {
    fn default() -> Self {
        ThreatLevel::Green
    }
}

impl ThreatLevel {
    pub fn step_up(self) -> Self {
        match self {
            ThreatLevel::Green => ThreatLevel::Yellow,
            ThreatLevel::Yellow => ThreatLevel::Orange,
            ThreatLevel::Orange | ThreatLevel::Red => ThreatLevel::Red,
        }
    }

    pub fn step_down(self) -> Self {
        match self {
            ThreatLevel::Red => ThreatLevel::Orange,
            ThreatLevel::Orange => ThreatLevel::Yellow,
            ThreatLevel::Yellow | ThreatLevel::Green => ThreatLevel::Green,
        }
    }
}

/// CSRF/event-validation token extracted from a fetched form (spec §4.F).
#[derive(Debug, Clone)]
pub struct CsrfToken {
    pub field_name: String,
    pub value: String,
    pub issued_at: Instant,
    pub assumed_ttl: Duration,
}

impl CsrfToken {
    pub fn new(field_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            value: value.into(),
            issued_at: Instant::now(),
            // Upstream never advertises a real TTL; ten minutes is a
            // conservative assumption that the submit-time expiry detection
            // (spec §4.F "Expired CSRF detected on submit") backs up with
            // the server's own authoritative signal.
            assumed_ttl: Duration::from_secs(600),
        }
    }

    pub fn is_stale(&self) -> bool {
        self.issued_at.elapsed() > self.assumed_ttl
    }
}

/// Deterministic classification of an upstream HTTP response (spec §4.F
/// "Response classification"). Feeds both the session state machine and
/// the coordinator's `observe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClassification {
    Results,
    NotFound,
    Captcha,
    Blocked { status: u16 },
    RateLimited { status: u16 },
    ClientError { status: u16 },
    ServerError { status: u16 },
}

impl ResponseClassification {
    /// Spec §4.E: "Any 4xx (except 404) ⇒ yellow" — 403/429 escalate
    /// further via their own dedicated rules, so this only covers the
    /// generic case.
    pub fn is_generic_client_error(self) -> bool {
        matches!(self, ResponseClassification::ClientError { .. })
    }

    pub fn is_block_signal(self) -> bool {
        matches!(self, ResponseClassification::Blocked { .. } | ResponseClassification::Captcha)
    }
}

/// Snapshot of the anti-detection policy in effect for the session's next
/// request (spec §3 "current anti-detection policy snapshot"), produced by
/// [`crate::coordinator::AntiDetectionCoordinator::prepare`].
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    /// Ordered pairs, not a map: header *order* is itself part of the
    /// obfuscation (spec §2.B "header-order permutation"), so insertion
    /// order must survive all the way to the HTTP client call.
    pub headers: Vec<(String, String)>,
    pub pre_delay: Duration,
    pub force_proxy: bool,
    pub forced_proxy_kind: Option<super::proxy::ProxyKind>,
    pub timing_profile: super::behavior::TimingProfile,
}

/// One request's purpose, used to parameterize obfuscation/timing/admission
/// decisions (spec §4.B–§4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    FormFetch,
    FormSubmit,
    Navigation,
    Retry,
}

/// Per-search session state (spec §3 `SessionState`). Created at orchestrator
/// entry, mutated only by the session pipeline, released on orchestrator
/// exit including failure paths.
pub struct SessionState {
    pub session_id: Uuid,
    pub correlation_id: Uuid,
    pub language: Language,
    pub cookie_jar: Arc<reqwest::cookie::Jar>,
    pub csrf: Option<CsrfToken>,
    pub proxy: Option<ProxyHandle>,
    /// Chosen once, on the first `prepare` call, and reused for the rest of
    /// the session (spec §8 "the User-Agent sent on any two requests within
    /// a session is identical").
    pub user_agent: Option<String>,
    pub policy_snapshot: Option<PolicySnapshot>,
    pub request_count: u32,
    pub started_at: Instant,
    pub last_classification: Option<ResponseClassification>,
    pub behavior: BehaviorProfile,
    pub threat_level: ThreatLevel,
    pub consecutive_green: u32,
    pub consecutive_orange: u32,
}

impl SessionState {
    pub fn new(correlation_id: Uuid, language: Language) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            correlation_id,
            language,
            cookie_jar: Arc::new(reqwest::cookie::Jar::default()),
            csrf: None,
            proxy: None,
            user_agent: None,
            policy_snapshot: None,
            request_count: 0,
            started_at: Instant::now(),
            last_classification: None,
            behavior: BehaviorProfile::default(),
            threat_level: ThreatLevel::default(),
            consecutive_green: 0,
            consecutive_orange: 0,
        }
    }

    pub fn record_request(&mut self) {
        self.request_count += 1;
        self.behavior.consecutive_requests += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threat_level_steps_saturate_at_bounds() {
        assert_eq!(ThreatLevel::Green.step_down(), ThreatLevel::Green);
        assert_eq!(ThreatLevel::Red.step_up(), ThreatLevel::Red);
        assert_eq!(ThreatLevel::Green.step_up(), ThreatLevel::Yellow);
        assert_eq!(ThreatLevel::Yellow.step_up(), ThreatLevel::Orange);
        assert_eq!(ThreatLevel::Orange.step_up(), ThreatLevel::Red);
    }

    #[test]
    fn threat_level_ordering_supports_comparisons() {
        assert!(ThreatLevel::Red > ThreatLevel::Green);
        assert!(ThreatLevel::Orange > ThreatLevel::Yellow);
    }

    #[test]
    fn csrf_token_is_stale_after_assumed_ttl() {
        let mut token = CsrfToken::new("csrf", "abc");
        token.assumed_ttl = Duration::from_millis(0);
        std::thread::sleep(Duration::from_millis(5));
        assert!(token.is_stale());
    }
}
