//! `AntiDetectionCoordinator` (spec §2.E, §4.E): composes the proxy pool,
//! obfuscator, behavior simulator, and traffic distributor into
//! `prepare`/`observe`.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::Mutex;

use super::threat::next_threat_level;
use crate::behavior::delay_for;
use crate::config::Config;
use crate::error::SearchError;
use crate::model::behavior::TimingProfile;
use crate::model::proxy::ProxyKind;
use crate::model::session::{PolicySnapshot, RequestKind, ResponseClassification, SessionState, ThreatLevel};
use crate::obfuscator::{build_headers, pick_user_agent, HeaderProfile};
use crate::proxy_pool::ProxyPoolManager;
use crate::traffic::{Priority, TrafficDistributor};

/// Delay variance multiplier applied at `yellow` (spec §4.E).
const YELLOW_VARIANCE_MULTIPLIER: f64 = 1.5;

pub struct AntiDetectionCoordinator {
    proxy_pool: ProxyPoolManager,
    traffic: TrafficDistributor,
    user_agents: Vec<String>,
    proxy_enabled: bool,
    rng: Mutex<SmallRng>,
}

impl AntiDetectionCoordinator {
    pub fn new(config: &Config) -> Self {
        Self {
            proxy_pool: ProxyPoolManager::new(&config.proxy.providers),
            traffic: TrafficDistributor::new(
                config.rate.pattern,
                config.rate.requests_per_minute,
                config.rate.burst_allowance,
            ),
            user_agents: config.http.user_agents.clone(),
            proxy_enabled: config.proxy.enabled,
            rng: Mutex::new(SmallRng::from_entropy()),
        }
    }

    pub fn proxy_pool(&self) -> &ProxyPoolManager {
        &self.proxy_pool
    }

    /// Composes a proxy, header set, and pre-request delay for the next
    /// outbound call on `session` (spec §4.E contract).
    pub async fn prepare(
        &self,
        session: &mut SessionState,
        kind: RequestKind,
    ) -> Result<PolicySnapshot, SearchError> {
        let priority = match session.threat_level {
            ThreatLevel::Red => Priority::Low,
            ThreatLevel::Orange | ThreatLevel::Yellow => Priority::Normal,
            ThreatLevel::Green => Priority::High,
        };
        self.traffic.await_admission(priority).await;

        let forced_proxy_kind =
            matches!(session.threat_level, ThreatLevel::Orange | ThreatLevel::Red).then_some(ProxyKind::Residential);
        self.ensure_proxy(session, forced_proxy_kind).await?;

        if session.user_agent.is_none() {
            let mut rng = self.rng.lock().await;
            session.user_agent = Some(pick_user_agent(&self.user_agents, &mut *rng));
        }
        let user_agent = session.user_agent.clone().unwrap_or_default();

        let timing_profile = match session.threat_level {
            ThreatLevel::Orange | ThreatLevel::Red => TimingProfile::Slow,
            _ => session.behavior.profile,
        };

        let headers = {
            let mut rng = self.rng.lock().await;
            let header_profile = HeaderProfile::new(user_agent, session.language);
            build_headers(&header_profile, &mut *rng)
        };

        let mut pre_delay = {
            let mut rng = self.rng.lock().await;
            delay_for(&session.behavior, kind, session.last_classification, &mut *rng)
        };
        if session.threat_level == ThreatLevel::Yellow {
            pre_delay = pre_delay.mul_f64(YELLOW_VARIANCE_MULTIPLIER);
        }

        let snapshot = PolicySnapshot {
            headers,
            pre_delay,
            force_proxy: session.threat_level != ThreatLevel::Green,
            forced_proxy_kind,
            timing_profile,
        };
        session.policy_snapshot = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Applies a response classification to the session's threat state
    /// (spec §4.E: "the only entry point that mutates the coordinator's
    /// per-session state").
    pub async fn observe(&self, session: &mut SessionState, classification: ResponseClassification) {
        let transition = next_threat_level(
            session.threat_level,
            session.consecutive_green,
            session.consecutive_orange,
            classification,
        );
        session.threat_level = transition.level;
        session.consecutive_green = transition.consecutive_green;
        session.consecutive_orange = transition.consecutive_orange;
        session.last_classification = Some(classification);

        self.traffic.observe_outcome(classification.is_block_signal()).await;

        if let Some(proxy) = &session.proxy {
            if classification.is_block_signal() {
                self.proxy_pool.report_block(proxy).await;
            }
        }
    }

    /// Requests a fresh proxy from the pool, used by the orchestrator after
    /// a `no_proxy_available` error (spec §4.H "no healthy proxy... retried
    /// once after requesting a pool refresh").
    pub async fn refresh_proxies(&self, config: &Config) {
        self.proxy_pool.refresh(&config.proxy.providers).await;
    }

    async fn ensure_proxy(&self, session: &mut SessionState, kind_preference: Option<ProxyKind>) -> Result<(), SearchError> {
        let wants_proxy = self.proxy_enabled && session.threat_level != ThreatLevel::Green;

        if !self.proxy_enabled && !wants_proxy {
            return Ok(());
        }
        if !wants_proxy && session.proxy.is_none() {
            return Ok(());
        }

        let needs_new = match &session.proxy {
            None => true,
            Some(handle) => kind_preference.is_some_and(|kind| handle.kind != kind),
        };
        if !needs_new {
            return Ok(());
        }

        let mut rng = self.rng.lock().await;
        let handle = self.proxy_pool.acquire(&mut rng, kind_preference).await?;
        session.proxy = Some(handle);
        Ok(())
    }
}
