//! `ProxyHandle` (spec §3): owned by the proxy pool, borrowed by sessions.

use std::time::Instant;

use uuid::Uuid;

/// Proxy network kind (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyKind {
    Residential,
    Datacenter,
    Socks5,
}

/// A proxy endpoint descriptor with rolling health statistics (spec §3).
///
/// Owned exclusively by [`crate::proxy_pool::ProxyPoolManager`]; a
/// `ProxyHandle` value returned from `acquire` is a snapshot the caller holds
/// for the lifetime of one attempt and must hand back via `release`. The
/// quarantine invariant (`consecutive_failures >= 3 => quarantined`) is
/// enforced by the pool, not by this type — this struct is pure data.
#[derive(Debug, Clone)]
pub struct ProxyHandle {
    pub id: Uuid,
    pub endpoint: ProxyEndpoint,
    pub kind: ProxyKind,
    pub region: String,
    pub reputation: f64,
    pub success_rate: f64,
    pub average_latency_ms: f64,
    pub consecutive_failures: u32,
    pub last_used_at: Option<Instant>,
    pub requests_since_rotation: u32,
    pub quarantined: bool,
}

/// Scheme + host + port + optional credentials for a proxy endpoint.
#[derive(Debug, Clone)]
pub struct ProxyEndpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub credentials: Option<ProxyCredentials>,
}

#[derive(Debug, Clone)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

impl ProxyEndpoint {
    /// A `scheme://[user:pass@]host:port` URL suitable for handing to an
    /// HTTP client's proxy configuration.
    pub fn to_url(&self) -> String {
        match &self.credentials {
            Some(creds) => format!(
                "{}://{}:{}@{}:{}",
                self.scheme, creds.username, creds.password, self.host, self.port
            ),
            None => format!("{}://{}:{}", self.scheme, self.host, self.port),
        }
    }
}

impl ProxyHandle {
    pub fn new(endpoint: ProxyEndpoint, kind: ProxyKind, region: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint,
            kind,
            region: region.into(),
            reputation: 0.5,
            success_rate: 1.0,
            average_latency_ms: 0.0,
            consecutive_failures: 0,
            last_used_at: None,
            requests_since_rotation: 0,
            quarantined: false,
        }
    }

    /// Quarantine invariant from spec §3: `consecutive_failures >= 3 =>
    /// quarantined`. This doesn't itself set `quarantined` — the pool's
    /// scoring/release path does — it's exposed so tests and the pool can
    /// assert the invariant holds.
    pub fn should_be_quarantined(&self) -> bool {
        self.consecutive_failures >= 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> ProxyEndpoint {
        ProxyEndpoint {
            scheme: "http".to_string(),
            host: "proxy.example".to_string(),
            port: 8080,
            credentials: None,
        }
    }

    #[test]
    fn quarantine_invariant_trips_at_three_consecutive_failures() {
        let mut h = ProxyHandle::new(endpoint(), ProxyKind::Datacenter, "us-east");
        assert!(!h.should_be_quarantined());
        h.consecutive_failures = 2;
        assert!(!h.should_be_quarantined());
        h.consecutive_failures = 3;
        assert!(h.should_be_quarantined());
    }

    #[test]
    fn endpoint_url_includes_credentials_when_present() {
        let mut e = endpoint();
        e.credentials = Some(ProxyCredentials {
            username: "u".to_string(),
            password: "p".to_string(),
        });
        assert_eq!(e.to_url(), "http://u:p@proxy.example:8080");
    }
}
