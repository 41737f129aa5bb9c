//! Pool-wide proxy rotation (spec §4.A). Holds every provisioned endpoint,
//! ranks the eligible ones by [`composite_score`], and weighted-samples the
//! handle for each `acquire` from the top-K so load spreads across the
//! healthiest handles instead of always returning the single best one.

use std::time::Instant;

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::Mutex;

use super::quarantine::QuarantineState;
use super::scoring::composite_score;
use crate::config::ProxyProviderConfig;
use crate::error::SearchError;
use crate::model::proxy::{ProxyEndpoint, ProxyHandle, ProxyKind};

/// How many of the top-scoring eligible handles participate in the weighted
/// draw (spec §9 "weighted random sampling over top-K", K fixed at 5).
const TOP_K: usize = 5;

struct PoolEntry {
    handle: ProxyHandle,
    quarantine: QuarantineState,
}

struct PoolInner {
    entries: Vec<PoolEntry>,
}

pub struct ProxyPoolManager {
    inner: Mutex<PoolInner>,
}

impl ProxyPoolManager {
    pub fn new(providers: &[ProxyProviderConfig]) -> Self {
        let entries = providers
            .iter()
            .map(|p| PoolEntry {
                handle: ProxyHandle::new(endpoint_from_provider(p), p.kind, p.region.clone()),
                quarantine: QuarantineState::default(),
            })
            .collect();
        Self {
            inner: Mutex::new(PoolInner { entries }),
        }
    }

    pub fn empty() -> Self {
        Self {
            inner: Mutex::new(PoolInner { entries: Vec::new() }),
        }
    }

    /// Replaces the provisioned endpoint set. Endpoints whose host/port
    /// persist across the refresh keep their rolling health stats; new
    /// endpoints start fresh; removed ones are dropped outright along with
    /// any handle a caller may still be holding (its next `release` becomes a
    /// no-op).
    pub async fn refresh(&self, providers: &[ProxyProviderConfig]) {
        let mut inner = self.inner.lock().await;
        let mut next = Vec::with_capacity(providers.len());
        for p in providers {
            let existing = inner.entries.iter().position(|e| {
                e.handle.endpoint.host == p.host && e.handle.endpoint.port == p.port
            });
            match existing {
                Some(idx) => next.push(inner.entries.remove(idx)),
                None => next.push(PoolEntry {
                    handle: ProxyHandle::new(endpoint_from_provider(p), p.kind, p.region.clone()),
                    quarantine: QuarantineState::default(),
                }),
            }
        }
        inner.entries = next;
    }

    /// Picks one non-quarantined handle via weighted sampling over the
    /// top-K scorers. When `kind_preference` is set, handles of that kind
    /// are preferred (spec §4.A `acquire(kind_preference)`); if none are
    /// eligible, falls back to the full eligible set rather than failing, so
    /// a forced-residential policy degrades to best-effort instead of
    /// blocking the search. Errs with `no_proxy_available` if the pool is
    /// empty or every handle is currently quarantined.
    pub async fn acquire(
        &self,
        rng: &mut SmallRng,
        kind_preference: Option<ProxyKind>,
    ) -> Result<ProxyHandle, SearchError> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();

        let max_latency = inner
            .entries
            .iter()
            .filter(|e| !e.quarantine.is_quarantined_at(now))
            .map(|e| e.handle.average_latency_ms)
            .fold(0.0_f64, f64::max);

        let eligible = |e: &&PoolEntry| !e.quarantine.is_quarantined_at(now);
        let mut scored: Vec<(usize, f64)> = if let Some(kind) = kind_preference {
            inner
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| eligible(&e) && e.handle.kind == kind)
                .map(|(idx, e)| (idx, composite_score(&e.handle, max_latency, now)))
                .collect()
        } else {
            Vec::new()
        };
        if scored.is_empty() {
            scored = inner
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| eligible(&e))
                .map(|(idx, e)| (idx, composite_score(&e.handle, max_latency, now)))
                .collect();
        }

        if scored.is_empty() {
            return Err(SearchError::no_proxy_available(
                "proxy pool empty or every handle is quarantined",
            ));
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(TOP_K);

        let weights: Vec<f64> = scored.iter().map(|(_, score)| score.max(1e-6)).collect();
        let dist = WeightedIndex::new(&weights)
            .map_err(|e| SearchError::internal(format!("weighted sampling failed: {e}")))?;
        let chosen = scored[dist.sample(rng)].0;

        let entry = &mut inner.entries[chosen];
        entry.handle.last_used_at = Some(now);
        entry.handle.requests_since_rotation += 1;
        Ok(entry.handle.clone())
    }

    /// Reports the outcome of one attempt made with a previously acquired
    /// handle, updating its rolling stats and, on a third consecutive
    /// failure, quarantining it (spec §3, §8).
    pub async fn release(&self, handle: &ProxyHandle, success: bool) {
        let mut inner = self.inner.lock().await;
        let Some(entry) = inner.entries.iter_mut().find(|e| e.handle.id == handle.id) else {
            return;
        };

        const EMA_ALPHA: f64 = 0.2;
        if success {
            entry.handle.success_rate = entry.handle.success_rate * (1.0 - EMA_ALPHA) + EMA_ALPHA;
            entry.handle.consecutive_failures = 0;
            entry.handle.quarantined = false;
            entry.quarantine.reset();
        } else {
            entry.handle.success_rate *= 1.0 - EMA_ALPHA;
            entry.handle.consecutive_failures += 1;
            if entry.handle.should_be_quarantined() {
                entry.handle.quarantined = true;
                entry.quarantine.enter(Instant::now());
            }
        }
    }

    /// A 403 block is a stronger signal than an ordinary transient failure:
    /// it quarantines the handle immediately rather than waiting for the
    /// third consecutive failure (spec §7 "Observable side effects on
    /// failure... threat level advanced").
    pub async fn report_block(&self, handle: &ProxyHandle) {
        let mut inner = self.inner.lock().await;
        let Some(entry) = inner.entries.iter_mut().find(|e| e.handle.id == handle.id) else {
            return;
        };
        entry.handle.consecutive_failures = entry.handle.consecutive_failures.max(3);
        entry.handle.success_rate *= 0.5;
        entry.handle.quarantined = true;
        entry.quarantine.enter(Instant::now());
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}

fn endpoint_from_provider(p: &ProxyProviderConfig) -> ProxyEndpoint {
    ProxyEndpoint {
        scheme: p.scheme.clone(),
        host: p.host.clone(),
        port: p.port,
        credentials: match (&p.username, &p.password) {
            (Some(u), Some(pw)) => Some(crate::model::proxy::ProxyCredentials {
                username: u.clone(),
                password: pw.clone(),
            }),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(host: &str, region: &str) -> ProxyProviderConfig {
        provider_with_kind(host, region, ProxyKind::Datacenter)
    }

    fn provider_with_kind(host: &str, region: &str, kind: ProxyKind) -> ProxyProviderConfig {
        ProxyProviderConfig {
            host: host.to_string(),
            port: 8080,
            scheme: "http".to_string(),
            kind,
            region: region.to_string(),
            username: None,
            password: None,
        }
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[tokio::test]
    async fn acquire_errors_on_empty_pool() {
        let pool = ProxyPoolManager::empty();
        assert!(pool.acquire(&mut rng(), None).await.is_err());
    }

    #[tokio::test]
    async fn quarantine_withholds_handle_after_three_failures() {
        let pool = ProxyPoolManager::new(&[provider("p1", "us-east")]);
        let handle = pool.acquire(&mut rng(), None).await.unwrap();
        for _ in 0..3 {
            pool.release(&handle, false).await;
        }
        assert!(pool.acquire(&mut rng(), None).await.is_err());
    }

    #[tokio::test]
    async fn successful_release_resets_failure_streak() {
        let pool = ProxyPoolManager::new(&[provider("p1", "us-east")]);
        let handle = pool.acquire(&mut rng(), None).await.unwrap();
        pool.release(&handle, false).await;
        pool.release(&handle, false).await;
        pool.release(&handle, true).await;
        // still acquirable: streak was reset before hitting 3
        assert!(pool.acquire(&mut rng(), None).await.is_ok());
    }

    #[tokio::test]
    async fn report_block_quarantines_immediately() {
        let pool = ProxyPoolManager::new(&[provider("p1", "us-east")]);
        let handle = pool.acquire(&mut rng(), None).await.unwrap();
        pool.report_block(&handle).await;
        assert!(pool.acquire(&mut rng(), None).await.is_err());
    }

    #[tokio::test]
    async fn refresh_preserves_stats_for_surviving_endpoint() {
        let pool = ProxyPoolManager::new(&[provider("p1", "us-east")]);
        let handle = pool.acquire(&mut rng(), None).await.unwrap();
        pool.release(&handle, true).await;

        pool.refresh(&[provider("p1", "us-east"), provider("p2", "eu-west")]).await;
        assert_eq!(pool.len().await, 2);
    }

    #[tokio::test]
    async fn kind_preference_prefers_matching_handles() {
        let pool = ProxyPoolManager::new(&[
            provider_with_kind("p1", "us-east", ProxyKind::Datacenter),
            provider_with_kind("p2", "us-east", ProxyKind::Residential),
        ]);
        for _ in 0..10 {
            let handle = pool.acquire(&mut rng(), Some(ProxyKind::Residential)).await.unwrap();
            assert_eq!(handle.kind, ProxyKind::Residential);
        }
    }

    #[tokio::test]
    async fn kind_preference_falls_back_when_no_match_is_eligible() {
        let pool = ProxyPoolManager::new(&[provider_with_kind("p1", "us-east", ProxyKind::Datacenter)]);
        let handle = pool.acquire(&mut rng(), Some(ProxyKind::Residential)).await.unwrap();
        assert_eq!(handle.kind, ProxyKind::Datacenter);
    }
}
