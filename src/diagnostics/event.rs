//! Domain event kinds written to the JSONL diagnostics log, replacing the
//! teacher's network-probe event vocabulary with this crate's own.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One structured record. Mirrors the teacher's flat `LogEntry` shape
/// (timestamp/level/component/event/message/correlation_id/fields) but with
/// a closed `kind` instead of a free-form `event: String`.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEvent {
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    ProxyAcquired { proxy_id: Uuid, region: String },
    ProxyReleased { proxy_id: Uuid, success: bool },
    ProxyQuarantined { proxy_id: Uuid, consecutive_failures: u32 },
    ThreatLevelChanged { from: String, to: String, reason: String },
    RetryAttempted { attempt: u32, error_kind: String, backoff_ms: u64 },
    SearchCompleted { status: String, duration_ms: u64, candidates: usize },
    CaptchaDetected,
    CacheHit { fingerprint: String },
    CacheMiss { fingerprint: String },
    CacheEvicted { fingerprint: String, reason: String },
}

impl DiagnosticEvent {
    pub fn new(correlation_id: Uuid, kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            correlation_id,
            kind,
        }
    }
}
