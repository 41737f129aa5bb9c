//! Proxy Pool Manager (spec §2.A, ~20% share): owns the set of proxy
//! endpoints, ranks them by composite health score, hands out and reclaims
//! handles, quarantines failing ones. Grounded on the teacher's
//! `core::network::proxy_health` subsystem — same shape (a scoring function,
//! an outcome-reporting path, a trait-abstracted client for testability) but
//! retargeted from single-proxy health probing to a whole-pool rotation
//! manager.

mod manager;
mod quarantine;
mod scoring;

pub use manager::ProxyPoolManager;
pub use quarantine::QuarantineState;
pub use scoring::composite_score;
