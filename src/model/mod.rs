//! Shared data model (spec §3). Every type here is plain data — construction
//! and invariant checks live alongside the type, but the stateful logic that
//! mutates these values over a search's lifetime lives in the sibling modules
//! named after each owning component (`proxy_pool` owns `ProxyHandle` pool
//! state, `behavior` owns `BehaviorProfile` timing logic, `coordinator` owns
//! threat-level transitions, `session` owns `SessionState` mutation).

pub mod behavior;
pub mod cache;
pub mod proxy;
pub mod query;
pub mod result;
pub mod session;

pub use behavior::BehaviorProfile;
pub use cache::CacheEntry;
pub use proxy::{ProxyHandle, ProxyKind};
pub use query::{Language, SearchKind, SearchQuery};
pub use result::{Record, SearchMetadata, SearchResult, SearchStatus};
pub use session::{CsrfToken, ResponseClassification, SessionState, ThreatLevel};
