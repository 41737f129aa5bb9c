//! `detainee-locator-core` — the scraping core behind a public detainee-lookup
//! search tool.
//!
//! This crate owns five tightly coupled subsystems (search orchestration, the
//! session/request pipeline, anti-detection coordination, proxy pool management,
//! and fuzzy result ranking) and exposes the data shapes a tool-invocation
//! transport would dispatch to. The transport itself, configuration-file
//! loading's *triggering*, logging sinks, and any browser-automation fallback
//! implementation are external collaborators — see [`browser_fallback`] for the
//! seam the last of those plugs into.

pub mod behavior;
pub mod browser_fallback;
pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod error;
pub mod fuzzy;
pub mod model;
pub mod natural_query;
pub mod obfuscator;
pub mod orchestrator;
pub mod proxy_pool;
pub mod session;
pub mod tools;
pub mod traffic;

pub use error::{ErrorKind, SearchError};
pub use model::query::{SearchKind, SearchQuery};
pub use model::result::{Record, SearchMetadata, SearchResult, SearchStatus};
pub use orchestrator::Orchestrator;
