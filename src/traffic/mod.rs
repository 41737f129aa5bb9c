//! Traffic Distributor (spec §2.D, §4.D, ~7% share): global, process-wide
//! admission control shaping aggregate request rate across all sessions.

mod bucket;
mod patterns;

pub use bucket::{Priority, TrafficDistributor};
pub use patterns::PatternState;
