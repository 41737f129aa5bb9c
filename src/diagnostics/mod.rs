//! Structured operational logging (ambient stack; spec's logging-sinks
//! non-goal excludes only alerting/export destinations, not the logger
//! itself). Grounded on the rotating JSONL logger in the teacher repo's
//! `core::network::debug_logger`.

mod event;
mod logger;

pub use event::{DiagnosticEvent, EventKind};
pub use logger::RotatingLogger;
