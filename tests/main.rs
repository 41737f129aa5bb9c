//! Integration test entry point. Cargo only auto-discovers top-level
//! `tests/*.rs` files as separate test binaries; this one aggregates the
//! suite's submodules so fixtures in `common` are shared rather than
//! duplicated per binary.

mod common;
mod orchestrator;
mod session;
