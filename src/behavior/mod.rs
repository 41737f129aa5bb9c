//! Behavior Simulator (spec §2.C, §4.C, ~7% share): computes inter-request
//! delays that mimic reading, typing, navigation, and tracks per-session
//! cadence/fatigue.

mod delay;
mod profile;

pub use delay::delay_for;
pub use profile::new_profile;
