//! Request Obfuscator (spec §2.B, ~8% share): builds per-request headers —
//! user-agent selection, header-order permutation, Accept-Language variation,
//! timing jitter. Grounded on the teacher's `oauth_masquerade` fixed
//! header-profile construction, generalized from one static profile to a
//! pool of candidate profiles selected per session.

mod headers;
mod user_agents;

pub use headers::{build_headers, HeaderProfile};
pub use user_agents::pick_user_agent;
