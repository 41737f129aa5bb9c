//! Outbound request header construction (spec §2.B), grounded on the
//! teacher's `oauth_masquerade::build_headers` fixed-profile construction —
//! generalized here to permute header order and vary Accept-Language per
//! request instead of emitting one static profile.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::query::Language;

/// A header value bundle for one request. Distinct from
/// [`crate::model::session::PolicySnapshot`], which carries the *ordered*
/// pairs actually sent — this is the input the coordinator assembles before
/// permuting order.
#[derive(Debug, Clone)]
pub struct HeaderProfile {
    pub user_agent: String,
    pub accept: &'static str,
    pub accept_language: String,
    pub accept_encoding: &'static str,
    pub connection: &'static str,
}

impl HeaderProfile {
    pub fn new(user_agent: impl Into<String>, language: Language) -> Self {
        Self {
            user_agent: user_agent.into(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            accept_language: accept_language_for(language),
            accept_encoding: "gzip, deflate, br",
            connection: "keep-alive",
        }
    }
}

fn accept_language_for(language: Language) -> String {
    match language {
        Language::En => "en-US,en;q=0.9".to_string(),
        Language::Es => "es-MX,es;q=0.9,en;q=0.6".to_string(),
    }
}

/// Per-header inclusion probability for the optional headers (spec §4.B
/// "included with independent probabilities").
const DNT_PROBABILITY: f64 = 0.5;
const CACHE_CONTROL_PROBABILITY: f64 = 0.4;
const PRAGMA_PROBABILITY: f64 = 0.3;

/// Rolls DNT/Cache-Control/Pragma independently, then nudges the result off
/// whichever all-or-nothing extreme it landed on (spec "never all-on, never
/// all-off"): if every header was picked, one is dropped; if none were, one
/// is added. Both nudges pick uniformly among the three so no header is
/// systematically favored by the correction.
fn optional_headers(rng: &mut impl Rng) -> Vec<(String, String)> {
    let mut included = [
        rng.gen_bool(DNT_PROBABILITY),
        rng.gen_bool(CACHE_CONTROL_PROBABILITY),
        rng.gen_bool(PRAGMA_PROBABILITY),
    ];
    if included.iter().all(|b| *b) {
        included[rng.gen_range(0..included.len())] = false;
    } else if included.iter().all(|b| !*b) {
        included[rng.gen_range(0..included.len())] = true;
    }

    let candidates = [
        ("DNT".to_string(), "1".to_string()),
        ("Cache-Control".to_string(), "no-cache".to_string()),
        ("Pragma".to_string(), "no-cache".to_string()),
    ];
    candidates
        .into_iter()
        .zip(included)
        .filter_map(|(header, keep)| keep.then_some(header))
        .collect()
}

/// Builds the ordered header list for one outbound request, permuting the
/// order of the non-essential headers (spec §2.B "header-order
/// permutation") while keeping `User-Agent` first, matching how real
/// browsers place it.
pub fn build_headers(profile: &HeaderProfile, rng: &mut impl Rng) -> Vec<(String, String)> {
    let mut trailing = vec![
        ("Accept".to_string(), profile.accept.to_string()),
        ("Accept-Language".to_string(), profile.accept_language.clone()),
        ("Accept-Encoding".to_string(), profile.accept_encoding.to_string()),
        ("Connection".to_string(), profile.connection.to_string()),
    ];
    trailing.extend(optional_headers(rng));
    trailing.shuffle(rng);

    let mut headers = vec![("User-Agent".to_string(), profile.user_agent.clone())];
    headers.extend(trailing);
    headers
}
