//! Response classification (spec §4.F): a deterministic function over
//! status code + body shape + presence of specific tokens, feeding
//! [`crate::coordinator::AntiDetectionCoordinator::observe`].

use crate::model::session::ResponseClassification;

const CAPTCHA_MARKERS: &[&str] = &["g-recaptcha", "h-captcha", "captcha-container", "just a moment"];
const NO_RESULTS_MARKERS: &[&str] = &["no results found", "no matching records", "no record was found"];
const RESULTS_TABLE_MARKERS: &[&str] = &["alien number", "detainee-results", "results-table"];

fn body_contains_any(body_lower: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| body_lower.contains(m))
}

/// Classifies one HTTP response. Body matching is case-insensitive and
/// intentionally loose — the upstream's exact markup is not a stable
/// contract, only these substrings are assumed to persist.
pub fn classify_response(status: u16, body: &str) -> ResponseClassification {
    if status == 403 {
        return ResponseClassification::Blocked { status };
    }
    if status == 429 {
        return ResponseClassification::RateLimited { status };
    }
    if (500..600).contains(&status) {
        return ResponseClassification::ServerError { status };
    }
    if status == 404 {
        return ResponseClassification::ClientError { status };
    }
    if (400..500).contains(&status) {
        return ResponseClassification::ClientError { status };
    }

    let lower = body.to_ascii_lowercase();
    if body_contains_any(&lower, CAPTCHA_MARKERS) {
        return ResponseClassification::Captcha;
    }
    if body_contains_any(&lower, RESULTS_TABLE_MARKERS) {
        return ResponseClassification::Results;
    }
    if body_contains_any(&lower, NO_RESULTS_MARKERS) {
        return ResponseClassification::NotFound;
    }

    // 200 with none of the known markers: treat conservatively as no
    // results rather than silently dropping the response.
    ResponseClassification::NotFound
}
