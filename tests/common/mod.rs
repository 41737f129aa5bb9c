//! Shared fixtures for the integration suite: upstream HTML snapshots and a
//! `Config` builder pointed at a mockito server. Mirrors the teacher's
//! `tests/common/mod.rs` (temp-dir/isolated-env helpers shared across its
//! network test modules) — here the shared thing is the fake upstream
//! instead of the filesystem/env.

use detainee_locator_core::config::Config;

/// The upstream form page: one `<form>` with a CSRF hidden field and visible
/// fields whose names carry the role substrings `build_visible_fields`
/// matches against (`first`, `last`, `dob`, `country`).
pub fn form_html(action_url: &str) -> String {
    format!(
        r#"<html><body>
        <form action="{action_url}" method="post">
            <input type="hidden" name="csrf_token" value="tok-1" />
            <input type="text" name="firstName" />
            <input type="text" name="lastName" />
            <input type="text" name="dobField" />
            <select name="countryList">
                <option>Mexico</option>
                <option>Honduras</option>
            </select>
        </form>
        </body></html>"#
    )
}

/// One results row matching the column order `extract_records` expects.
pub fn results_html_one_row() -> String {
    r#"<table id="detainee-results">
        <tbody>
            <tr>
                <td>A123456789</td>
                <td>John Doe</td>
                <td>01/15/1990</td>
                <td>Mexico</td>
                <td>Houston Center</td>
                <td>Houston, TX</td>
                <td>In Custody</td>
                <td>03/01/2024</td>
            </tr>
        </tbody>
    </table>"#
        .to_string()
}

pub fn not_found_html() -> String {
    "<html><body><p>No results found for your query.</p></body></html>".to_string()
}

pub fn captcha_html() -> String {
    r#"<html><body><div class="g-recaptcha"></div></body></html>"#.to_string()
}

/// A `Config` with the proxy pool and result cache both disabled (so tests
/// never need a reachable proxy and never leave state on disk across runs)
/// and its HTTP form endpoint pointed at `form_url`.
pub fn test_config(form_url: &str) -> Config {
    let mut config = Config::default();
    config.proxy.enabled = false;
    config.cache.enabled = false;
    config.http.base_url = form_url.to_string();
    config.http.timeout_seconds = 5;
    config.retry.max_attempts = 1;
    config.retry.backoff_base_ms = 1;
    config
}
