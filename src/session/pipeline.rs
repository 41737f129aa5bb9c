//! Pipeline state machine (spec §4.F): `fetch_form` → `parse_form` → `submit`
//! → `classify_response`, with bounded retries on token-extraction failure
//! and on CSRF expiry detected at submit time.

use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

use super::classify::classify_response;
use super::csrf::bind_csrf_token;
use super::extract::extract_records;
use super::form::{parse_form, ParsedForm};
use crate::error::SearchError;
use crate::model::query::{FacilityQuery, NameQuery, SearchKind, SearchQuery};
use crate::model::result::Record;
use crate::model::session::{RequestKind, ResponseClassification, SessionState};

/// Maximum times `fetch_form` is retried after a token-extraction failure
/// (spec §4.F "retry form fetch up to 2 times, else error").
const MAX_TOKEN_EXTRACTION_RETRIES: u32 = 2;

/// Outcome of a completed pipeline run.
#[derive(Debug)]
pub enum SessionPhase {
    Results(Vec<Record>),
    NotFound,
}

/// An outbound HTTP call, abstracted so the pipeline can be driven against a
/// mock transport in tests without a real network (grounded on the
/// dedicated-client-trait pattern the proxy health checker uses).
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        session: &SessionState,
    ) -> Result<(u16, String), SearchError>;

    async fn post_form(
        &self,
        url: &str,
        headers: &[(String, String)],
        form_fields: &[(String, String)],
        session: &SessionState,
    ) -> Result<(u16, String), SearchError>;
}

fn strip_accents(s: &str) -> String {
    s.nfd().filter(|c| !unicode_normalization::char::is_combining_mark(*c)).collect()
}

fn accent_insensitive_eq(a: &str, b: &str) -> bool {
    strip_accents(a).to_ascii_lowercase().trim() == strip_accents(b).to_ascii_lowercase().trim()
}

/// Matches a free-text country value against the form's option list,
/// case- and accent-insensitively (spec §4.F "Country is matched against an
/// option list... failure to match ⇒ validation error before HTTP").
fn match_country<'a>(raw: &str, options: &'a [String]) -> Option<&'a str> {
    options.iter().find(|opt| accent_insensitive_eq(opt, raw)).map(|s| s.as_str())
}

/// Builds the visible-field POST values from the query, using the form's own
/// field names rather than hardcoded ones (spec §4.F "Field names are taken
/// from the parsed form, not hardcoded").
fn build_visible_fields(form: &ParsedForm, query: &SearchQuery) -> Result<Vec<(String, String)>, SearchError> {
    let mut by_role: HashMap<&str, String> = HashMap::new();
    match &query.kind {
        SearchKind::ByName(NameQuery {
            first_name,
            last_name,
            middle_name,
            date_of_birth,
            country_of_birth,
        }) => {
            by_role.insert("first", first_name.clone());
            by_role.insert("last", last_name.clone());
            if let Some(m) = middle_name {
                by_role.insert("middle", m.clone());
            }
            by_role.insert("dob", date_of_birth.format("%Y-%m-%d").to_string());
            let matched = match_country(country_of_birth, &form.country_options).ok_or_else(|| {
                SearchError::validation(format!("country {country_of_birth:?} not found in form option list"))
            })?;
            by_role.insert("country", matched.to_string());
        }
        SearchKind::ByAlienNumber(alien) => {
            by_role.insert("alien_number", alien.digits().to_string());
        }
        SearchKind::ByFacility(FacilityQuery {
            facility_name,
            city,
            state,
            zip_code,
            ..
        }) => {
            if let Some(v) = facility_name {
                by_role.insert("facility", v.clone());
            }
            if let Some(v) = city {
                by_role.insert("city", v.clone());
            }
            if let Some(v) = state {
                by_role.insert("state", v.clone());
            }
            if let Some(v) = zip_code {
                by_role.insert("zip", v.clone());
            }
        }
    }

    let mut fields = Vec::new();
    for field_name in &form.visible_field_names {
        let lower = field_name.to_ascii_lowercase();
        let value = by_role.iter().find(|(role, _)| lower.contains(**role)).map(|(_, v)| v.clone());
        if let Some(value) = value {
            fields.push((field_name.clone(), value));
        }
    }
    Ok(fields)
}

/// Drives one search attempt through the form-fetch/parse/submit/classify
/// state machine (spec §4.F).
pub struct SessionPipeline<'a> {
    transport: &'a dyn HttpTransport,
    base_url: &'a str,
}

impl<'a> SessionPipeline<'a> {
    pub fn new(transport: &'a dyn HttpTransport, base_url: &'a str) -> Self {
        Self { transport, base_url }
    }

    /// Runs the full state machine once. Returns `Ok(SessionPhase::Results)`
    /// or `Ok(SessionPhase::NotFound)` on a settled outcome; any block,
    /// CAPTCHA, or unrecoverable parse failure surfaces as an `Err` for the
    /// orchestrator's retry loop to classify (spec §4.H step 4).
    pub async fn run(&self, session: &mut SessionState, query: &SearchQuery, headers: &[(String, String)]) -> Result<SessionPhase, SearchError> {
        let mut token_retries = 0;
        let mut csrf_retry_used = false;

        loop {
            session.record_request();
            let (status, body) = self.transport.get(self.base_url, headers, session).await?;
            let classification = classify_response(status, &body);
            if classification.is_block_signal() || matches!(classification, ResponseClassification::RateLimited { .. }) {
                return Err(self.surface_block(classification, session));
            }
            if classification.is_generic_client_error() {
                return Err(SearchError::parse_failure(format!(
                    "form fetch returned client error (correlation_id={})",
                    session.correlation_id
                )));
            }

            let form = match parse_form(&body) {
                Ok(form) => form,
                Err(err) => {
                    if token_retries < MAX_TOKEN_EXTRACTION_RETRIES {
                        token_retries += 1;
                        continue;
                    }
                    return Err(err);
                }
            };
            let token = match bind_csrf_token(&form) {
                Ok(token) => token,
                Err(err) => {
                    if token_retries < MAX_TOKEN_EXTRACTION_RETRIES {
                        token_retries += 1;
                        continue;
                    }
                    return Err(err);
                }
            };
            session.csrf = Some(token);

            let mut form_fields = form.hidden_fields.clone();
            form_fields.extend(build_visible_fields(&form, query)?);

            session.record_request();
            let (status, body) = self
                .transport
                .post_form(&form.action, headers, &form_fields, session)
                .await?;
            let classification = classify_response(status, &body);

            if classification.is_generic_client_error() && self.looks_like_csrf_expiry(status) && !csrf_retry_used {
                csrf_retry_used = true;
                session.csrf = None;
                continue;
            }
            if classification.is_block_signal() || matches!(classification, ResponseClassification::RateLimited { .. }) {
                return Err(self.surface_block(classification, session));
            }

            return match classification {
                ResponseClassification::Results => Ok(SessionPhase::Results(extract_records(&body))),
                ResponseClassification::NotFound => Ok(SessionPhase::NotFound),
                _ => Err(SearchError::parse_failure(format!(
                    "submit returned unexpected classification (correlation_id={})",
                    session.correlation_id
                ))),
            };
        }
    }

    fn looks_like_csrf_expiry(&self, status: u16) -> bool {
        status == 400 || status == 409
    }

    fn surface_block(&self, classification: ResponseClassification, session: &SessionState) -> SearchError {
        match classification {
            ResponseClassification::Captcha => {
                SearchError::captcha_required(format!("CAPTCHA surfaced (correlation_id={})", session.correlation_id))
            }
            ResponseClassification::Blocked { status } => {
                SearchError::blocked(format!("blocked with status {status} (correlation_id={})", session.correlation_id))
            }
            ResponseClassification::RateLimited { status } => SearchError::rate_limited(format!(
                "rate limited with status {status} (correlation_id={})",
                session.correlation_id
            )),
            _ => SearchError::internal("surface_block called on a non-block classification"),
        }
    }
}

/// Parameterizes the session pipeline's delay-insertion call site (spec
/// §4.F step sequencing aligns with the coordinator's `RequestKind`).
pub fn request_kind_for_phase(is_submit: bool) -> RequestKind {
    if is_submit {
        RequestKind::FormSubmit
    } else {
        RequestKind::FormFetch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    use crate::model::query::Language;

    const FORM_HTML: &str = r#"
        <html><body>
        <form action="/submit" method="post">
            <input type="hidden" name="csrf_token" value="tok-1" />
            <input type="text" name="firstName" />
            <input type="text" name="lastName" />
            <input type="text" name="dobField" />
            <select name="countryList">
                <option>Mexico</option>
                <option>Honduras</option>
            </select>
        </form>
        </body></html>
    "#;

    struct ScriptedTransport {
        get_response: (u16, String),
        post_response: (u16, String),
        post_calls: AtomicUsize,
        last_post_fields: Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn get(&self, _url: &str, _headers: &[(String, String)], _session: &SessionState) -> Result<(u16, String), SearchError> {
            Ok(self.get_response.clone())
        }

        async fn post_form(
            &self,
            _url: &str,
            _headers: &[(String, String)],
            fields: &[(String, String)],
            _session: &SessionState,
        ) -> Result<(u16, String), SearchError> {
            self.post_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_post_fields.lock().unwrap() = fields.to_vec();
            Ok(self.post_response.clone())
        }
    }

    fn name_query() -> SearchQuery {
        SearchQuery::by_name(
            "Jane",
            "Doe",
            None,
            NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
            "mexico",
        )
    }

    #[tokio::test]
    async fn happy_path_reaches_results() {
        let transport = ScriptedTransport {
            get_response: (200, FORM_HTML.to_string()),
            post_response: (200, r#"<table id="detainee-results"><tr><td>A1</td></tr></table>"#.to_string()),
            post_calls: AtomicUsize::new(0),
            last_post_fields: Mutex::new(Vec::new()),
        };
        let pipeline = SessionPipeline::new(&transport, "https://example.invalid/search");
        let mut session = SessionState::new(Uuid::new_v4(), Language::En);
        let query = name_query();

        let outcome = pipeline.run(&mut session, &query, &[]).await.unwrap();
        assert!(matches!(outcome, SessionPhase::Results(_)));
        assert_eq!(transport.post_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn country_is_matched_case_and_accent_insensitively() {
        let transport = ScriptedTransport {
            get_response: (200, FORM_HTML.to_string()),
            post_response: (200, "<p>No results found</p>".to_string()),
            post_calls: AtomicUsize::new(0),
            last_post_fields: Mutex::new(Vec::new()),
        };
        let pipeline = SessionPipeline::new(&transport, "https://example.invalid/search");
        let mut session = SessionState::new(Uuid::new_v4(), Language::En);
        let query = name_query();

        pipeline.run(&mut session, &query, &[]).await.unwrap();
        let fields = transport.last_post_fields.lock().unwrap();
        assert!(fields.iter().any(|(name, value)| name == "countryList" && value == "Mexico"));
    }

    #[tokio::test]
    async fn unmatched_country_is_a_validation_error_before_http() {
        let transport = ScriptedTransport {
            get_response: (200, FORM_HTML.to_string()),
            post_response: (200, String::new()),
            post_calls: AtomicUsize::new(0),
            last_post_fields: Mutex::new(Vec::new()),
        };
        let pipeline = SessionPipeline::new(&transport, "https://example.invalid/search");
        let mut session = SessionState::new(Uuid::new_v4(), Language::En);
        let mut query = name_query();
        if let SearchKind::ByName(n) = &mut query.kind {
            n.country_of_birth = "Atlantis".to_string();
        }

        let err = pipeline.run(&mut session, &query, &[]).await.unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
        assert_eq!(transport.post_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn captcha_on_submit_surfaces_as_captcha_required() {
        let transport = ScriptedTransport {
            get_response: (200, FORM_HTML.to_string()),
            post_response: (200, r#"<div class="g-recaptcha"></div>"#.to_string()),
            post_calls: AtomicUsize::new(0),
            last_post_fields: Mutex::new(Vec::new()),
        };
        let pipeline = SessionPipeline::new(&transport, "https://example.invalid/search");
        let mut session = SessionState::new(Uuid::new_v4(), Language::En);
        let query = name_query();

        let err = pipeline.run(&mut session, &query, &[]).await.unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::CaptchaRequired);
    }

    #[tokio::test]
    async fn no_recognizable_form_exhausts_retries_then_errors() {
        let transport = ScriptedTransport {
            get_response: (200, "<html><body>no form here</body></html>".to_string()),
            post_response: (200, String::new()),
            post_calls: AtomicUsize::new(0),
            last_post_fields: Mutex::new(Vec::new()),
        };
        let pipeline = SessionPipeline::new(&transport, "https://example.invalid/search");
        let mut session = SessionState::new(Uuid::new_v4(), Language::En);
        let query = name_query();

        let err = pipeline.run(&mut session, &query, &[]).await.unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::ParseFailure);
        assert_eq!(transport.post_calls.load(Ordering::SeqCst), 0);
    }
}
