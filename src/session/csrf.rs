//! CSRF token lifecycle (spec §4.F). Binding happens once per `fetch_form`;
//! expiry is detected authoritatively by the server on submit, not guessed
//! client-side beyond the conservative TTL in [`crate::model::session::CsrfToken`].

use super::form::ParsedForm;
use crate::error::SearchError;
use crate::model::session::CsrfToken;

/// Extracts and binds the CSRF token from a freshly parsed form onto the
/// session. Absence of a recognizable token is a parse failure: the form
/// shape changed in a way the known name patterns no longer cover.
pub fn bind_csrf_token(form: &ParsedForm) -> Result<CsrfToken, SearchError> {
    let (name, value) = form
        .csrf_field()
        .ok_or_else(|| SearchError::parse_failure("no recognizable CSRF field in fetched form"))?;
    Ok(CsrfToken::new(name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_token_from_recognized_field() {
        let form = ParsedForm {
            action: "/x".to_string(),
            method: "POST".to_string(),
            hidden_fields: vec![("csrf_token".to_string(), "tok-1".to_string())],
            visible_field_names: vec![],
            country_options: vec![],
        };
        let token = bind_csrf_token(&form).unwrap();
        assert_eq!(token.field_name, "csrf_token");
        assert_eq!(token.value, "tok-1");
    }

    #[test]
    fn errors_when_no_csrf_field_present() {
        let form = ParsedForm {
            action: "/x".to_string(),
            method: "POST".to_string(),
            hidden_fields: vec![("unrelated".to_string(), "v".to_string())],
            visible_field_names: vec![],
            country_options: vec![],
        };
        assert!(bind_csrf_token(&form).is_err());
    }
}
