//! HTML form parsing (spec §4.F "Form parsing"). The upstream form shape
//! drifts occasionally; the parser is deliberately defensive rather than
//! hardcoded to one exact markup snapshot.

use scraper::{Html, Selector};

use crate::error::SearchError;

/// Hidden + visible field names the upstream form is known to use for its
/// CSRF/event-validation tokens, in priority order.
const CSRF_FIELD_NAMES: &[&str] = &[
    "__RequestVerificationToken",
    "csrf_token",
    "csrfmiddlewaretoken",
    "__EVENTVALIDATION",
    "__VIEWSTATE",
];

#[derive(Debug, Clone)]
pub struct ParsedForm {
    pub action: String,
    pub method: String,
    /// Every hidden input, verbatim (spec: "extract *all* hidden inputs
    /// verbatim").
    pub hidden_fields: Vec<(String, String)>,
    pub visible_field_names: Vec<String>,
    /// Options of the `<select>` whose name contains "country", if present.
    /// Used to validate/normalize `country_of_birth` before submit (spec:
    /// "Country is matched against an option list").
    pub country_options: Vec<String>,
}

impl ParsedForm {
    /// The first hidden field whose name matches a known CSRF pattern, if
    /// any (spec: "detect the CSRF token by well-known name patterns").
    pub fn csrf_field(&self) -> Option<(&str, &str)> {
        for candidate in CSRF_FIELD_NAMES {
            if let Some((name, value)) = self
                .hidden_fields
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(candidate))
            {
                return Some((name.as_str(), value.as_str()));
            }
        }
        None
    }
}

/// Locates the search form and extracts its shape. Selector strategy:
/// prefer a form whose `action` contains `search` or `locator`; fall back to
/// the first form containing at least one hidden input (spec: "resilient
/// selector: prefer action URL match, fall back to field-set heuristic").
pub fn parse_form(html: &str) -> Result<ParsedForm, SearchError> {
    let document = Html::parse_document(html);
    let form_selector =
        Selector::parse("form").map_err(|e| SearchError::parse_failure(format!("bad form selector: {e:?}")))?;
    let input_selector =
        Selector::parse("input").map_err(|e| SearchError::parse_failure(format!("bad input selector: {e:?}")))?;

    let forms: Vec<_> = document.select(&form_selector).collect();
    if forms.is_empty() {
        return Err(SearchError::parse_failure("no <form> element found on page"));
    }

    let chosen = forms
        .iter()
        .find(|f| {
            f.value()
                .attr("action")
                .map(|a| a.to_ascii_lowercase())
                .is_some_and(|a| a.contains("search") || a.contains("locator"))
        })
        .or_else(|| {
            forms
                .iter()
                .find(|f| f.select(&input_selector).any(|i| i.value().attr("type") == Some("hidden")))
        })
        .ok_or_else(|| SearchError::parse_failure("no form matched action or hidden-field heuristics"))?;

    let action = chosen.value().attr("action").unwrap_or("").to_string();
    let method = chosen
        .value()
        .attr("method")
        .unwrap_or("post")
        .to_ascii_uppercase();

    let mut hidden_fields = Vec::new();
    let mut visible_field_names = Vec::new();
    for input in chosen.select(&input_selector) {
        let Some(name) = input.value().attr("name") else { continue };
        let value = input.value().attr("value").unwrap_or("").to_string();
        match input.value().attr("type") {
            Some("hidden") => hidden_fields.push((name.to_string(), value)),
            _ => visible_field_names.push(name.to_string()),
        }
    }

    let mut country_options = Vec::new();
    if let Ok(select_selector) = Selector::parse("select") {
        if let Ok(option_selector) = Selector::parse("option") {
            if let Some(select) = chosen.select(&select_selector).find(|s| {
                s.value()
                    .attr("name")
                    .is_some_and(|n| n.to_ascii_lowercase().contains("country"))
            }) {
                visible_field_names.push(
                    select
                        .value()
                        .attr("name")
                        .unwrap_or("country")
                        .to_string(),
                );
                for option in select.select(&option_selector) {
                    let text = option.text().collect::<Vec<_>>().join(" ").trim().to_string();
                    if !text.is_empty() {
                        country_options.push(text);
                    }
                }
            }
        }
    }

    Ok(ParsedForm {
        action,
        method,
        hidden_fields,
        visible_field_names,
        country_options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <html><body>
        <form action="/search-results" method="post">
            <input type="hidden" name="__RequestVerificationToken" value="abc123" />
            <input type="hidden" name="__VIEWSTATE" value="xyz" />
            <input type="text" name="firstName" />
            <input type="text" name="lastName" />
        </form>
        </body></html>
    "#;

    #[test]
    fn parses_action_method_and_hidden_fields() {
        let form = parse_form(SAMPLE).unwrap();
        assert_eq!(form.action, "/search-results");
        assert_eq!(form.method, "POST");
        assert_eq!(form.hidden_fields.len(), 2);
        assert!(form.visible_field_names.contains(&"firstName".to_string()));
    }

    #[test]
    fn finds_csrf_field_by_known_name() {
        let form = parse_form(SAMPLE).unwrap();
        let (name, value) = form.csrf_field().unwrap();
        assert_eq!(name, "__RequestVerificationToken");
        assert_eq!(value, "abc123");
    }

    #[test]
    fn errors_when_no_form_present() {
        assert!(parse_form("<html><body>no form here</body></html>").is_err());
    }

    #[test]
    fn extracts_country_select_options() {
        let html = r#"
            <form action="/search-results" method="post">
                <input type="hidden" name="csrf_token" value="abc" />
                <select name="countryList">
                    <option>Mexico</option>
                    <option>Honduras</option>
                </select>
            </form>
        "#;
        let form = parse_form(html).unwrap();
        assert_eq!(form.country_options, vec!["Mexico".to_string(), "Honduras".to_string()]);
        assert!(form.visible_field_names.contains(&"countryList".to_string()));
    }
}
