//! Natural-language query parsing (spec §6 `parse_natural_query`, §9
//! supplemented feature — the component contracts in §4 never specify this
//! operation's algorithm). A line of free text is scanned with a fixed set of
//! named-capture regexes for an alien number, a date, a name span, a
//! trailing "from <country>" clause, and facility signals (zip code, a
//! "city, ST" pair, or a named detention facility), in that priority order,
//! and the first fully-identified kind wins. Grounded on the field-extraction
//! shape of `credential.rs`'s shell-config scanning: one regex per
//! recognizable pattern, tried in a fixed priority order, first match wins.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::SearchError;
use crate::model::query::{AlienNumberQuery, FacilityQuery, Language, NameQuery, SearchQuery};

fn alien_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b[A]?\d{8,9}\b").unwrap())
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap())
}

fn us_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap())
}

fn quoted_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"["']([A-Za-z][A-Za-z'.-]*(?:\s+[A-Za-z][A-Za-z'.-]*){1,2})["']"#).unwrap())
}

fn capitalized_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z][a-z'-]+)\s+([A-Z][a-z'-]+)(?:\s+([A-Z][a-z'-]+))?\b").unwrap())
}

fn from_country_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bfrom\s+([A-Za-z][A-Za-z .'-]{1,40}?)(?:[.,;]|\s+(?:born|on|dob|who)\b|$)").unwrap())
}

fn zip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{5})\b").unwrap())
}

fn city_state_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bin\s+([A-Z][a-zA-Z .'-]+),\s*([A-Z]{2})\b").unwrap())
}

fn facility_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b([A-Z][a-zA-Z0-9 .'-]*\s+(?:Facility|Center|Detention Center|Jail))\b").unwrap()
    })
}

fn parse_captured_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = iso_date_re().captures(text) {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some(caps) = us_date_re().captures(text) {
        let m: u32 = caps[1].parse().ok()?;
        let d: u32 = caps[2].parse().ok()?;
        let y: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    None
}

fn extract_name(text: &str) -> Option<(String, String, Option<String>)> {
    if let Some(caps) = quoted_name_re().captures(text) {
        let mut parts = caps[1].split_whitespace();
        let first = parts.next()?.to_string();
        let rest: Vec<&str> = parts.collect();
        return match rest.len() {
            0 => None,
            1 => Some((first, rest[0].to_string(), None)),
            _ => Some((first, rest[rest.len() - 1].to_string(), Some(rest[..rest.len() - 1].join(" ")))),
        };
    }
    let caps = capitalized_name_re().captures(text)?;
    let first = caps[1].to_string();
    match caps.get(3) {
        Some(third) => Some((first, third.as_str().to_string(), Some(caps[2].to_string()))),
        None => Some((first, caps[2].to_string(), None)),
    }
}

fn extract_country(text: &str) -> Option<String> {
    from_country_re().captures(text).map(|caps| caps[1].trim().to_string())
}

fn extract_facility(text: &str) -> Option<FacilityQuery> {
    let mut facility = FacilityQuery::default();
    let mut found = false;

    if let Some(caps) = facility_name_re().captures(text) {
        facility.facility_name = Some(caps[1].trim().to_string());
        found = true;
    }
    if let Some(caps) = city_state_re().captures(text) {
        facility.city = Some(caps[1].trim().to_string());
        facility.state = Some(caps[2].to_string());
        found = true;
    }
    if let Some(caps) = zip_re().captures(text) {
        facility.zip_code = Some(caps[1].to_string());
        found = true;
    }

    found.then_some(facility)
}

/// Parses free text into a [`SearchQuery`], preferring the most specific
/// identifying field found (spec §3 "exactly one identifying field set per
/// kind"): an alien number first, then a complete name+date-of-birth+country
/// triple, then facility signals. Text that identifies none of these surfaces
/// `SearchError::Validation` (spec §6 "ambiguous input").
pub fn parse_natural_query(text: &str, language: Language, confidence_threshold: f64) -> Result<SearchQuery, SearchError> {
    if let Some(m) = alien_number_re().find(text) {
        let alien_number = AlienNumberQuery::parse(m.as_str())?;
        let mut query = SearchQuery::by_alien_number(alien_number);
        query.language = language;
        return Ok(query);
    }

    if let (Some((first_name, last_name, middle_name)), Some(dob), Some(country)) =
        (extract_name(text), parse_captured_date(text), extract_country(text))
    {
        let mut query = SearchQuery::by_name(first_name, last_name, middle_name, dob, country);
        query.language = language;
        query.fuzzy = true;
        query.confidence_threshold = confidence_threshold;
        return query_validated(query);
    }

    if let Some(facility) = extract_facility(text) {
        let mut query = SearchQuery::by_facility(facility);
        query.language = language;
        return query_validated(query);
    }

    Err(SearchError::validation(format!(
        "could not identify an alien number, a name+date-of-birth+country, or facility details in: {text:?}"
    )))
}

fn query_validated(query: SearchQuery) -> Result<SearchQuery, SearchError> {
    query.validate()?;
    Ok(query)
}
