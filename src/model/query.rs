//! `SearchQuery` (spec §3): immutable value constructed at the orchestrator
//! entry point and never mutated afterwards.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{RedactedQuery, SearchError};

/// Language the upstream form/results should be requested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    En,
    Es,
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::En => f.write_str("en"),
            Language::Es => f.write_str("es"),
        }
    }
}

/// Name-based search fields (spec §3 `byName`).
#[derive(Debug, Clone)]
pub struct NameQuery {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub date_of_birth: NaiveDate,
    pub country_of_birth: String,
}

fn alien_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^A?(\d{8,9})$").unwrap())
}

/// Alien-number search fields (spec §3 `byAlienNumber`).
///
/// `digits` is the canonical normalized form (letter prefix and whitespace
/// stripped) so that `"A12345678"` and `"12345678"` compare and fingerprint
/// identically (spec §8 boundary behavior).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlienNumberQuery {
    digits: String,
}

impl AlienNumberQuery {
    /// Parses and normalizes a raw alien-number string. Accepts an optional
    /// leading `A`/`a` and 8-9 digits; anything else is a validation error.
    pub fn parse(raw: &str) -> Result<Self, SearchError> {
        let trimmed = raw.trim();
        let caps = alien_number_re()
            .captures(trimmed)
            .ok_or_else(|| SearchError::validation(format!("invalid alien number: {raw:?}")))?;
        Ok(Self {
            digits: caps[1].to_string(),
        })
    }

    /// Canonical digits-only form, used for fingerprinting and equality.
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Conventional display form with the `A` prefix.
    pub fn display_form(&self) -> String {
        format!("A{}", self.digits)
    }
}

/// Facility-based search fields (spec §6 `search_by_facility`).
#[derive(Debug, Clone, Default)]
pub struct FacilityQuery {
    pub facility_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub facility_type: Option<String>,
    pub active_only: bool,
}

impl FacilityQuery {
    fn has_identifying_field(&self) -> bool {
        self.facility_name.as_ref().is_some_and(|s| !s.trim().is_empty())
            || (self.city.is_some() && self.state.is_some())
            || self.zip_code.as_ref().is_some_and(|s| !s.trim().is_empty())
    }
}

/// Exactly one identifying kind, per spec §3 invariant "exactly one
/// identifying field set per kind". `parse_natural_query` always resolves its
/// input down to one of these variants before a `SearchQuery` is constructed;
/// there is no separate `Natural` variant here (see DESIGN.md Open Question
/// resolution: ranking stays uniform, only the parsing path differs).
#[derive(Debug, Clone)]
pub enum SearchKind {
    ByName(NameQuery),
    ByAlienNumber(AlienNumberQuery),
    ByFacility(FacilityQuery),
}

impl SearchKind {
    pub fn label(&self) -> &'static str {
        match self {
            SearchKind::ByName(_) => "by_name",
            SearchKind::ByAlienNumber(_) => "by_alien_number",
            SearchKind::ByFacility(_) => "by_facility",
        }
    }
}

/// Immutable search request (spec §3 `SearchQuery`).
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub kind: SearchKind,
    pub language: Language,
    pub fuzzy: bool,
    pub confidence_threshold: f64,
    pub date_tolerance_days: Option<u32>,
}

impl SearchQuery {
    pub fn by_name(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        middle_name: Option<String>,
        date_of_birth: NaiveDate,
        country_of_birth: impl Into<String>,
    ) -> Self {
        Self {
            kind: SearchKind::ByName(NameQuery {
                first_name: first_name.into(),
                last_name: last_name.into(),
                middle_name,
                date_of_birth,
                country_of_birth: country_of_birth.into(),
            }),
            language: Language::En,
            fuzzy: false,
            confidence_threshold: 0.0,
            date_tolerance_days: None,
        }
    }

    pub fn by_alien_number(alien_number: AlienNumberQuery) -> Self {
        Self {
            kind: SearchKind::ByAlienNumber(alien_number),
            language: Language::En,
            fuzzy: false,
            confidence_threshold: 0.0,
            date_tolerance_days: None,
        }
    }

    pub fn by_facility(facility: FacilityQuery) -> Self {
        Self {
            kind: SearchKind::ByFacility(facility),
            language: Language::En,
            fuzzy: false,
            confidence_threshold: 0.0,
            date_tolerance_days: None,
        }
    }

    /// Structural validation (spec §3 invariants, §7 `validation` error kind).
    /// Idempotent: calling this repeatedly on the same query yields the same
    /// `Ok(())`/`Err` outcome (spec §8 round-trip law).
    pub fn validate(&self) -> Result<(), SearchError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(SearchError::validation(format!(
                "confidence_threshold {} out of range [0,1]",
                self.confidence_threshold
            )));
        }
        match &self.kind {
            SearchKind::ByName(n) => {
                if n.first_name.trim().is_empty() || n.last_name.trim().is_empty() {
                    return Err(SearchError::validation(
                        "first_name and last_name must be non-empty after trim",
                    ));
                }
                if n.country_of_birth.trim().is_empty() {
                    return Err(SearchError::validation("country_of_birth must be non-empty"));
                }
            }
            SearchKind::ByAlienNumber(_) => {
                // Parsing already validated the pattern; nothing further to check.
            }
            SearchKind::ByFacility(f) => {
                if !f.has_identifying_field() {
                    return Err(SearchError::validation(
                        "facility search requires facility_name, (city and state), or zip_code",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Redacted snapshot for error reporting (spec §7): field *names* survive,
    /// values never do.
    pub fn redacted(&self) -> RedactedQuery {
        let field_names: &[&str] = match &self.kind {
            SearchKind::ByName(_) => &["first_name", "last_name", "middle_name", "date_of_birth", "country_of_birth"],
            SearchKind::ByAlienNumber(_) => &["alien_number"],
            SearchKind::ByFacility(_) => &["facility_name", "city", "state", "zip_code"],
        };
        RedactedQuery::new(self.kind.label(), self.language.to_string(), field_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn valid_name_query() -> SearchQuery {
        SearchQuery::by_name(
            "John",
            "Doe",
            None,
            NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
            "Mexico",
        )
    }

    #[test]
    fn alien_number_normalizes_prefix_and_bare_forms_identically() {
        let a = AlienNumberQuery::parse("A12345678").unwrap();
        let b = AlienNumberQuery::parse("12345678").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.digits(), "12345678");
        assert_eq!(a.display_form(), "A12345678");
    }

    #[test]
    fn alien_number_accepts_lowercase_prefix_and_nine_digits() {
        assert!(AlienNumberQuery::parse("a123456789").is_ok());
    }

    #[test]
    fn alien_number_rejects_malformed_input() {
        assert!(AlienNumberQuery::parse("12345").is_err());
        assert!(AlienNumberQuery::parse("B12345678").is_err());
        assert!(AlienNumberQuery::parse("A1234567890").is_err());
    }

    #[test]
    fn validate_is_idempotent_on_well_formed_query() {
        let q = valid_name_query();
        assert!(q.validate().is_ok());
        assert!(q.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_names() {
        let mut q = valid_name_query();
        if let SearchKind::ByName(n) = &mut q.kind {
            n.first_name = "   ".to_string();
        }
        assert!(q.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_confidence() {
        let mut q = valid_name_query();
        q.confidence_threshold = 1.5;
        assert!(q.validate().is_err());
    }

    #[test]
    fn facility_query_requires_an_identifying_field() {
        let empty = FacilityQuery::default();
        let q = SearchQuery::by_facility(empty);
        assert!(q.validate().is_err());

        let by_zip = FacilityQuery {
            zip_code: Some("77002".to_string()),
            ..Default::default()
        };
        assert!(SearchQuery::by_facility(by_zip).validate().is_ok());
    }

    #[test]
    fn redacted_query_never_exposes_values() {
        let q = valid_name_query();
        let r = q.redacted();
        assert_eq!(r.kind, "by_name");
        assert!(r.fields.values().all(|v| v == "[redacted]"));
    }
}
