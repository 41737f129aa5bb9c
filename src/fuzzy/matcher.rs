//! `rank` (spec §4.G contract): scores and orders a raw candidate set
//! against the query that produced it.

use chrono::NaiveDate;

use super::similarity::{country_similarity, dob_similarity, name_similarity};
use super::variants::strip_accents;
use crate::model::query::{Language, SearchKind, SearchQuery};
use crate::model::result::Record;

const NAME_WEIGHT: f64 = 0.6;
const DOB_WEIGHT: f64 = 0.3;
const COUNTRY_WEIGHT: f64 = 0.1;

fn parse_record_dob(record: &Record) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&record.date_of_birth, "%Y-%m-%d").ok()
}

fn confidence_for_name_query(
    first_name: &str,
    middle_name: Option<&str>,
    last_name: &str,
    country_of_birth: &str,
    date_of_birth: NaiveDate,
    date_tolerance_days: u32,
    record: &Record,
) -> f64 {
    let name = name_similarity(first_name, middle_name, last_name, &record.full_name);
    let dob = dob_similarity(date_of_birth, parse_record_dob(record), date_tolerance_days);
    let country = country_similarity(country_of_birth, &record.country_of_birth);
    (name * NAME_WEIGHT + dob * DOB_WEIGHT + country * COUNTRY_WEIGHT).clamp(0.0, 1.0)
}

fn confidence_for_alien_number_query(digits: &str, record: &Record) -> f64 {
    let record_digits: String = record.alien_number.chars().filter(|c| c.is_ascii_digit()).collect();
    if record_digits == digits {
        1.0
    } else {
        0.0
    }
}

fn confidence_for_facility_query(
    facility_name: Option<&str>,
    city: Option<&str>,
    state: Option<&str>,
    zip_code: Option<&str>,
    record: &Record,
) -> f64 {
    let mut scores = Vec::new();
    if let Some(name) = facility_name {
        scores.push(strsim::normalized_levenshtein(
            &strip_accents(name).to_ascii_lowercase(),
            &strip_accents(&record.facility_name).to_ascii_lowercase(),
        ));
    }
    let location_lower = record.facility_location.to_ascii_lowercase();
    if let Some(city) = city {
        scores.push(if location_lower.contains(&city.to_ascii_lowercase()) { 1.0 } else { 0.0 });
    }
    if let Some(state) = state {
        scores.push(if location_lower.contains(&state.to_ascii_lowercase()) { 1.0 } else { 0.0 });
    }
    if let Some(zip) = zip_code {
        scores.push(if location_lower.contains(zip) { 1.0 } else { 0.0 });
    }
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Applies language-aware presentation (spec §4.G "present original glyphs
/// in output" for `es`): no-op, since `Record`s are never mutated to strip
/// diacritics — the accent-folding only ever happens inside comparison.
fn present(record: Record, _language: Language) -> Record {
    record
}

/// Scores and ranks `candidates` against `query`, filtering by
/// `query.confidence_threshold` and breaking ties by original position
/// (spec §4.G step 3). Empty input yields empty output; a zero threshold
/// returns every scored candidate.
pub fn rank(query: &SearchQuery, candidates: Vec<Record>) -> Vec<(Record, f64)> {
    let tolerance_days = query.date_tolerance_days.unwrap_or(0);

    let mut scored: Vec<(usize, Record, f64)> = candidates
        .into_iter()
        .enumerate()
        .map(|(idx, record)| {
            let confidence = match &query.kind {
                SearchKind::ByName(n) => confidence_for_name_query(
                    &n.first_name,
                    n.middle_name.as_deref(),
                    &n.last_name,
                    &n.country_of_birth,
                    n.date_of_birth,
                    tolerance_days,
                    &record,
                ),
                SearchKind::ByAlienNumber(a) => confidence_for_alien_number_query(a.digits(), &record),
                SearchKind::ByFacility(f) => confidence_for_facility_query(
                    f.facility_name.as_deref(),
                    f.city.as_deref(),
                    f.state.as_deref(),
                    f.zip_code.as_deref(),
                    &record,
                ),
            };
            (idx, record, confidence)
        })
        .collect();

    scored.retain(|(_, _, confidence)| *confidence >= query.confidence_threshold);
    scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));

    scored
        .into_iter()
        .map(|(_, mut record, confidence)| {
            record.confidence = Some(confidence);
            (present(record, query.language), confidence)
        })
        .collect()
}
