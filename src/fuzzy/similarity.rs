//! Per-component similarity scoring (spec §4.G step 1).

use chrono::NaiveDate;
use strsim::{jaro_winkler, normalized_levenshtein};

use super::phonetic::{metaphone, soundex};
use super::variants::{expand_name_variants, strip_accents};

/// Country aliases that should score as a near-match (spec: "alias match ⇒
/// 0.9"), keyed by the normalized (accent-stripped, lowercased) form.
const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("usa", "united states"),
    ("us", "united states"),
    ("u.s.a.", "united states"),
    ("uk", "united kingdom"),
    ("mexico", "mexico"),
    ("el salvador", "salvador"),
];

fn normalize_country(s: &str) -> String {
    strip_accents(s).to_ascii_lowercase().trim().to_string()
}

fn alias_of(normalized: &str) -> Option<&'static str> {
    COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| *canonical)
}

/// Max-over-methods name similarity against a single candidate name, after
/// expanding the query into its cultural variants (spec §4.G step 1 "Name").
pub fn name_similarity(first_name: &str, middle_name: Option<&str>, last_name: &str, candidate_full_name: &str) -> f64 {
    let variants = expand_name_variants(first_name, middle_name, last_name);
    let candidate_norm = strip_accents(candidate_full_name).to_ascii_lowercase();
    let candidate_soundex = soundex(candidate_full_name);
    let candidate_metaphone = metaphone(candidate_full_name);

    let mut best = 0.0_f64;
    for variant in &variants {
        let variant_norm = variant.to_ascii_lowercase();

        let levenshtein = normalized_levenshtein(&variant_norm, &candidate_norm);
        best = best.max(levenshtein);

        for (part, cand_part) in variant_norm.split_whitespace().zip(candidate_norm.split_whitespace()) {
            best = best.max(jaro_winkler(part, cand_part));
        }
        best = best.max(jaro_winkler(&variant_norm, &candidate_norm));

        if soundex(variant) == candidate_soundex && !candidate_soundex.is_empty() {
            best = best.max(1.0);
        }
        if metaphone(variant) == candidate_metaphone && !candidate_metaphone.is_empty() {
            best = best.max(1.0);
        }
    }
    best.clamp(0.0, 1.0)
}

/// Date-of-birth similarity: exact match, linear decay within a tolerance
/// window down to 0.5, zero beyond it (spec §4.G step 1 "Date-of-birth").
pub fn dob_similarity(query_dob: NaiveDate, candidate_dob: Option<NaiveDate>, tolerance_days: u32) -> f64 {
    let Some(candidate_dob) = candidate_dob else {
        return 0.0;
    };
    if query_dob == candidate_dob {
        return 1.0;
    }
    if tolerance_days == 0 {
        return 0.0;
    }
    let diff_days = (query_dob - candidate_dob).num_days().unsigned_abs();
    if diff_days > tolerance_days as u64 {
        return 0.0;
    }
    let fraction = diff_days as f64 / tolerance_days as f64;
    (1.0 - fraction * 0.5).clamp(0.5, 1.0)
}

/// Country similarity: exact normalized match, alias match, else zero (spec
/// §4.G step 1 "Country").
pub fn country_similarity(query_country: &str, candidate_country: &str) -> f64 {
    let q = normalize_country(query_country);
    let c = normalize_country(candidate_country);
    if q.is_empty() || c.is_empty() {
        return 0.0;
    }
    if q == c {
        return 1.0;
    }
    let q_canonical = alias_of(&q).unwrap_or(q.as_str());
    let c_canonical = alias_of(&c).unwrap_or(c.as_str());
    if q_canonical == c_canonical {
        return 0.9;
    }
    0.0
}
