//! Cultural name-variant expansion (spec §4.G "Cultural variants expand the
//! query"): accented/unaccented forms, common nickname/formal pairings, and
//! Hispanic double-surname reordering.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Nickname ↔ formal-name pairs seen often enough in this population (a mix
/// of English and Spanish-language given names) to be worth a fixed table
/// rather than a generative rule. Matching is case-insensitive and
/// bidirectional.
const NICKNAME_PAIRS: &[(&str, &str)] = &[
    ("bob", "robert"),
    ("bobby", "robert"),
    ("bill", "william"),
    ("billy", "william"),
    ("liz", "elizabeth"),
    ("beth", "elizabeth"),
    ("jim", "james"),
    ("jimmy", "james"),
    ("mike", "michael"),
    ("tom", "thomas"),
    ("tommy", "thomas"),
    ("dick", "richard"),
    ("rick", "richard"),
    ("rich", "richard"),
    ("ted", "edward"),
    ("ed", "edward"),
    ("eddie", "edward"),
    ("beto", "alberto"),
    ("pancho", "francisco"),
    ("paco", "francisco"),
    ("chuy", "jesus"),
    ("lupe", "guadalupe"),
    ("memo", "guillermo"),
    ("chabela", "isabel"),
    ("pepe", "jose"),
    ("nacho", "ignacio"),
    ("cheche", "sergio"),
    ("toño", "antonio"),
    ("tony", "antonio"),
];

/// Strips diacritics, preserving the base Latin letters (spec §4.G
/// "language-aware processing... strip diacritics before comparison").
pub fn strip_accents(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

fn normalize(s: &str) -> String {
    strip_accents(s).to_ascii_lowercase().trim().to_string()
}

fn nickname_expansions(given_name: &str) -> Vec<String> {
    let norm = normalize(given_name);
    let mut out = Vec::new();
    for (nick, formal) in NICKNAME_PAIRS {
        if norm == *nick {
            out.push((*formal).to_string());
        } else if norm == *formal {
            out.push((*nick).to_string());
        }
    }
    out
}

/// Builds every full-name variant worth comparing the candidate record
/// against: the literal query, its accent-stripped form, nickname↔formal
/// swaps of the given name, and (for two-part surnames) both orderings of
/// the surname components (spec: "Hispanic double-surname handling: compare
/// both orderings").
pub fn expand_name_variants(first_name: &str, middle_name: Option<&str>, last_name: &str) -> Vec<String> {
    let mut variants = Vec::new();
    let mut given_forms = vec![first_name.to_string()];
    given_forms.extend(nickname_expansions(first_name));

    let surname_parts: Vec<&str> = last_name.split_whitespace().collect();
    let mut surname_orderings = vec![last_name.to_string()];
    if surname_parts.len() == 2 {
        surname_orderings.push(format!("{} {}", surname_parts[1], surname_parts[0]));
    }

    for given in &given_forms {
        for surname in &surname_orderings {
            let mut full = given.clone();
            if let Some(m) = middle_name {
                if !m.trim().is_empty() {
                    full.push(' ');
                    full.push_str(m);
                }
            }
            full.push(' ');
            full.push_str(surname);
            variants.push(full.clone());
            variants.push(strip_accents(&full));
        }
    }

    variants.sort();
    variants.dedup();
    variants
}
