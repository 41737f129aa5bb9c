//! Result extraction (spec §4.F "Table-row extraction with per-column
//! defensive parsing").

use chrono::NaiveDate;
use scraper::{Html, Selector};

use crate::model::result::Record;

/// Column order the upstream results table is expected to use. Columns
/// beyond this list are ignored, not treated as errors (spec: "unknown
/// extra columns are ignored").
const COLUMNS: &[&str] = &[
    "alien_number",
    "full_name",
    "date_of_birth",
    "country_of_birth",
    "facility_name",
    "facility_location",
    "custody_status",
    "last_updated",
];

fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    for format in ["%m/%d/%Y", "%Y-%m-%d", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    trimmed.to_string()
}

fn cell_text(cell: &scraper::ElementRef) -> String {
    cell.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

/// Extracts every result row from a results page. A row producing zero
/// identifying cells is dropped; partially-populated rows are kept with
/// empty strings in the unknown slots (spec: "empty cells ⇒ empty string,
/// never null sentinels").
pub fn extract_records(html: &str) -> Vec<Record> {
    let document = Html::parse_document(html);
    let Ok(row_selector) = Selector::parse("table tbody tr, table tr") else {
        return Vec::new();
    };
    let Ok(cell_selector) = Selector::parse("td") else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for row in document.select(&row_selector) {
        let cells: Vec<String> = row.select(&cell_selector).map(|c| cell_text(&c)).collect();
        if cells.is_empty() || cells.iter().all(|c| c.is_empty()) {
            continue;
        }

        let mut record = Record::default();
        for (idx, column) in COLUMNS.iter().enumerate() {
            let raw = cells.get(idx).map(|s| s.as_str()).unwrap_or("");
            let value = if *column == "date_of_birth" || *column == "last_updated" {
                normalize_date(raw)
            } else {
                raw.trim().to_string()
            };
            assign_column(&mut record, column, value);
        }
        records.push(record);
    }
    records
}

fn assign_column(record: &mut Record, column: &str, value: String) {
    match column {
        "alien_number" => record.alien_number = value,
        "full_name" => record.full_name = value,
        "date_of_birth" => record.date_of_birth = value,
        "country_of_birth" => record.country_of_birth = value,
        "facility_name" => record.facility_name = value,
        "facility_location" => record.facility_location = value,
        "custody_status" => record.custody_status = value,
        "last_updated" => record.last_updated = value,
        _ => {}
    }
}
