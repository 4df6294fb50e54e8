//! Calendar helpers shared by the forecasting code
//!
//! Period labels follow the spreadsheet convention used by the ingestion job:
//! a Spanish three-letter month abbreviation and the year, e.g. `MAR-2025`.

use chrono::{Datelike, Months, NaiveDate};

/// Spanish month abbreviations, January first
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "ENE", "FEB", "MAR", "ABR", "MAY", "JUN", "JUL", "AGO", "SEP", "OCT", "NOV", "DIC",
];

/// Abbreviation for a 1-based month number
pub fn month_abbreviation(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_ABBREVIATIONS[(month - 1) as usize],
        _ => "",
    }
}

/// Parse a month abbreviation (case-insensitive) into a 1-based month number
pub fn month_from_abbreviation(abbr: &str) -> Option<u32> {
    let abbr = abbr.trim();
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(abbr))
        .map(|idx| idx as u32 + 1)
}

/// Label for the calendar month containing `date`
pub fn period_label(date: NaiveDate) -> String {
    format!("{}-{}", month_abbreviation(date.month()), date.year())
}

/// Month number encoded in a history or period label.
///
/// Accepts `ENE_2024`, `ENE-2024`, `ene 2024` and the bare abbreviation.
pub fn month_from_label(label: &str) -> Option<u32> {
    let head = label
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .find(|part| !part.is_empty())?;
    month_from_abbreviation(head)
}

/// First day of the month containing `date`
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month `offset` months after the month containing `date`
pub fn month_start(date: NaiveDate, offset: u32) -> NaiveDate {
    let start = first_of_month(date);
    start.checked_add_months(Months::new(offset)).unwrap_or(start)
}

/// Number of days in the month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    let start = first_of_month(date);
    match start.checked_add_months(Months::new(1)) {
        Some(next) => (next - start).num_days() as u32,
        None => 31,
    }
}
