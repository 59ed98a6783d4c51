//! Search Module
//!
//! Stateless, case-insensitive substring search over records.
//!
//! Every search is a full linear scan: O(records × fields × field length).
//! There is no index.

use crate::record::Record;

/// Textual form of a numeric field, shared by display and search
///
/// Integral values keep one decimal place (`40.0`); everything else uses the
/// shortest representation that round-trips (`59.99`).
pub fn render_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// True if the query is a substring of any field, ignoring case
///
/// Numeric fields are matched against [`render_number`] output.
pub fn matches(record: &Record, query: &str) -> bool {
    let needle = query.to_lowercase();
    matches_lowered(record, &needle)
}

/// Filter entries by [`matches`], preserving input order
pub fn search<'a, I>(entries: I, query: &str) -> Vec<(u64, Record)>
where
    I: IntoIterator<Item = (u64, &'a Record)>,
{
    let needle = query.to_lowercase();
    entries
        .into_iter()
        .filter(|(_, record)| matches_lowered(record, &needle))
        .map(|(id, record)| (id, record.clone()))
        .collect()
}

fn matches_lowered(record: &Record, needle: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(needle);

    contains(&record.name)
        || contains(&record.age_rating)
        || contains(&record.difficulty)
        || contains(&render_number(record.hours_approx))
        || contains(&record.platform)
        || contains(&render_number(record.price))
}
