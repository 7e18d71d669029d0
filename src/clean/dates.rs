use anyhow::Result;
use chrono::NaiveDate;

use crate::clean::CleanOptions;
use crate::model::{DateField, WorkingCollection};

/// Convert textual event dates to calendar dates, then flip the column's
/// declared type in one atomic step. Conversions are staged for every record
/// before any is applied, so no record is ever left holding a residual
/// unconverted string when the transition happens. Values matching neither
/// recognized pattern, or failing calendar range validation, become absent;
/// that is policy, not an error. Returns (parsed, dropped) counts.
pub fn parse_dates(col: &mut WorkingCollection, opts: &CleanOptions) -> Result<(usize, usize)> {
    let mut parsed = 0;
    let mut dropped = 0;
    let staged: Vec<DateField> = col
        .records()
        .iter()
        .map(|rec| {
            let converted = convert(&rec.event_date, opts);
            if matches!(rec.event_date, DateField::Text(_)) {
                match converted {
                    DateField::Parsed(_) => parsed += 1,
                    _ => dropped += 1,
                }
            }
            converted
        })
        .collect();

    for (rec, date) in col.records_mut().iter_mut().zip(staged) {
        rec.event_date = date;
    }

    col.transition_date_column()?;
    Ok((parsed, dropped))
}

fn convert(field: &DateField, opts: &CleanOptions) -> DateField {
    match field {
        DateField::Parsed(d) => DateField::Parsed(*d),
        DateField::Absent => DateField::Absent,
        DateField::Text(s) => match parse_text_date(s, opts) {
            Some(d) => DateField::Parsed(d),
            None => DateField::Absent,
        },
    }
}

/// The regexes are a purely syntactic filter; `from_ymd_opt` enforces the
/// calendar ranges, so "13/40/2020" falls through to `None`.
fn parse_text_date(s: &str, opts: &CleanOptions) -> Option<NaiveDate> {
    if opts.us_date_pattern.is_match(s) {
        let mut parts = s.split('/');
        let month: u32 = parts.next()?.parse().ok()?;
        let day: u32 = parts.next()?.parse().ok()?;
        let year: i32 = parts.next()?.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if opts.iso_date_pattern.is_match(s) {
        // patterns are caller-configurable, so never assume the match is
        // long enough to slice
        let year: i32 = s.get(0..4)?.parse().ok()?;
        let month: u32 = s.get(5..7)?.parse().ok()?;
        let day: u32 = s.get(8..10)?.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    None
}
