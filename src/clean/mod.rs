use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::model::{RawLayoffRow, WorkingCollection};

pub mod backfill;
pub mod dates;
pub mod dedupe;
pub mod nulls;
pub mod prune;
pub mod text;

/// Pipeline stages in execution order. Strictly linear; a stage failure
/// aborts the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Dedupe,
    NormalizeText,
    ParseDates,
    CanonicalizeNulls,
    BackfillIndustry,
    Prune,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Dedupe => "dedupe",
            Stage::NormalizeText => "normalize_text",
            Stage::ParseDates => "parse_dates",
            Stage::CanonicalizeNulls => "canonicalize_nulls",
            Stage::BackfillIndustry => "backfill_industry",
            Stage::Prune => "prune",
        }
    }
}

/// "1–2 digits / 1–2 digits / 4 digits", read as month/day/year.
static US_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").unwrap());

/// ISO "YYYY-MM-DD".
static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Run parameters. The defaults match the layoffs export: empty cells and a
/// case-insensitive literal "NULL" stand for missing values, and dates come
/// as either M/D/YYYY or YYYY-MM-DD.
#[derive(Debug, Clone)]
pub struct CleanOptions {
    /// Strings treated as null sentinels, compared case-insensitively.
    pub null_sentinels: Vec<String>,
    pub us_date_pattern: Regex,
    pub iso_date_pattern: Regex,
}

impl Default for CleanOptions {
    fn default() -> Self {
        CleanOptions {
            null_sentinels: vec![String::new(), "null".to_string()],
            us_date_pattern: US_DATE.clone(),
            iso_date_pattern: ISO_DATE.clone(),
        }
    }
}

/// Run all seven stages over a fresh working copy of `rows` and return the
/// cleaned collection. The source slice is never mutated.
#[tracing::instrument(level = "info", skip(rows, opts), fields(rows = rows.len()))]
pub fn run(rows: &[RawLayoffRow], opts: &CleanOptions) -> Result<WorkingCollection> {
    let mut col = WorkingCollection::load(rows);
    info!(stage = Stage::Load.name(), records = col.len(), "working copy loaded");

    let removed = dedupe::deduplicate(&mut col);
    info!(
        stage = Stage::Dedupe.name(),
        removed,
        remaining = col.len(),
        "duplicates removed"
    );

    let rewrites = text::normalize(&mut col);
    info!(stage = Stage::NormalizeText.name(), rewrites, "text fields normalized");

    let (parsed, dropped) = dates::parse_dates(&mut col, opts)
        .with_context(|| format!("stage {} failed", Stage::ParseDates.name()))?;
    info!(stage = Stage::ParseDates.name(), parsed, dropped, "event dates converted");

    let nulled = nulls::canonicalize(&mut col, opts);
    info!(stage = Stage::CanonicalizeNulls.name(), rewrites = nulled, "sentinels canonicalized");

    let filled = backfill::backfill_industry(&mut col);
    info!(stage = Stage::BackfillIndustry.name(), filled, "industries backfilled");

    let pruned = prune::prune(&mut col);
    info!(
        stage = Stage::Prune.name(),
        pruned,
        remaining = col.len(),
        "unrecoverable rows pruned"
    );

    Ok(col)
}


#[cfg(test)]
mod tests {
    use super::test_support::{init_test_logging, raw_row};
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn full_run_cleans_the_canonical_scenario() {
        init_test_logging();
        let mut dirty = raw_row(" Meta ");
        dirty.industry = "Crypto/Web3".to_string();
        dirty.country = "USA.".to_string();
        dirty.total_laid_off = "1000".to_string();
        dirty.percentage_laid_off = String::new();
        dirty.date = "11/9/2022".to_string();

        let col = run(&[dirty.clone(), dirty], &CleanOptions::default()).unwrap();
        // the exact duplicate collapses to one record
        assert_eq!(col.len(), 1);

        let rec = &col.records()[0];
        assert_eq!(rec.company.as_deref(), Some("Meta"));
        assert_eq!(rec.industry.as_deref(), Some("Crypto"));
        assert_eq!(rec.country.as_deref(), Some("USA"));
        assert_eq!(rec.total_laid_off.as_deref(), Some("1000"));
        assert_eq!(rec.percentage_laid_off, None);
        assert_eq!(
            rec.event_date.as_date(),
            NaiveDate::from_ymd_opt(2022, 11, 9)
        );

        let cleaned = col.finalize().unwrap();
        assert_eq!(cleaned[0].total_laid_off, Some(1000));
        assert_eq!(cleaned[0].percentage_laid_off, None);
    }

    #[test]
    fn full_run_prunes_rows_missing_both_magnitudes() {
        init_test_logging();
        let mut hollow = raw_row("Ghost Co");
        hollow.total_laid_off = "NULL".to_string();
        hollow.percentage_laid_off = String::new();
        let mut partial = raw_row("Half Co");
        partial.total_laid_off = String::new();
        partial.percentage_laid_off = "0.25".to_string();

        let col = run(&[hollow, partial], &CleanOptions::default()).unwrap();
        assert_eq!(col.len(), 1);
        assert_eq!(col.records()[0].company.as_deref(), Some("Half Co"));
    }

    #[test]
    fn custom_sentinels_are_honored() {
        let mut row = raw_row("Acme");
        row.industry = "n/a".to_string();
        let mut opts = CleanOptions::default();
        opts.null_sentinels.push("n/a".to_string());

        let col = run(&[row], &opts).unwrap();
        assert_eq!(col.records()[0].industry, None);
    }
}
