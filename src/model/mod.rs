use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::warn;

/// Synthetic per-record identifier used only for targeted removal.
/// Assigned once at load time, stable for the life of the record, and never
/// reused within a collection after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowHandle(u64);

impl RowHandle {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A row exactly as the source provides it: nine text cells in the column
/// order of the layoffs export. Sentinel strings ("" and "NULL" variants)
/// are preserved verbatim; nothing is interpreted at this layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLayoffRow {
    pub company: String,
    pub location: String,
    pub industry: String,
    pub total_laid_off: String,
    pub percentage_laid_off: String,
    pub date: String,
    pub stage: String,
    pub country: String,
    pub funds_raised_millions: String,
}

/// The `event_date` column before and after the collection-wide type
/// transition: textual until the date-parsing stage, then either a calendar
/// date or absent.
#[derive(Debug, Clone, PartialEq)]
pub enum DateField {
    Text(String),
    Parsed(NaiveDate),
    Absent,
}

impl DateField {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DateField::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DateField::Parsed(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, DateField::Absent)
    }

    /// Canonical textual form used when the field participates in the
    /// natural key.
    fn key_form(&self) -> Option<String> {
        match self {
            DateField::Text(s) => Some(s.clone()),
            DateField::Parsed(d) => Some(d.to_string()),
            DateField::Absent => None,
        }
    }
}

/// Declared type of the `event_date` column for the collection as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateColumn {
    Text,
    Date,
}

/// One layoff event as it moves through the pipeline. Nullable fields stay
/// `Option<String>` until null canonicalization so that sentinel strings
/// remain distinguishable from true absence during deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoffRecord {
    handle: RowHandle,
    pub company: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub total_laid_off: Option<String>,
    pub percentage_laid_off: Option<String>,
    pub event_date: DateField,
    pub stage: Option<String>,
    pub country: Option<String>,
    pub funds_raised_millions: Option<String>,
}

/// The nine-attribute tuple used to detect duplicate layoff events. Two
/// absent values in the same position compare equal; absent never equals a
/// present value, so a literal "" and a true absence group separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    company: Option<String>,
    location: Option<String>,
    industry: Option<String>,
    total_laid_off: Option<String>,
    percentage_laid_off: Option<String>,
    event_date: Option<String>,
    stage: Option<String>,
    country: Option<String>,
    funds_raised_millions: Option<String>,
}

impl LayoffRecord {
    pub fn handle(&self) -> RowHandle {
        self.handle
    }

    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            company: self.company.clone(),
            location: self.location.clone(),
            industry: self.industry.clone(),
            total_laid_off: self.total_laid_off.clone(),
            percentage_laid_off: self.percentage_laid_off.clone(),
            event_date: self.event_date.key_form(),
            stage: self.stage.clone(),
            country: self.country.clone(),
            funds_raised_millions: self.funds_raised_millions.clone(),
        }
    }
}

/// Fully-typed record handed to the output sink once the pipeline has run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CleanedRecord {
    pub company: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub total_laid_off: Option<i64>,
    pub percentage_laid_off: Option<f64>,
    pub event_date: Option<NaiveDate>,
    pub stage: Option<String>,
    pub country: Option<String>,
    pub funds_raised_millions: Option<f64>,
}

/// The mutable copy of records a pipeline run operates on. Built once from
/// the read-only source (copy-on-load, never aliasing it), mutated in place
/// by the stages, destroyed when the cleaned result is materialized.
#[derive(Debug)]
pub struct WorkingCollection {
    records: Vec<LayoffRecord>,
    next_handle: u64,
    date_column: DateColumn,
}

impl WorkingCollection {
    /// Copy every source row into a fresh record, preserving relative order
    /// and assigning each a new row handle.
    pub fn load(rows: &[RawLayoffRow]) -> Self {
        let mut col = WorkingCollection {
            records: Vec::with_capacity(rows.len()),
            next_handle: 0,
            date_column: DateColumn::Text,
        };
        for row in rows {
            let handle = RowHandle(col.next_handle);
            col.next_handle += 1;
            col.records.push(LayoffRecord {
                handle,
                company: Some(row.company.clone()),
                location: Some(row.location.clone()),
                industry: Some(row.industry.clone()),
                total_laid_off: Some(row.total_laid_off.clone()),
                percentage_laid_off: Some(row.percentage_laid_off.clone()),
                event_date: DateField::Text(row.date.clone()),
                stage: Some(row.stage.clone()),
                country: Some(row.country.clone()),
                funds_raised_millions: Some(row.funds_raised_millions.clone()),
            });
        }
        col
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LayoffRecord] {
        &self.records
    }

    /// Stages rewrite fields in place through this; records are never added
    /// mid-run, only removed via [`remove_handles`](Self::remove_handles).
    pub fn records_mut(&mut self) -> &mut [LayoffRecord] {
        &mut self.records
    }

    pub fn date_column(&self) -> DateColumn {
        self.date_column
    }

    /// Remove every record whose handle is in `doomed`, returning how many
    /// were dropped. Handles of removed records are never handed out again
    /// because the counter only moves forward.
    pub fn remove_handles(&mut self, doomed: &HashSet<RowHandle>) -> usize {
        let before = self.records.len();
        self.records.retain(|r| !doomed.contains(&r.handle));
        before - self.records.len()
    }

    /// Flip the declared type of `event_date` from text to date for the
    /// collection as a whole. Fails if any record still holds an
    /// unconverted textual value, so the transition is all-or-nothing.
    pub fn transition_date_column(&mut self) -> Result<()> {
        if let Some(rec) = self
            .records
            .iter()
            .find(|r| matches!(r.event_date, DateField::Text(_)))
        {
            anyhow::bail!(
                "date column transition failed: record {} still holds an unconverted text value",
                rec.handle.value()
            );
        }
        self.date_column = DateColumn::Date;
        Ok(())
    }

    /// Materialize the typed output records, consuming the collection.
    /// Numeric text that does not parse resolves to absent, the same policy
    /// the date stage applies to malformed input. A record whose magnitude
    /// fields both end up absent this way is dropped, so the output keeps
    /// the guarantee pruning established: every emitted record carries at
    /// least one of `total_laid_off` or `percentage_laid_off`.
    pub fn finalize(self) -> Result<Vec<CleanedRecord>> {
        if self.date_column != DateColumn::Date {
            anyhow::bail!("cannot finalize: event_date column has not been converted to dates");
        }
        let mut out = Vec::with_capacity(self.records.len());
        for rec in self.records {
            let handle = rec.handle;
            let cleaned = CleanedRecord {
                event_date: rec.event_date.as_date(),
                total_laid_off: parse_number(rec.total_laid_off, handle, "total_laid_off"),
                percentage_laid_off: parse_number(
                    rec.percentage_laid_off,
                    handle,
                    "percentage_laid_off",
                ),
                funds_raised_millions: parse_number(
                    rec.funds_raised_millions,
                    handle,
                    "funds_raised_millions",
                ),
                company: rec.company,
                location: rec.location,
                industry: rec.industry,
                stage: rec.stage,
                country: rec.country,
            };
            if cleaned.total_laid_off.is_none() && cleaned.percentage_laid_off.is_none() {
                warn!(
                    record = handle.value(),
                    "record lost both magnitude values at materialization, dropped"
                );
                continue;
            }
            out.push(cleaned);
        }
        Ok(out)
    }
}

fn parse_number<T: std::str::FromStr>(
    value: Option<String>,
    handle: RowHandle,
    column: &str,
) -> Option<T> {
    let raw = value?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(
                record = handle.value(),
                column,
                raw = %raw,
                "unparsable numeric value dropped"
            );
            None
        }
    }
}
