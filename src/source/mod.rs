use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::{fs::File, io::BufReader, path::Path};
use tracing::debug;

use crate::model::RawLayoffRow;

/// Column order of the raw layoffs export. The header row is required but
/// only its width is checked; the nine columns are a known, fixed layout.
pub const COLUMNS: usize = 9;

/// Read the raw layoffs CSV into memory. The file is the read-only source
/// collaborator: it is opened once, never written, and the returned rows
/// preserve its order. Short records are tolerated (missing trailing cells
/// read as empty), matching how the export behaves.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawLayoffRow>> {
    let file = File::open(&path)
        .with_context(|| format!("failed to open source csv {:?}", path.as_ref()))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = rdr.headers().context("reading source csv header row")?;
    if headers.len() < COLUMNS {
        anyhow::bail!(
            "source csv has {} columns, expected {}",
            headers.len(),
            COLUMNS
        );
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("csv parse error at source record {}", idx))?;
        rows.push(RawLayoffRow {
            company: cell(&record, 0),
            location: cell(&record, 1),
            industry: cell(&record, 2),
            total_laid_off: cell(&record, 3),
            percentage_laid_off: cell(&record, 4),
            date: cell(&record, 5),
            stage: cell(&record, 6),
            country: cell(&record, 7),
            funds_raised_millions: cell(&record, 8),
        });
    }

    debug!(rows = rows.len(), "source rows read");
    Ok(rows)
}

fn cell(record: &StringRecord, i: usize) -> String {
    record.get(i).unwrap_or("").to_string()
}
