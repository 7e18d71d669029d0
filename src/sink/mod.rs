use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Date32Builder, Float64Builder, Int64Builder, StringBuilder},
    datatypes::{DataType, Field, Schema as ArrowSchema},
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::info;

use crate::model::CleanedRecord;

const HEADER: [&str; 9] = [
    "company",
    "location",
    "industry",
    "total_laid_off",
    "percentage_laid_off",
    "date",
    "stage",
    "country",
    "funds_raised_millions",
];

/// Write the cleaned records as CSV, replacing `path` if it exists. The
/// file is written to a `.tmp` sibling and renamed into place, so a failed
/// run never leaves a partial destination visible.
#[tracing::instrument(level = "info", skip(path, records), fields(path = %path.as_ref().display()))]
pub fn write_csv<P: AsRef<Path>>(path: P, records: &[CleanedRecord]) -> Result<()> {
    let path = path.as_ref();
    let tmp = tmp_path(path);

    {
        let file = File::create(&tmp)
            .with_context(|| format!("could not create temporary file `{}`", tmp.display()))?;
        let mut wtr = csv::Writer::from_writer(BufWriter::new(file));
        wtr.write_record(HEADER).context("writing csv header")?;
        for rec in records {
            let total = opt_cell(rec.total_laid_off);
            let percentage = opt_cell(rec.percentage_laid_off);
            let date = rec.event_date.map(|d| d.to_string()).unwrap_or_default();
            let funds = opt_cell(rec.funds_raised_millions);
            wtr.write_record([
                rec.company.as_deref().unwrap_or(""),
                rec.location.as_deref().unwrap_or(""),
                rec.industry.as_deref().unwrap_or(""),
                total.as_str(),
                percentage.as_str(),
                date.as_str(),
                rec.stage.as_deref().unwrap_or(""),
                rec.country.as_deref().unwrap_or(""),
                funds.as_str(),
            ])
            .context("writing csv record")?;
        }
        wtr.flush().context("flushing csv writer")?;
    }

    fs::rename(&tmp, path)
        .with_context(|| format!("renaming `{}` to `{}`", tmp.display(), path.display()))?;
    info!(records = records.len(), "cleaned csv written");
    Ok(())
}

/// Write the cleaned records as Parquet with a typed schema (Int64 counts,
/// Float64 ratios, Date32 event dates). Same tmp-then-rename discipline as
/// the CSV sink.
#[tracing::instrument(level = "info", skip(path, records), fields(path = %path.as_ref().display()))]
pub fn write_parquet<P: AsRef<Path>>(path: P, records: &[CleanedRecord]) -> Result<()> {
    let path = path.as_ref();
    let tmp = tmp_path(path);

    let schema = Arc::new(cleaned_schema());
    let batch = build_batch(schema.clone(), records)?;

    let file = File::create(&tmp)
        .with_context(|| format!("could not create temporary file `{}`", tmp.display()))?;
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), schema, None)
        .context("creating ArrowWriter for cleaned parquet")?;
    writer
        .write(&batch)
        .context("writing batch to cleaned parquet")?;
    writer
        .close()
        .context("closing ArrowWriter for cleaned parquet")?;

    fs::rename(&tmp, path)
        .with_context(|| format!("renaming `{}` to `{}`", tmp.display(), path.display()))?;
    info!(records = records.len(), "cleaned parquet written");
    Ok(())
}

pub fn cleaned_schema() -> ArrowSchema {
    ArrowSchema::new(vec![
        Field::new("company", DataType::Utf8, true),
        Field::new("location", DataType::Utf8, true),
        Field::new("industry", DataType::Utf8, true),
        Field::new("total_laid_off", DataType::Int64, true),
        Field::new("percentage_laid_off", DataType::Float64, true),
        Field::new("date", DataType::Date32, true),
        Field::new("stage", DataType::Utf8, true),
        Field::new("country", DataType::Utf8, true),
        Field::new("funds_raised_millions", DataType::Float64, true),
    ])
}

fn build_batch(schema: Arc<ArrowSchema>, records: &[CleanedRecord]) -> Result<RecordBatch> {
    let mut company = StringBuilder::new();
    let mut location = StringBuilder::new();
    let mut industry = StringBuilder::new();
    let mut total = Int64Builder::new();
    let mut percentage = Float64Builder::new();
    let mut date = Date32Builder::new();
    let mut stage = StringBuilder::new();
    let mut country = StringBuilder::new();
    let mut funds = Float64Builder::new();

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    for rec in records {
        company.append_option(rec.company.as_deref());
        location.append_option(rec.location.as_deref());
        industry.append_option(rec.industry.as_deref());
        total.append_option(rec.total_laid_off);
        percentage.append_option(rec.percentage_laid_off);
        date.append_option(rec.event_date.map(|d| (d - epoch).num_days() as i32));
        stage.append_option(rec.stage.as_deref());
        country.append_option(rec.country.as_deref());
        funds.append_option(rec.funds_raised_millions);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(company.finish()),
        Arc::new(location.finish()),
        Arc::new(industry.finish()),
        Arc::new(total.finish()),
        Arc::new(percentage.finish()),
        Arc::new(date.finish()),
        Arc::new(stage.finish()),
        Arc::new(country.finish()),
        Arc::new(funds.finish()),
    ];

    RecordBatch::try_new(schema, columns).context("building cleaned RecordBatch")
}

fn opt_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
