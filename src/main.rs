use anyhow::{bail, Context, Result};
use layoffscrub::{
    clean::{self, CleanOptions},
    report, sink, source,
};
use std::{env, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) parse args ───────────────────────────────────────────────
    let mut args = env::args().skip(1);
    let (input, output) = match (args.next(), args.next()) {
        (Some(i), Some(o)) => (PathBuf::from(i), PathBuf::from(o)),
        _ => bail!("usage: layoffscrub <input.csv> <output.(csv|parquet)>"),
    };

    // ─── 3) read the raw source ──────────────────────────────────────
    let rows = source::read_csv(&input)
        .with_context(|| format!("source unavailable: {}", input.display()))?;
    info!(rows = rows.len(), "raw rows loaded");

    // ─── 4) run the pipeline ─────────────────────────────────────────
    let cleaned = clean::run(&rows, &CleanOptions::default())?;
    let summary = report::summarize(&cleaned);

    // ─── 5) write the cleaned dataset ────────────────────────────────
    let records = cleaned.finalize()?;
    match output.extension().and_then(|e| e.to_str()) {
        Some("parquet") => sink::write_parquet(&output, &records)
            .with_context(|| format!("sink unavailable: {}", output.display()))?,
        _ => sink::write_csv(&output, &records)
            .with_context(|| format!("sink unavailable: {}", output.display()))?,
    }
    info!(records = records.len(), out = %output.display(), "cleaned dataset written");

    // ─── 6) print the verification summary ──────────────────────────
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
