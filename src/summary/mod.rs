// src/summary/mod.rs
pub mod clean;
pub mod query;

use anyhow::{bail, Context, Result};
use arrow::{record_batch::RecordBatch, util::pretty::pretty_format_batches};
use std::time::{Duration, Instant};
use tracing::info;

use crate::store::Store;
pub use clean::clean_data;
pub use query::{SOURCE_TABLES, SUMMARY_TABLE, VENDOR_SUMMARY_QUERY};

/// Rows shown in the log preview.
const PREVIEW_ROWS: usize = 5;

#[derive(Debug)]
pub struct SummaryReport {
    pub rows: usize,
    pub columns: usize,
    pub elapsed: Duration,
}

/// First `n` rows rendered as an ASCII table.
pub fn preview(batch: &RecordBatch, n: usize) -> Result<String> {
    let head = batch.slice(0, n.min(batch.num_rows()));
    Ok(pretty_format_batches(&[head])?.to_string())
}

/// Run the aggregation query as-is (nulls from the left joins still present).
pub fn create_vendor_summary(store: &Store) -> Result<RecordBatch> {
    for t in SOURCE_TABLES {
        if !store.table_exists(t)? {
            bail!("source table '{}' not found; run ingestion first", t);
        }
    }
    store
        .query_batch(VENDOR_SUMMARY_QUERY)
        .context("running vendor summary query")
}

/// Query and clean, without persisting.
pub fn build_vendor_summary(store: &Store) -> Result<RecordBatch> {
    info!("Creating Vendor Summary Table...");
    let summary = create_vendor_summary(store)?;
    info!(rows = summary.num_rows(), "Vendor summary created.");
    info!("\n{}", preview(&summary, PREVIEW_ROWS)?);

    info!("Cleaning Data...");
    let cleaned = clean_data(&summary).context("cleaning vendor summary")?;
    info!("Data cleaned.");
    info!("\n{}", preview(&cleaned, PREVIEW_ROWS)?);
    Ok(cleaned)
}

/// Build the summary and replace `vendor_sales_summary` with it.
pub fn run(store: &Store) -> Result<SummaryReport> {
    let start = Instant::now();
    let cleaned = build_vendor_summary(store)?;

    info!("Ingesting Data into DB...");
    store
        .replace_table(SUMMARY_TABLE, &cleaned)
        .with_context(|| format!("writing table '{}'", SUMMARY_TABLE))?;
    info!(table = SUMMARY_TABLE, "Ingestion complete.");

    Ok(SummaryReport {
        rows: cleaned.num_rows(),
        columns: cleaned.num_columns(),
        elapsed: start.elapsed(),
    })
}
