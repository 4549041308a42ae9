use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use vendorsummary::{
    config::{Settings, PIPELINE_LOG},
    ingest, logging,
    store::Store,
    summary,
};

/// Ingest every CSV, then rebuild the vendor summary, on one connection.
fn main() -> Result<()> {
    let settings = Settings::parse();
    let _guard = logging::init_file_logging(&settings.log_dir, PIPELINE_LOG)?;
    info!(?settings, "startup");

    let store = Store::open(&settings.db_path)?;

    // ─── 1) load raw tables ─────────────────────────────────────────
    match ingest::load_raw_data(&store, &settings.data_dir) {
        Ok(report) => {
            for failed in &report.failed {
                eprintln!("skipped {}: {}", failed.path.display(), failed.error);
            }
            println!(
                "All files ingested in {} minutes ({} tables, {} skipped).",
                report.elapsed_minutes(),
                report.ingested.len(),
                report.failed.len()
            );
        }
        Err(e) => {
            error!("Ingestion failed: {:#}", e);
            eprintln!("Ingestion failed: {:#}", e);
        }
    }

    // ─── 2) summarize ───────────────────────────────────────────────
    match summary::run(&store) {
        Ok(report) => {
            info!(rows = report.rows, cols = report.columns, elapsed = ?report.elapsed, "vendor summary written");
            println!(
                "Wrote {} ({} rows, {} columns).",
                summary::SUMMARY_TABLE,
                report.rows,
                report.columns
            );
        }
        Err(e) => {
            error!("An error occurred: {:#}", e);
            eprintln!("An error occurred: {:#}", e);
        }
    }

    store.close()?;
    info!("Database connection closed.");
    Ok(())
}
