use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use vendorsummary::{
    config::{Settings, INGEST_LOG},
    ingest, logging,
    store::Store,
};

fn main() -> Result<()> {
    let settings = Settings::parse();
    let _guard = logging::init_file_logging(&settings.log_dir, INGEST_LOG)?;
    info!(?settings, "startup");

    let store = Store::open(&settings.db_path)?;

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

    store.close()?;
    info!("Database connection closed.");
    Ok(())
}
