use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use vendorsummary::{
    config::{Settings, SUMMARY_LOG},
    logging,
    store::Store,
    summary,
};

fn main() -> Result<()> {
    let settings = Settings::parse();
    let _guard = logging::init_file_logging(&settings.log_dir, SUMMARY_LOG)?;
    info!(db = %settings.db_path.display(), "startup");

    let store = Store::open(&settings.db_path)?;

    // errors are logged, never raised; the connection is closed either way
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
