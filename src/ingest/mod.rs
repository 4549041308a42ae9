// src/ingest/mod.rs
pub mod csv;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use glob::{glob, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing::{error, info};

use crate::store::Store;

/// One file that made it into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedTable {
    pub table: String,
    pub rows: usize,
    pub columns: usize,
}

/// One file that was skipped, with the reason.
#[derive(Debug, Clone)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug)]
pub struct IngestReport {
    pub started_at: DateTime<Utc>,
    pub ingested: Vec<IngestedTable>,
    pub failed: Vec<FailedFile>,
    pub elapsed: Duration,
}

impl IngestReport {
    /// Wall time in minutes, rounded to two decimals.
    pub fn elapsed_minutes(&self) -> f64 {
        (self.elapsed.as_secs_f64() / 60.0 * 100.0).round() / 100.0
    }
}

/// All `*.csv` files directly inside `dir`, sorted by path.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("data directory {} not found", dir.display());
    }
    let pattern = format!("{}/*.csv", Pattern::escape(&dir.display().to_string()));
    let mut files: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// `data/purchase_prices.csv` → `purchase_prices`
pub fn table_name_for(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("cannot derive a table name from {}", path.display()))
}

/// Parse one CSV and replace the table named after it.
#[tracing::instrument(level = "info", skip(store, path), fields(path = %path.display()))]
pub fn ingest_file(store: &Store, path: &Path) -> Result<IngestedTable> {
    let table = table_name_for(path)?;
    let batch = csv::read_csv(path)?;
    info!(table = %table, rows = batch.num_rows(), cols = batch.num_columns(), "Ingesting into table");
    store
        .replace_table(&table, &batch)
        .with_context(|| format!("writing table '{}'", table))?;
    info!(table = %table, "Ingested table with shape ({}, {})", batch.num_rows(), batch.num_columns());
    Ok(IngestedTable {
        table,
        rows: batch.num_rows(),
        columns: batch.num_columns(),
    })
}

/// Ingest every CSV in `data_dir`. A bad file is logged and skipped; only a
/// missing or unreadable directory fails the whole run.
pub fn load_raw_data(store: &Store, data_dir: &Path) -> Result<IngestReport> {
    let started_at = Utc::now();
    let start = Instant::now();
    info!(dir = %data_dir.display(), started_at = %started_at.to_rfc3339(), "Ingestion started");

    let files = discover_csv_files(data_dir)?;
    info!("{} CSV files found", files.len());

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("Ingesting CSVs {bar:30} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut ingested = Vec::with_capacity(files.len());
    let mut failed = Vec::new();
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        bar.set_message(name.clone());
        match ingest_file(store, &path) {
            Ok(t) => {
                bar.println(format!("{}: ({}, {})", t.table, t.rows, t.columns));
                ingested.push(t);
            }
            Err(e) => {
                error!("Failed to ingest {}: {:#}", name, e);
                bar.println(format!("Error importing '{}': {:#}", name, e));
                failed.push(FailedFile {
                    path,
                    error: format!("{:#}", e),
                });
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let report = IngestReport {
        started_at,
        ingested,
        failed,
        elapsed: start.elapsed(),
    };
    info!(
        ok = report.ingested.len(),
        failed = report.failed.len(),
        "Ingestion Complete"
    );
    info!("Total Time Taken: {} minutes", report.elapsed_minutes());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,vendorsummary=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn seed(dir: &Path) -> Result<()> {
        fs::write(
            dir.join("purchases.csv"),
            "VendorNumber,Brand,Quantity\n1,58,10\n2,60,4\n",
        )?;
        fs::write(dir.join("sales.csv"), "VendorNo,Brand,SalesQuantity\n1,58,3\n")?;
        fs::write(dir.join("notes.txt"), "not a table")?;
        Ok(())
    }

    #[test]
    fn table_names_come_from_stems() -> Result<()> {
        assert_eq!(table_name_for(Path::new("data/purchase_prices.csv"))?, "purchase_prices");
        assert_eq!(table_name_for(Path::new("sales.csv"))?, "sales");
        assert!(table_name_for(Path::new("/")).is_err());
        Ok(())
    }

    #[test]
    fn discovery_only_sees_csv() -> Result<()> {
        let dir = tempfile::tempdir()?;
        seed(dir.path())?;
        let files = discover_csv_files(dir.path())?;
        let names: Vec<String> = files
            .iter()
            .map(|p| table_name_for(p).unwrap())
            .collect();
        assert_eq!(names, vec!["purchases", "sales"]);
        Ok(())
    }

    #[test]
    fn discovery_handles_glob_characters_in_dir() -> Result<()> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("in[1]*?");
        fs::create_dir(&dir)?;
        seed(&dir)?;
        // would match the bracket class if the dir were not escaped
        fs::create_dir(root.path().join("in1x"))?;
        fs::write(root.path().join("in1x").join("other.csv"), "a\n1\n")?;

        let files = discover_csv_files(&dir)?;
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.starts_with(&dir)));
        Ok(())
    }

    #[test]
    fn report_records_start_time() -> Result<()> {
        let dir = tempfile::tempdir()?;
        seed(dir.path())?;
        let store = Store::open_in_memory()?;
        let before = Utc::now();
        let report = load_raw_data(&store, dir.path())?;
        assert!(report.started_at >= before);
        assert!(report.started_at <= Utc::now());
        Ok(())
    }

    #[test]
    fn missing_directory_fails_run() -> Result<()> {
        let store = Store::open_in_memory()?;
        assert!(load_raw_data(&store, Path::new("/no/such/data/dir")).is_err());
        Ok(())
    }

    #[test]
    fn malformed_file_is_skipped() -> Result<()> {
        init_test_logging();
        let dir = tempfile::tempdir()?;
        seed(dir.path())?;
        fs::write(dir.path().join("broken.csv"), "a,b\n1,2,3,4\n5\n")?;

        let store = Store::open_in_memory()?;
        let report = load_raw_data(&store, dir.path())?;

        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].path.ends_with("broken.csv"));
        assert_eq!(report.ingested.len(), 2);
        assert!(store.table_exists("purchases")?);
        assert!(store.table_exists("sales")?);
        assert!(!store.table_exists("broken")?);
        assert!(!store.table_exists("notes")?);
        Ok(())
    }

    #[test]
    fn ingest_twice_gives_identical_tables() -> Result<()> {
        init_test_logging();
        let dir = tempfile::tempdir()?;
        seed(dir.path())?;
        let store = Store::open_in_memory()?;

        let first = load_raw_data(&store, dir.path())?;
        let before = store.query_batch("SELECT * FROM purchases")?;
        let second = load_raw_data(&store, dir.path())?;
        let after = store.query_batch("SELECT * FROM purchases")?;

        assert_eq!(first.ingested, second.ingested);
        assert_eq!(store.row_count("purchases")?, 2);
        assert_eq!(before, after);
        Ok(())
    }

    #[test]
    fn minutes_are_rounded() {
        let report = IngestReport {
            started_at: Utc::now(),
            ingested: vec![],
            failed: vec![],
            elapsed: Duration::from_secs(100),
        };
        assert_eq!(report.elapsed_minutes(), 1.67);
    }
}
