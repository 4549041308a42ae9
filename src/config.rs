// src/config.rs

use clap::Parser;
use std::path::PathBuf;

/// Log file written by the `ingest_db` binary.
pub const INGEST_LOG: &str = "ingestion_db";
/// Log file written by the `vendor_summary` binary.
pub const SUMMARY_LOG: &str = "get_vendor_summary";
/// Log file written by the combined `vendorsummary` binary.
pub const PIPELINE_LOG: &str = "vendorsummary";

/// Paths shared by every binary. Every flag can also come from the environment.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Settings {
    /// Directory scanned for `*.csv` files
    #[arg(long, env = "VENDOR_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// SQLite database file
    #[arg(long = "db", env = "VENDOR_DB", default_value = "inventory.db")]
    pub db_path: PathBuf,

    /// Directory holding the append-mode log files
    #[arg(long, env = "VENDOR_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,
}
