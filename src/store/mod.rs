// src/store/mod.rs

pub mod types;

use anyhow::{Context, Result};
use arrow::{
    datatypes::{Field, Schema},
    record_batch::{RecordBatch, RecordBatchOptions},
};
use rusqlite::{params, types::Value, Connection};
use std::{path::Path, sync::Arc};
use tracing::debug;

use types::{infer_column_type, sql_type, values_to_array, CellReader};

/// Quote an identifier for SQLite (`"name"`, embedded quotes doubled).
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A single SQLite connection. Tables are written whole, never appended to.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create DB directory: {}", parent.display()))?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("failed to open DB: {}", db_path.display()))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Drop `name` if it exists and recreate it from `batch`, all in one transaction.
    pub fn replace_table(&self, name: &str, batch: &RecordBatch) -> Result<()> {
        let schema = batch.schema();
        let table = quote_ident(name);
        let column_defs: Vec<String> = schema
            .fields()
            .iter()
            .map(|f| format!("{} {}", quote_ident(f.name()), sql_type(f.data_type())))
            .collect();
        let placeholders = vec!["?"; schema.fields().len()].join(", ");

        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({});",
            column_defs.join(", ")
        ))
        .with_context(|| format!("recreating table {name}"))?;

        {
            let readers = batch
                .columns()
                .iter()
                .map(CellReader::new)
                .collect::<Result<Vec<_>>>()?;
            let mut stmt = tx.prepare(&format!("INSERT INTO {table} VALUES ({placeholders})"))?;
            for row in 0..batch.num_rows() {
                let values: Vec<Value> = readers.iter().map(|r| r.value(row)).collect();
                stmt.execute(rusqlite::params_from_iter(values))
                    .with_context(|| format!("inserting row {row} into {name}"))?;
            }
        }

        tx.commit()
            .with_context(|| format!("committing table {name}"))?;
        debug!(table = name, rows = batch.num_rows(), "replaced table");
        Ok(())
    }

    /// Run `sql` and collect the whole result set into one batch.
    pub fn query_batch(&self, sql: &str) -> Result<RecordBatch> {
        let mut stmt = self.conn.prepare(sql).context("preparing query")?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
        let mut rows = stmt.query([])?;
        let mut num_rows = 0usize;
        while let Some(row) = rows.next()? {
            for (i, col) in columns.iter_mut().enumerate() {
                col.push(row.get::<_, Value>(i)?);
            }
            num_rows += 1;
        }

        let mut fields = Vec::with_capacity(names.len());
        let mut arrays = Vec::with_capacity(names.len());
        for (name, values) in names.iter().zip(&columns) {
            let dt = infer_column_type(values)
                .with_context(|| format!("column {name}"))?;
            arrays.push(values_to_array(values, &dt)?);
            fields.push(Field::new(name, dt, true));
        }

        let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
        RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
            .map_err(Into::into)
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |r| r.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn row_count(&self, name: &str) -> Result<i64> {
        let n = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(name)),
            [],
            |r| r.get(0),
        )?;
        Ok(n)
    }

    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .context("closing database connection")
    }
}
