use anyhow::{bail, Context, Result};
use arrow::{
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder},
    datatypes::{DataType, Field, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use std::{
    fs::File,
    io::{Seek, SeekFrom},
    path::Path,
    sync::Arc,
};
use tracing::debug;

/// Keep Int64 / Float64 / Boolean / Utf8 as inferred; everything else
/// (dates, timestamps, all-empty columns) is read as text so it lands in
/// the store exactly as written in the file.
fn storable_schema(inferred: &Schema) -> Schema {
    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|f| match f.data_type() {
            DataType::Int64 | DataType::Float64 | DataType::Boolean | DataType::Utf8 => {
                f.as_ref().clone()
            }
            _ => Field::new(f.name(), DataType::Utf8, true),
        })
        .collect();
    Schema::new(fields)
}

/// Parse a headed CSV file into a single batch.
pub fn read_csv(path: &Path) -> Result<RecordBatch> {
    let mut file =
        File::open(path).with_context(|| format!("opening {}", path.display()))?;

    // ─── infer schema over every record ─────────────────────────────────
    let (inferred, scanned) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, None)
        .with_context(|| format!("inferring schema of {}", path.display()))?;
    if inferred.fields().is_empty() {
        bail!("{} has no header row", path.display());
    }
    let schema: SchemaRef = Arc::new(storable_schema(&inferred));
    debug!(scanned, schema = ?schema, "inferred schema");

    // ─── full read ──────────────────────────────────────────────────────
    file.seek(SeekFrom::Start(0))?;
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .build(file)
        .with_context(|| format!("building CSV reader for {}", path.display()))?;
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("parsing {}", path.display()))?;

    concat_batches(&schema, &batches).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::Int64Type;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let p = dir.join(name);
        fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn infers_numeric_and_text_columns() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let p = write(
            dir.path(),
            "purchases.csv",
            "VendorNumber,VendorName,Dollars,Flag\n1,ACME ,10.5,true\n2,,3,false\n",
        );
        let batch = read_csv(&p)?;
        assert_eq!(batch.num_rows(), 2);
        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
        assert_eq!(schema.field(3).data_type(), &DataType::Boolean);

        let vendors = batch.column(0).as_primitive::<Int64Type>();
        assert_eq!(vendors.value(1), 2);
        // whitespace is kept as read
        assert_eq!(batch.column(1).as_string::<i32>().value(0), "ACME ");
        assert!(batch.column(1).is_null(1));
        Ok(())
    }

    #[test]
    fn late_type_change_widens_column() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut content = String::from("VendorNumber,Brand,Quantity,Note\n");
        for i in 0..1200 {
            content.push_str(&format!("1,{i},10,{i}\n"));
        }
        content.push_str("1,9999,10.5,late text\n");
        let p = write(dir.path(), "purchases.csv", &content);

        let batch = read_csv(&p)?;
        assert_eq!(batch.num_rows(), 1201);
        let schema = batch.schema();
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
        assert_eq!(schema.field(3).data_type(), &DataType::Utf8);
        assert_eq!(batch.column(3).as_string::<i32>().value(1200), "late text");
        Ok(())
    }

    #[test]
    fn dates_stay_text() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let p = write(
            dir.path(),
            "vendor_invoice.csv",
            "VendorNumber,InvoiceDate,Freight\n1,2024-01-04,3.47\n",
        );
        let batch = read_csv(&p)?;
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Utf8);
        assert_eq!(batch.column(1).as_string::<i32>().value(0), "2024-01-04");
        Ok(())
    }

    #[test]
    fn header_only_file_has_no_rows() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let p = write(dir.path(), "sales.csv", "VendorNo,Brand,SalesQuantity\n");
        let batch = read_csv(&p)?;
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 3);
        Ok(())
    }

    #[test]
    fn ragged_rows_fail() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "broken.csv", "a,b,c\n1,2,3\n4,5\n6,7,8,9\n");
        assert!(read_csv(&p).is_err());
    }

    #[test]
    fn empty_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "empty.csv", "");
        assert!(read_csv(&p).is_err());
    }

    #[test]
    fn missing_file_fails() {
        assert!(read_csv(Path::new("/definitely/not/here.csv")).is_err());
    }
}
