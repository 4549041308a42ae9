use anyhow::{anyhow, bail, Context, Result};
use arrow::{
    array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray},
    compute::{cast, cast_with_options, kernels::arity::binary, CastOptions},
    datatypes::{DataType, Field, FieldRef, Float64Type, Int64Type, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

pub const VOLUME: &str = "Volume";
pub const TRIM_COLUMNS: [&str; 2] = ["VendorName", "Description"];

fn column_index(batch: &RecordBatch, name: &str) -> Result<usize> {
    batch
        .schema()
        .index_of(name)
        .map_err(|_| anyhow!("column `{}` missing from vendor summary", name))
}

fn replace_column(batch: &RecordBatch, idx: usize, array: ArrayRef) -> Result<RecordBatch> {
    let mut fields: Vec<FieldRef> = batch.schema().fields().iter().cloned().collect();
    let mut columns = batch.columns().to_vec();
    fields[idx] = Arc::new(Field::new(
        fields[idx].name(),
        array.data_type().clone(),
        true,
    ));
    columns[idx] = array;
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(Into::into)
}

fn trim_strings(arr: &StringArray) -> StringArray {
    arr.iter().map(|opt| opt.map(str::trim)).collect()
}

/// Strict cast of `Volume` to Float64: text that does not parse as a number
/// is an error, not a null.
pub fn cast_volume(batch: &RecordBatch) -> Result<RecordBatch> {
    let idx = column_index(batch, VOLUME)?;
    let mut source = batch.column(idx).clone();
    if let Some(s) = source.as_any().downcast_ref::<StringArray>() {
        source = Arc::new(trim_strings(s));
    }
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    let volume = cast_with_options(&source, &DataType::Float64, &options)
        .context("casting Volume to float")?;
    replace_column(batch, idx, volume)
}

/// Replace every null: numbers with 0, text with "0", booleans with false.
pub fn fill_nulls(batch: &RecordBatch) -> Result<RecordBatch> {
    let mut cols = Vec::with_capacity(batch.num_columns());
    for (arr, field) in batch.columns().iter().zip(batch.schema().fields()) {
        if arr.null_count() == 0 {
            cols.push(arr.clone());
            continue;
        }
        let filled: ArrayRef = match arr.data_type() {
            DataType::Int64 => Arc::new(Int64Array::from_iter_values(
                arr.as_primitive::<Int64Type>().iter().map(|v| v.unwrap_or(0)),
            )),
            DataType::Float64 => Arc::new(Float64Array::from_iter_values(
                arr.as_primitive::<Float64Type>()
                    .iter()
                    .map(|v| v.unwrap_or(0.0)),
            )),
            DataType::Utf8 => Arc::new(StringArray::from_iter_values(
                arr.as_string::<i32>().iter().map(|v| v.unwrap_or("0")),
            )),
            DataType::Boolean => Arc::new(
                arr.as_boolean()
                    .iter()
                    .map(|v| Some(v.unwrap_or(false)))
                    .collect::<BooleanArray>(),
            ),
            other => bail!("cannot zero-fill column `{}` of type {other:?}", field.name()),
        };
        cols.push(filled);
    }
    RecordBatch::try_new(batch.schema(), cols).map_err(Into::into)
}

/// Strip leading/trailing whitespace from the named text columns.
/// Non-text columns with those names are left alone.
pub fn trim_text_columns(batch: &RecordBatch, trim_columns: &[&str]) -> Result<RecordBatch> {
    if trim_columns.is_empty() {
        return Ok(batch.clone());
    }

    let cols: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .zip(batch.schema().fields())
        .map(|(arr, field)| {
            match arr.as_any().downcast_ref::<StringArray>() {
                Some(s) if trim_columns.contains(&field.name().as_str()) => {
                    Arc::new(trim_strings(s)) as ArrayRef
                }
                _ => arr.clone(),
            }
        })
        .collect();
    RecordBatch::try_new(batch.schema(), cols).map_err(Into::into)
}

fn float_column(batch: &RecordBatch, name: &str) -> Result<Float64Array> {
    let idx = column_index(batch, name)?;
    let casted = cast(batch.column(idx), &DataType::Float64)
        .with_context(|| format!("reading `{}` as float", name))?;
    Ok(casted.as_primitive::<Float64Type>().clone())
}

/// Append GrossProfit, ProfitMargin, StockTurnover and SalesToPurchaseRatio.
///
/// Plain IEEE arithmetic: a zero denominator gives inf or NaN, never an error.
pub fn add_derived_metrics(batch: &RecordBatch) -> Result<RecordBatch> {
    let sales_dollars = float_column(batch, "TotalSalesDollars")?;
    let purchase_dollars = float_column(batch, "TotalPurchaseDollars")?;
    let sales_qty = float_column(batch, "TotalSalesQuantity")?;
    let purchase_qty = float_column(batch, "TotalPurchaseQuantity")?;

    let gross_profit: Float64Array = binary(&sales_dollars, &purchase_dollars, |s, p| s - p)?;
    let profit_margin: Float64Array =
        binary(&gross_profit, &sales_dollars, |g, s| g / s * 100.0)?;
    let stock_turnover: Float64Array = binary(&sales_qty, &purchase_qty, |s, p| s / p)?;
    let sales_to_purchase: Float64Array =
        binary(&sales_dollars, &purchase_dollars, |s, p| s / p)?;

    let derived: [(&str, Float64Array); 4] = [
        ("GrossProfit", gross_profit),
        ("ProfitMargin", profit_margin),
        ("StockTurnover", stock_turnover),
        ("SalesToPurchaseRatio", sales_to_purchase),
    ];

    let mut fields: Vec<FieldRef> = batch.schema().fields().iter().cloned().collect();
    let mut columns = batch.columns().to_vec();
    for (name, arr) in derived {
        fields.push(Arc::new(Field::new(name, DataType::Float64, true)));
        columns.push(Arc::new(arr));
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(Into::into)
}

/// Volume → float, nulls → zero, trim names, then add the derived metrics.
pub fn clean_data(batch: &RecordBatch) -> Result<RecordBatch> {
    let batch = cast_volume(batch)?;
    let batch = fill_nulls(&batch)?;
    let batch = trim_text_columns(&batch, &TRIM_COLUMNS)?;
    add_derived_metrics(&batch)
}
