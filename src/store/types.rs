// src/store/types.rs

use anyhow::{bail, Result};
use arrow::{
    array::{
        Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray,
    },
    datatypes::{DataType, Float64Type, Int64Type},
    util::display::{ArrayFormatter, FormatOptions},
};
use rusqlite::types::Value;
use std::sync::Arc;

/// Declared SQLite column type for an Arrow column.
///
/// - Int64, Boolean → INTEGER
/// - Float64        → REAL
/// - anything else  → TEXT (rendered with Arrow's display formatter)
pub fn sql_type(dt: &DataType) -> &'static str {
    match dt {
        DataType::Int64 | DataType::Boolean => "INTEGER",
        DataType::Float64 => "REAL",
        _ => "TEXT",
    }
}

enum CellKind<'a> {
    Int(&'a Int64Array),
    Float(&'a Float64Array),
    Bool(&'a BooleanArray),
    Text(&'a StringArray),
    Formatted(ArrayFormatter<'a>),
}

/// Reads single cells of one Arrow column as SQLite values.
pub struct CellReader<'a> {
    array: &'a dyn Array,
    kind: CellKind<'a>,
}

impl<'a> CellReader<'a> {
    pub fn new(array: &'a ArrayRef) -> Result<Self> {
        let kind = match array.data_type() {
            DataType::Int64 => CellKind::Int(array.as_primitive::<Int64Type>()),
            DataType::Float64 => CellKind::Float(array.as_primitive::<Float64Type>()),
            DataType::Boolean => CellKind::Bool(array.as_boolean()),
            DataType::Utf8 => CellKind::Text(array.as_string::<i32>()),
            _ => CellKind::Formatted(ArrayFormatter::try_new(
                array.as_ref(),
                &FormatOptions::default(),
            )?),
        };
        Ok(Self {
            array: array.as_ref(),
            kind,
        })
    }

    pub fn value(&self, row: usize) -> Value {
        if self.array.is_null(row) {
            return Value::Null;
        }
        match &self.kind {
            CellKind::Int(a) => Value::Integer(a.value(row)),
            // SQLite turns a NaN binding into NULL
            CellKind::Float(a) => Value::Real(a.value(row)),
            CellKind::Bool(a) => Value::Integer(a.value(row) as i64),
            CellKind::Text(a) => Value::Text(a.value(row).to_string()),
            CellKind::Formatted(f) => Value::Text(f.value(row).to_string()),
        }
    }
}

/// Pick the Arrow type for a column of query results by the storage classes
/// actually present. All-null (or empty) columns come back as Float64.
pub fn infer_column_type(values: &[Value]) -> Result<DataType> {
    let mut saw_int = false;
    let mut saw_real = false;
    let mut saw_text = false;
    for v in values {
        match v {
            Value::Null => {}
            Value::Integer(_) => saw_int = true,
            Value::Real(_) => saw_real = true,
            Value::Text(_) => saw_text = true,
            Value::Blob(_) => bail!("BLOB values are not supported in query results"),
        }
    }
    Ok(if saw_text {
        DataType::Utf8
    } else if saw_real {
        DataType::Float64
    } else if saw_int {
        DataType::Int64
    } else {
        DataType::Float64
    })
}

/// Build an Arrow array of type `dt` (as returned by [`infer_column_type`]).
pub fn values_to_array(values: &[Value], dt: &DataType) -> Result<ArrayRef> {
    let array: ArrayRef = match dt {
        DataType::Int64 => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Int64Array>(),
        ),
        DataType::Float64 => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(*i as f64),
                    Value::Real(f) => Some(*f),
                    _ => None,
                })
                .collect::<Float64Array>(),
        ),
        DataType::Utf8 => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(i.to_string()),
                    Value::Real(f) => Some(f.to_string()),
                    Value::Text(s) => Some(s.clone()),
                    _ => None,
                })
                .collect::<StringArray>(),
        ),
        other => bail!("no SQLite mapping for Arrow type {other:?}"),
    };
    Ok(array)
}
