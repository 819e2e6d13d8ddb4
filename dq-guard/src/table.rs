//! In-memory tabular data inspected by the checks.
//!
//! A [`Table`] is an ordered list of rows over a fixed, ordered set of named
//! columns. Tables are produced by the providers (usually from Arrow record
//! batches) and are never mutated by a check.

use crate::error::{ProviderError, Result, SchemaError};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Date32Type, Date64Type, Decimal128Type, Float16Type,
    Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, Schema, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single scalar cell value.
///
/// Equality is numeric-aware: `Int(1) == Float(1.0)`, and `NaN` equals `NaN`
/// so that rows containing NaN can still be matched against each other.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

// i64::MIN as f64 is exact; i64::MAX as f64 rounds up to 2^63.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Returns the float as an `i64` when it holds an integral value in range.
fn integral(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && (I64_LOWER..I64_UPPER).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

impl Value {
    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for `Null` and for floating point `NaN`.
    ///
    /// Missing numeric data frequently arrives as `NaN` from columnar files.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// A short name for the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Converts a scalar JSON value. Arrays and objects yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float)),
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => {
                integral(*f) == Some(*i)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => 0u8.hash(state),
            Value::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            Value::Int(i) => {
                2u8.hash(state);
                i.hash(state);
            }
            Value::Float(f) => match integral(*f) {
                // Must hash like the equal Int.
                Some(i) => {
                    2u8.hash(state);
                    i.hash(state);
                }
                None if f.is_nan() => 3u8.hash(state),
                None => {
                    4u8.hash(state);
                    f.to_bits().hash(state);
                }
            },
            Value::String(s) => {
                5u8.hash(state);
                s.hash(state);
            }
            Value::Date(d) => {
                6u8.hash(state);
                d.hash(state);
            }
            Value::Timestamp(t) => {
                7u8.hash(state);
                t.hash(state);
            }
        }
    }
}

impl PartialOrd for Value {
    /// Orders values within a comparable family. Values from different
    /// families (e.g. a string and a number) are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) if a.is_nan() && b.is_nan() => {
                Some(Ordering::Equal)
            }
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(i), Value::Float(f)) => match integral(*f) {
                Some(j) => i.partial_cmp(&j),
                None => (*i as f64).partial_cmp(f),
            },
            (Value::Float(f), Value::Int(i)) => match integral(*f) {
                Some(j) => j.partial_cmp(i),
                None => f.partial_cmp(&(*i as f64)),
            },
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "'{s}'"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Timestamp(t) => write!(f, "{t}"),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = serde_json::Value::deserialize(deserializer)?;
        Value::from_json(&json)
            .ok_or_else(|| serde::de::Error::custom("expected a scalar value"))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A borrowed view of one row, addressable by column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// Returns the value in the named column.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Returns the row's values in column order.
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Iterates `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// An ordered sequence of rows sharing one ordered column set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates a table, validating that column names are unique and that every
    /// row has one value per column.
    pub fn new<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Value>>,
    ) -> std::result::Result<Self, SchemaError> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();

        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(SchemaError::InvalidTable(format!(
                    "duplicate column name '{column}'"
                )));
            }
        }

        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(SchemaError::InvalidTable(format!(
                "row {index} has {} values but the table has {} columns",
                row.len(),
                columns.len()
            )));
        }

        Ok(Self { columns, rows })
    }

    /// Creates an empty table with the given columns.
    pub fn empty<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
    ) -> std::result::Result<Self, SchemaError> {
        Self::new(columns, Vec::new())
    }

    /// Starts building a table with the given columns.
    pub fn builder<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> TableBuilder {
        TableBuilder {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw row values in row order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Returns a view of the row at `index`.
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// Iterates over row views.
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// Returns true when the table has the named column.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Position of the named column.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Position of the named column, or a [`SchemaError::ColumnNotFound`].
    pub fn require_column(&self, column: &str) -> std::result::Result<usize, SchemaError> {
        self.column_index(column)
            .ok_or_else(|| SchemaError::column_not_found(column))
    }

    /// Iterates the values of one column in row order.
    pub fn column_values(
        &self,
        column: &str,
    ) -> std::result::Result<impl Iterator<Item = &Value>, SchemaError> {
        let index = self.require_column(column)?;
        Ok(self.rows.iter().map(move |row| &row[index]))
    }

    /// Combines tables row-wise.
    ///
    /// Columns are unioned in first-seen order; cells for columns a table does
    /// not have are filled with [`Value::Null`].
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Table {
        let mut combined = Table::default();

        for table in tables {
            if combined.columns.is_empty() && combined.rows.is_empty() {
                combined = table;
                continue;
            }

            if table.columns == combined.columns {
                combined.rows.extend(table.rows);
                continue;
            }

            for column in &table.columns {
                if !combined.columns.contains(column) {
                    combined.columns.push(column.clone());
                    for row in &mut combined.rows {
                        row.push(Value::Null);
                    }
                }
            }

            let mapping: Vec<usize> = table
                .columns
                .iter()
                .filter_map(|c| combined.column_index(c))
                .collect();
            let width = combined.columns.len();
            for row in table.rows {
                let mut widened = vec![Value::Null; width];
                for (value, &target) in row.into_iter().zip(&mapping) {
                    widened[target] = value;
                }
                combined.rows.push(widened);
            }
        }

        combined
    }

    /// Converts Arrow record batches into a table using the given schema for
    /// column names. The schema keeps the column set when there are no batches.
    ///
    /// Query results may repeat a column name (e.g. `SELECT v.id, f.id`).
    /// Repeated names get a numeric suffix (`id`, `id_1`) so that every column
    /// stays addressable. Inconsistent batches are a provider error.
    pub fn from_arrow(schema: &Schema, batches: &[RecordBatch]) -> Result<Table> {
        let columns = unique_column_names(schema.fields().iter().map(|f| f.name().as_str()));
        let mut rows = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());

        for batch in batches {
            if batch.num_columns() != columns.len() {
                return Err(ProviderError::Arrow(ArrowError::SchemaError(format!(
                    "record batch has {} columns but the schema has {}",
                    batch.num_columns(),
                    columns.len()
                )))
                .into());
            }

            let converted: Vec<Vec<Value>> = batch
                .columns()
                .iter()
                .zip(&columns)
                .map(|(array, name)| array_values(array, name))
                .collect::<std::result::Result<_, _>>()?;

            for i in 0..batch.num_rows() {
                rows.push(converted.iter().map(|col| col[i].clone()).collect());
            }
        }

        Table::new(columns, rows)
            .map_err(|e| ProviderError::Arrow(ArrowError::SchemaError(e.to_string())).into())
    }
}

/// Makes column names unique by suffixing repeats with `_1`, `_2`, ...
fn unique_column_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let mut candidate = name.to_string();
            let mut suffix = 1;
            while taken.contains(&candidate) {
                candidate = format!("{name}_{suffix}");
                suffix += 1;
            }
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// Incrementally builds a [`Table`].
#[derive(Debug, Clone)]
pub struct TableBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TableBuilder {
    /// Appends a row.
    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }

    /// Appends several rows.
    pub fn rows(mut self, rows: impl IntoIterator<Item = Vec<Value>>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// Validates and builds the table.
    pub fn build(self) -> std::result::Result<Table, SchemaError> {
        Table::new(self.columns, self.rows)
    }
}

fn primitive_values<T, F>(array: &ArrayRef, convert: F) -> Vec<Value>
where
    T: ArrowPrimitiveType,
    F: Fn(T::Native) -> Value,
{
    let array = array.as_primitive::<T>();
    (0..array.len())
        .map(|i| {
            if array.is_null(i) {
                Value::Null
            } else {
                convert(array.value(i))
            }
        })
        .collect()
}

fn temporal_values<T, F>(
    array: &ArrayRef,
    column: &str,
    convert: F,
) -> std::result::Result<Vec<Value>, ProviderError>
where
    T: ArrowPrimitiveType,
    F: Fn(&arrow::array::PrimitiveArray<T>, usize) -> Option<Value>,
{
    let array = array.as_primitive::<T>();
    (0..array.len())
        .map(|i| {
            if array.is_null(i) {
                Ok(Value::Null)
            } else {
                convert(array, i).ok_or_else(|| {
                    ProviderError::Arrow(arrow::error::ArrowError::CastError(format!(
                        "column '{column}' row {i} holds an out-of-range temporal value"
                    )))
                })
            }
        })
        .collect()
}

fn array_values(array: &ArrayRef, column: &str) -> std::result::Result<Vec<Value>, ProviderError> {
    let values = match array.data_type() {
        DataType::Null => vec![Value::Null; array.len()],
        DataType::Boolean => {
            let array = array.as_boolean();
            (0..array.len())
                .map(|i| {
                    if array.is_null(i) {
                        Value::Null
                    } else {
                        Value::Bool(array.value(i))
                    }
                })
                .collect()
        }
        DataType::Int8 => primitive_values::<Int8Type, _>(array, |v| Value::Int(v.into())),
        DataType::Int16 => primitive_values::<Int16Type, _>(array, |v| Value::Int(v.into())),
        DataType::Int32 => primitive_values::<Int32Type, _>(array, |v| Value::Int(v.into())),
        DataType::Int64 => primitive_values::<Int64Type, _>(array, Value::Int),
        DataType::UInt8 => primitive_values::<UInt8Type, _>(array, |v| Value::Int(v.into())),
        DataType::UInt16 => primitive_values::<UInt16Type, _>(array, |v| Value::Int(v.into())),
        DataType::UInt32 => primitive_values::<UInt32Type, _>(array, |v| Value::Int(v.into())),
        DataType::UInt64 => {
            let array = array.as_primitive::<UInt64Type>();
            (0..array.len())
                .map(|i| {
                    if array.is_null(i) {
                        return Ok(Value::Null);
                    }
                    i64::try_from(array.value(i)).map(Value::Int).map_err(|_| {
                        ProviderError::Arrow(arrow::error::ArrowError::CastError(format!(
                            "column '{column}' row {i} overflows a 64-bit signed integer"
                        )))
                    })
                })
                .collect::<std::result::Result<_, _>>()?
        }
        DataType::Float16 => {
            primitive_values::<Float16Type, _>(array, |v| Value::Float(v.to_f64()))
        }
        DataType::Float32 => primitive_values::<Float32Type, _>(array, |v| Value::Float(v.into())),
        DataType::Float64 => primitive_values::<Float64Type, _>(array, Value::Float),
        DataType::Decimal128(_, scale) => {
            let divisor = 10f64.powi(i32::from(*scale));
            primitive_values::<Decimal128Type, _>(array, |v| Value::Float(v as f64 / divisor))
        }
        DataType::Utf8 => string_values(array.as_string::<i32>().iter()),
        DataType::LargeUtf8 => string_values(array.as_string::<i64>().iter()),
        DataType::Utf8View => string_values(array.as_string_view().iter()),
        DataType::Date32 => temporal_values::<Date32Type, _>(array, column, |a, i| {
            a.value_as_date(i).map(Value::Date)
        })?,
        DataType::Date64 => temporal_values::<Date64Type, _>(array, column, |a, i| {
            a.value_as_date(i).map(Value::Date)
        })?,
        DataType::Timestamp(unit, _) => match unit {
            TimeUnit::Second => {
                temporal_values::<TimestampSecondType, _>(array, column, |a, i| {
                    a.value_as_datetime(i).map(Value::Timestamp)
                })?
            }
            TimeUnit::Millisecond => {
                temporal_values::<TimestampMillisecondType, _>(array, column, |a, i| {
                    a.value_as_datetime(i).map(Value::Timestamp)
                })?
            }
            TimeUnit::Microsecond => {
                temporal_values::<TimestampMicrosecondType, _>(array, column, |a, i| {
                    a.value_as_datetime(i).map(Value::Timestamp)
                })?
            }
            TimeUnit::Nanosecond => {
                temporal_values::<TimestampNanosecondType, _>(array, column, |a, i| {
                    a.value_as_datetime(i).map(Value::Timestamp)
                })?
            }
        },
        other => {
            return Err(ProviderError::Arrow(
                arrow::error::ArrowError::NotYetImplemented(format!(
                    "column '{column}' has unsupported type {other}"
                )),
            ))
        }
    };
    Ok(values)
}

fn string_values<'a>(iter: impl Iterator<Item = Option<&'a str>>) -> Vec<Value> {
    iter.map(|v| v.map_or(Value::Null, |s| Value::String(s.to_string())))
        .collect()
}
