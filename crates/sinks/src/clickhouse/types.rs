//! ClickHouse column types and cell conversion
//!
//! Rows arrive as generic JSON. Before they are sent, every cell is
//! converted to the column's semantic type. Numeric columns accept both a
//! JSON number and its decimal text (`5` and `"5"`); out-of-range and
//! unparsable values fail with an error naming the column and the value.

use std::collections::HashMap;
use std::fmt;
use std::num::IntErrorKind;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Semantic type of a ClickHouse column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    FixedString,
    Date,
    DateTime,
    DateTime64,
    Enum8,
    Enum16,
    /// `Nullable(T)`: JSON null, or anything `T` accepts
    Nullable(Box<ColumnType>),
    /// A type with no conversion rule; inserting into it fails
    Unsupported(std::string::String),
}

impl ColumnType {
    /// Parse a type as reported by `system.columns`
    ///
    /// Parameters are dropped (`FixedString(16)` is `FixedString`,
    /// `Enum8('a' = 1)` is `Enum8`) and `LowCardinality` is unwrapped.
    pub fn parse(type_name: &str) -> Self {
        let type_name = type_name.trim();

        if let Some(inner) = unwrap_param(type_name, "LowCardinality") {
            return Self::parse(inner);
        }
        if let Some(inner) = unwrap_param(type_name, "Nullable") {
            return Self::Nullable(Box::new(Self::parse(inner)));
        }

        let base = type_name
            .split_once('(')
            .map_or(type_name, |(base, _)| base.trim());

        match base {
            "UInt8" | "Bool" => Self::UInt8,
            "UInt16" => Self::UInt16,
            "UInt32" => Self::UInt32,
            "UInt64" => Self::UInt64,
            "Int8" => Self::Int8,
            "Int16" => Self::Int16,
            "Int32" => Self::Int32,
            "Int64" => Self::Int64,
            "Float32" => Self::Float32,
            "Float64" => Self::Float64,
            "String" => Self::String,
            "FixedString" => Self::FixedString,
            "Date" => Self::Date,
            "DateTime" => Self::DateTime,
            "DateTime64" => Self::DateTime64,
            "Enum8" => Self::Enum8,
            "Enum16" => Self::Enum16,
            _ => Self::Unsupported(type_name.to_string()),
        }
    }

    /// Convert one JSON cell for a column of this type
    pub fn convert<'a>(
        &self,
        column: &str,
        value: &'a Value,
    ) -> Result<CellValue<'a>, ConvertError> {
        let err = |kind: Failure| {
            kind(column.to_string(), self.to_string(), value.to_string())
        };

        match self {
            Self::UInt8 => unsigned(value, u8::MAX as u64).map_err(err),
            Self::UInt16 => unsigned(value, u16::MAX as u64).map_err(err),
            Self::UInt32 => unsigned(value, u32::MAX as u64).map_err(err),
            Self::UInt64 => unsigned(value, u64::MAX).map_err(err),
            Self::Int8 => signed(value, i8::MIN as i64, i8::MAX as i64).map_err(err),
            Self::Int16 => signed(value, i16::MIN as i64, i16::MAX as i64).map_err(err),
            Self::Int32 => signed(value, i32::MIN as i64, i32::MAX as i64).map_err(err),
            Self::Int64 => signed(value, i64::MIN, i64::MAX).map_err(err),
            Self::Float32 => float(value, true).map_err(err),
            Self::Float64 => float(value, false).map_err(err),
            Self::String | Self::FixedString | Self::DateTime64 => match value {
                Value::String(s) => Ok(CellValue::Str(s)),
                _ => Err(err(ConvertError::unparsable as Failure)),
            },
            Self::Date | Self::DateTime => match value {
                Value::String(s) => Ok(s
                    .trim()
                    .parse::<i64>()
                    .map_or(CellValue::Str(s), CellValue::Int)),
                _ => signed(value, i64::MIN, i64::MAX).map_err(err),
            },
            Self::Enum8 | Self::Enum16 => match value {
                Value::String(s) => Ok(CellValue::Str(s)),
                _ if *self == Self::Enum8 => {
                    signed(value, i8::MIN as i64, i8::MAX as i64).map_err(err)
                }
                _ => signed(value, i16::MIN as i64, i16::MAX as i64).map_err(err),
            },
            Self::Nullable(inner) => match value {
                Value::Null => Ok(CellValue::Null),
                _ => inner.convert(column, value),
            },
            Self::Unsupported(name) => Err(ConvertError::UnsupportedType {
                column: column.to_string(),
                column_type: name.clone(),
            }),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nullable(inner) => write!(f, "Nullable({inner})"),
            Self::Unsupported(name) => f.write_str(name),
            other => write!(f, "{other:?}"),
        }
    }
}

/// A converted cell, borrowing text from the source row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue<'a> {
    Null,
    UInt(u64),
    Int(i64),
    Float32(f32),
    Float64(f64),
    Str(&'a str),
}

/// Errors converting a JSON cell to a column type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Value is numeric but does not fit the column
    #[error(
        "convert to clickhouse type: value {value} out of range for column {column} ({column_type})"
    )]
    OutOfRange {
        column: String,
        column_type: String,
        value: String,
    },

    /// Value cannot be read as the column's type
    #[error("convert to clickhouse type: can't parse {value} for column {column} ({column_type})")]
    Unparsable {
        column: String,
        column_type: String,
        value: String,
    },

    /// Field is not a column of the table
    #[error("convert to clickhouse type: no column {column} in table structure")]
    UnknownColumn { column: String },

    /// Column type has no conversion rule
    #[error("convert to clickhouse type: type {column_type} of column {column} is not supported")]
    UnsupportedType { column: String, column_type: String },
}

impl ConvertError {
    fn out_of_range(column: String, column_type: String, value: String) -> Self {
        Self::OutOfRange {
            column,
            column_type,
            value,
        }
    }

    fn unparsable(column: String, column_type: String, value: String) -> Self {
        Self::Unparsable {
            column,
            column_type,
            value,
        }
    }
}

type Failure = fn(String, String, String) -> ConvertError;

/// Read an integer from a JSON number or its decimal text
///
/// Numbers are read through their original text, so a value too large for
/// any column reports as out of range rather than as a rounded float.
fn integer(value: &Value) -> Result<i128, Failure> {
    match value {
        Value::Number(n) => parse_integer(&n.to_string()),
        Value::String(s) => parse_integer(s.trim()),
        _ => Err(ConvertError::unparsable as Failure),
    }
}

fn parse_integer(text: &str) -> Result<i128, Failure> {
    text.parse::<i128>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ConvertError::out_of_range as Failure
        }
        _ => ConvertError::unparsable as Failure,
    })
}

fn unsigned<'a>(value: &Value, max: u64) -> Result<CellValue<'a>, Failure> {
    let n = integer(value)?;
    if n < 0 || n > i128::from(max) {
        return Err(ConvertError::out_of_range as Failure);
    }
    Ok(CellValue::UInt(n as u64))
}

fn signed<'a>(value: &Value, min: i64, max: i64) -> Result<CellValue<'a>, Failure> {
    let n = integer(value)?;
    if n < i128::from(min) || n > i128::from(max) {
        return Err(ConvertError::out_of_range as Failure);
    }
    Ok(CellValue::Int(n as i64))
}

fn float<'a>(value: &Value, single: bool) -> Result<CellValue<'a>, Failure> {
    let f = match value {
        Value::Number(n) => n.as_f64().ok_or(ConvertError::unparsable as Failure)?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ConvertError::unparsable as Failure)?,
        _ => return Err(ConvertError::unparsable as Failure),
    };

    if single {
        if f.is_finite() && f.abs() > f64::from(f32::MAX) {
            return Err(ConvertError::out_of_range as Failure);
        }
        Ok(CellValue::Float32(f as f32))
    } else {
        Ok(CellValue::Float64(f))
    }
}

/// Strip `Wrapper(` ... `)` around a type name
fn unwrap_param<'a>(type_name: &'a str, wrapper: &str) -> Option<&'a str> {
    type_name
        .strip_prefix(wrapper)?
        .strip_prefix('(')?
        .strip_suffix(')')
        .map(str::trim)
}

/// Column name to type mapping of one ClickHouse table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStructure {
    columns: HashMap<String, ColumnType>,
}

impl TableStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, parsing its type name
    pub fn insert(&mut self, column: impl Into<String>, type_name: &str) {
        self.columns.insert(column.into(), ColumnType::parse(type_name));
    }

    pub fn get(&self, column: &str) -> Option<&ColumnType> {
        self.columns.get(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look up the types of an ordered field list
    ///
    /// Backticks around field names are ignored.
    pub fn resolve<'s>(
        &'s self,
        fields: &[String],
    ) -> Result<Vec<(&'s str, &'s ColumnType)>, ConvertError> {
        fields
            .iter()
            .map(|field| {
                let column = field.trim_matches('`');
                self.columns
                    .get_key_value(column)
                    .map(|(name, ty)| (name.as_str(), ty))
                    .ok_or_else(|| ConvertError::UnknownColumn {
                        column: column.to_string(),
                    })
            })
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, ColumnType)> for TableStructure {
    fn from_iter<I: IntoIterator<Item = (S, ColumnType)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Convert a row with column types already resolved by [`TableStructure::resolve`]
pub fn convert_row<'a>(
    columns: &[(&str, &ColumnType)],
    row: &'a [Value],
) -> Result<Vec<CellValue<'a>>, ConvertError> {
    columns
        .iter()
        .zip(row)
        .map(|((column, ty), value)| ty.convert(column, value))
        .collect()
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
