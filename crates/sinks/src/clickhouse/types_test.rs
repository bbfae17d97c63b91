//! Tests for ClickHouse type parsing and cell conversion

use serde_json::{json, Value};

use super::{CellValue, ColumnType, ConvertError, TableStructure, convert_row};

fn convert(ty: &str, value: Value) -> Result<String, ConvertError> {
    let ty = ColumnType::parse(ty);
    ty.convert("col", &value)
        .map(|cell| serde_json::to_string(&cell).unwrap())
}

// =============================================================================
// Type parsing
// =============================================================================

#[test]
fn test_parse_plain_types() {
    assert_eq!(ColumnType::parse("UInt8"), ColumnType::UInt8);
    assert_eq!(ColumnType::parse("Int64"), ColumnType::Int64);
    assert_eq!(ColumnType::parse("Float32"), ColumnType::Float32);
    assert_eq!(ColumnType::parse("String"), ColumnType::String);
    assert_eq!(ColumnType::parse("Date"), ColumnType::Date);
    assert_eq!(ColumnType::parse("DateTime"), ColumnType::DateTime);
}

#[test]
fn test_parse_strips_parameters() {
    assert_eq!(ColumnType::parse("FixedString(16)"), ColumnType::FixedString);
    assert_eq!(ColumnType::parse("DateTime64(3)"), ColumnType::DateTime64);
    assert_eq!(ColumnType::parse("DateTime('UTC')"), ColumnType::DateTime);
    assert_eq!(
        ColumnType::parse("Enum8('a' = 1, 'b' = 2)"),
        ColumnType::Enum8
    );
    assert_eq!(ColumnType::parse("Enum16('x' = 1000)"), ColumnType::Enum16);
}

#[test]
fn test_parse_wrappers() {
    assert_eq!(
        ColumnType::parse("LowCardinality(String)"),
        ColumnType::String
    );
    assert_eq!(
        ColumnType::parse("Nullable(UInt32)"),
        ColumnType::Nullable(Box::new(ColumnType::UInt32))
    );
    assert_eq!(
        ColumnType::parse("LowCardinality(Nullable(String))"),
        ColumnType::Nullable(Box::new(ColumnType::String))
    );
}

#[test]
fn test_parse_unsupported() {
    assert_eq!(
        ColumnType::parse("Array(String)"),
        ColumnType::Unsupported("Array(String)".into())
    );
}

// =============================================================================
// Integers
// =============================================================================

#[test]
fn test_unsigned_accepts_number_and_text() {
    assert_eq!(convert("UInt8", json!(255)).unwrap(), "255");
    assert_eq!(convert("UInt8", json!("255")).unwrap(), "255");
    assert_eq!(convert("UInt64", json!(u64::MAX)).unwrap(), u64::MAX.to_string());
    assert_eq!(
        convert("UInt64", json!("18446744073709551615")).unwrap(),
        "18446744073709551615"
    );
}

#[test]
fn test_unsigned_out_of_range() {
    assert!(matches!(
        convert("UInt8", json!(256)),
        Err(ConvertError::OutOfRange { .. })
    ));
    assert!(matches!(
        convert("UInt16", json!("70000")),
        Err(ConvertError::OutOfRange { .. })
    ));
    assert!(matches!(
        convert("UInt32", json!(-1)),
        Err(ConvertError::OutOfRange { .. })
    ));
}

#[test]
fn test_oversized_integers_are_out_of_range() {
    let beyond_u64: Value = serde_json::from_str("18446744073709551616").unwrap();
    let err = ColumnType::UInt64.convert("id", &beyond_u64).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::OutOfRange { ref value, .. } if value == "18446744073709551616"
    ));

    let huge: Value = serde_json::from_str("123456789012345678901234567890123456789012").unwrap();
    assert!(matches!(
        ColumnType::Int64.convert("id", &huge),
        Err(ConvertError::OutOfRange { .. })
    ));
    assert!(matches!(
        convert("UInt64", json!("-123456789012345678901234567890123456789012")),
        Err(ConvertError::OutOfRange { .. })
    ));
}

#[test]
fn test_unsigned_unparsable() {
    for value in [json!(1.5), json!("abc"), json!(true), json!(null), json!([1])] {
        assert!(
            matches!(convert("UInt32", value.clone()), Err(ConvertError::Unparsable { .. })),
            "{value}"
        );
    }
}

#[test]
fn test_signed_bounds() {
    assert_eq!(convert("Int8", json!(-128)).unwrap(), "-128");
    assert_eq!(convert("Int8", json!("127")).unwrap(), "127");
    assert!(matches!(
        convert("Int8", json!(128)),
        Err(ConvertError::OutOfRange { .. })
    ));
    assert!(matches!(
        convert("Int64", json!(u64::MAX)),
        Err(ConvertError::OutOfRange { .. })
    ));
    assert_eq!(convert("Int32", json!(" -42 ")).unwrap(), "-42");
}

#[test]
fn test_error_names_column_and_value() {
    let err = ColumnType::UInt8
        .convert("age", &json!(300))
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("age"));
    assert!(msg.contains("300"));
    assert!(msg.contains("UInt8"));
}

// =============================================================================
// Floats, strings, dates, enums
// =============================================================================

#[test]
fn test_floats() {
    assert_eq!(convert("Float64", json!(1.25)).unwrap(), "1.25");
    assert_eq!(convert("Float64", json!("2.5")).unwrap(), "2.5");
    assert_eq!(convert("Float32", json!(0.1)).unwrap(), "0.1");
    assert_eq!(convert("Float64", json!(3)).unwrap(), "3.0");
    assert!(matches!(
        convert("Float32", json!(1e300)),
        Err(ConvertError::OutOfRange { .. })
    ));
    assert!(matches!(
        convert("Float64", json!("x")),
        Err(ConvertError::Unparsable { .. })
    ));
}

#[test]
fn test_strings_require_text() {
    assert_eq!(convert("String", json!("hello")).unwrap(), "\"hello\"");
    assert_eq!(convert("FixedString(2)", json!("ab")).unwrap(), "\"ab\"");
    assert!(matches!(
        convert("String", json!(5)),
        Err(ConvertError::Unparsable { .. })
    ));
}

#[test]
fn test_dates_accept_integer_or_keep_text() {
    assert_eq!(convert("DateTime", json!(1700000000)).unwrap(), "1700000000");
    assert_eq!(convert("DateTime", json!("1700000000")).unwrap(), "1700000000");
    assert_eq!(
        convert("DateTime", json!("2024-01-02 03:04:05")).unwrap(),
        "\"2024-01-02 03:04:05\""
    );
    assert_eq!(convert("Date", json!("2024-01-02")).unwrap(), "\"2024-01-02\"");
    assert!(matches!(
        convert("Date", json!(false)),
        Err(ConvertError::Unparsable { .. })
    ));
}

#[test]
fn test_datetime64_requires_text() {
    assert_eq!(
        convert("DateTime64(3)", json!("2024-01-02 03:04:05.678")).unwrap(),
        "\"2024-01-02 03:04:05.678\""
    );
    assert!(matches!(
        convert("DateTime64(3)", json!(1)),
        Err(ConvertError::Unparsable { .. })
    ));
}

#[test]
fn test_enums_accept_value_or_name() {
    assert_eq!(convert("Enum8('a' = 1)", json!(1)).unwrap(), "1");
    assert_eq!(convert("Enum8('a' = 1)", json!("a")).unwrap(), "\"a\"");
    assert_eq!(convert("Enum16('a' = 1000)", json!(1000)).unwrap(), "1000");
    assert!(matches!(
        convert("Enum8('a' = 1)", json!(1000)),
        Err(ConvertError::OutOfRange { .. })
    ));
}

#[test]
fn test_nullable() {
    assert_eq!(convert("Nullable(String)", json!(null)).unwrap(), "null");
    assert_eq!(convert("Nullable(UInt8)", json!("7")).unwrap(), "7");
    assert!(matches!(
        convert("String", json!(null)),
        Err(ConvertError::Unparsable { .. })
    ));
}

#[test]
fn test_unsupported_type() {
    let err = convert("Array(String)", json!(["a"])).unwrap_err();
    assert_eq!(
        err,
        ConvertError::UnsupportedType {
            column: "col".into(),
            column_type: "Array(String)".into(),
        }
    );
}

// =============================================================================
// Table structure
// =============================================================================

fn events_structure() -> TableStructure {
    let mut structure = TableStructure::new();
    structure.insert("id", "UInt64");
    structure.insert("name", "String");
    structure.insert("ts", "DateTime");
    structure
}

#[test]
fn test_resolve_fields_in_order() {
    let structure = events_structure();
    let fields = vec!["ts".to_string(), "`id`".to_string()];

    let columns = structure.resolve(&fields).unwrap();

    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0], ("ts", &ColumnType::DateTime));
    assert_eq!(columns[1], ("id", &ColumnType::UInt64));
}

#[test]
fn test_resolve_unknown_column() {
    let structure = events_structure();
    let fields = vec!["id".to_string(), "missing".to_string()];

    assert_eq!(
        structure.resolve(&fields).unwrap_err(),
        ConvertError::UnknownColumn {
            column: "missing".into()
        }
    );
}

#[test]
fn test_convert_row() {
    let structure = events_structure();
    let fields = vec!["id".to_string(), "name".to_string(), "ts".to_string()];
    let columns = structure.resolve(&fields).unwrap();
    let row = vec![json!("42"), json!("click"), json!(1700000000)];

    let cells = convert_row(&columns, &row).unwrap();

    assert_eq!(
        cells,
        vec![
            CellValue::UInt(42),
            CellValue::Str("click"),
            CellValue::Int(1700000000)
        ]
    );
    assert_eq!(
        serde_json::to_string(&cells).unwrap(),
        r#"[42,"click",1700000000]"#
    );
}

#[test]
fn test_convert_row_fails_on_first_bad_cell() {
    let structure = events_structure();
    let fields = vec!["id".to_string(), "name".to_string()];
    let columns = structure.resolve(&fields).unwrap();
    let row = vec![json!(-5), json!(1)];

    let err = convert_row(&columns, &row).unwrap_err();
    assert!(matches!(err, ConvertError::OutOfRange { column, .. } if column == "id"));
}
