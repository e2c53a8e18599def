//! Tests for per-field decoding.

use anyhow::Result;
use microlector::decode::{decode, parse_leading_int, Decoder};
use microlector::{ErrorKind, FieldSpec, Value};
use serde_json::json;

fn field(spec: serde_json::Value) -> Result<FieldSpec> {
    Ok(serde_json::from_value(spec)?)
}

#[test]
fn test_double_with_implied_decimals() -> Result<()> {
    let f = field(json!({"name": "ingresos", "type": "double", "length": 6, "decimals": 2}))?;
    assert_eq!(decode(&f, "012345")?, Some(Value::Double(123.45)));
    Ok(())
}

#[test]
fn test_double_sentinel_is_null() -> Result<()> {
    let f = field(json!({"name": "ingresos", "type": "double", "length": 6, "decimals": 2, "null": 999999}))?;
    assert_eq!(decode(&f, "999999")?, None);
    assert_eq!(decode(&f, "000100")?, Some(Value::Double(1.0)));
    Ok(())
}

#[test]
fn test_double_defaults_to_zero_decimals() -> Result<()> {
    let f = field(json!({"name": "peso", "type": "double", "length": 4}))?;
    assert_eq!(decode(&f, "0042")?, Some(Value::Double(42.0)));
    Ok(())
}

#[test]
fn test_double_with_literal_point_truncates_mantissa() -> Result<()> {
    let f = field(json!({"name": "x", "type": "double", "length": 5, "decimals": 2}))?;
    assert_eq!(decode(&f, "12.50")?, Some(Value::Double(0.12)));
    Ok(())
}

#[test]
fn test_integer_sentinel_and_garbage() -> Result<()> {
    let f = field(json!({"name": "edad", "type": "integer", "length": 4, "null": "9999"}))?;
    assert_eq!(decode(&f, "9999")?, None);
    assert_eq!(decode(&f, "ABCD")?, None);
    assert_eq!(decode(&f, "    ")?, None);
    assert_eq!(decode(&f, "0042")?, Some(Value::Integer(42)));
    assert_eq!(decode(&f, "  -7")?, Some(Value::Integer(-7)));
    Ok(())
}

#[test]
fn test_leading_int_prefix_rule() {
    assert_eq!(parse_leading_int("42AB"), Some(42));
    assert_eq!(parse_leading_int("  +3"), Some(3));
    assert_eq!(parse_leading_int("-"), None);
    assert_eq!(parse_leading_int("99999999999999999999"), None);
}

#[test]
fn test_integer_key_uses_canonical_form() -> Result<()> {
    let f = field(json!({
        "name": "sexo", "type": "key", "keytype": "integer", "length": 2,
        "values": {"1": "Hombre", "2": "Mujer"}
    }))?;
    assert_eq!(decode(&f, "01")?, Some(Value::Label("Hombre".into())));
    assert_eq!(decode(&f, "02")?, Some(Value::Label("Mujer".into())));
    assert_eq!(decode(&f, "07")?, None);
    Ok(())
}

#[test]
fn test_string_key_lookup_is_verbatim() -> Result<()> {
    let f = field(json!({
        "name": "ccaa", "type": "key", "keytype": "string", "length": 2, "null": "  ",
        "values": {"01": "Andalucía", " 2": "Aragón"}
    }))?;
    assert_eq!(decode(&f, "01")?, Some(Value::Label("Andalucía".into())));
    assert_eq!(decode(&f, " 2")?, Some(Value::Label("Aragón".into())));
    assert_eq!(decode(&f, "1 ")?, None);
    assert_eq!(decode(&f, "  ")?, None);
    Ok(())
}

#[test]
fn test_tree_key_walks_levels() -> Result<()> {
    let f = field(json!({
        "name": "gasto", "type": "key", "keytype": "tree", "length": 5, "keylength": [2, 3],
        "values": {
            "01": {"name": "Alimentos", "values": {"111": "Pan", "112": "Carne"}},
            "02": "Bebidas"
        }
    }))?;
    let path = |labels: &[&str]| Some(Value::Path(labels.iter().map(|s| s.to_string()).collect()));

    assert_eq!(decode(&f, "01112")?, path(&["Alimentos", "Carne"]));
    // Terminal at the first level ends the walk
    assert_eq!(decode(&f, "02999")?, path(&["Bebidas"]));
    // Missing second-level key keeps the labels collected so far
    assert_eq!(decode(&f, "01999")?, path(&["Alimentos"]));
    assert_eq!(decode(&f, "99111")?, None);
    Ok(())
}

#[test]
fn test_key_without_keytype_fails_to_compile() -> Result<()> {
    let f = field(json!({"name": "k", "type": "key", "length": 2, "values": {}}))?;
    let err = Decoder::compile(&f).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldDefinition);
    Ok(())
}

#[test]
fn test_tree_without_keylength_fails_to_compile() -> Result<()> {
    let f = field(json!({"name": "k", "type": "key", "keytype": "tree", "length": 2, "values": {}}))?;
    assert_eq!(decode(&f, "01").unwrap_err().kind(), ErrorKind::FieldDefinition);
    Ok(())
}

#[test]
fn test_unknown_types_are_unsupported() -> Result<()> {
    let f = field(json!({"name": "fecha", "type": "date", "length": 8}))?;
    assert_eq!(decode(&f, "20240101").unwrap_err().kind(), ErrorKind::UnsupportedType);

    let f = field(json!({"name": "k", "type": "key", "keytype": "range", "length": 2}))?;
    assert_eq!(decode(&f, "01").unwrap_err().kind(), ErrorKind::UnsupportedType);
    Ok(())
}
