//! Tests for format definition parsing and the definition catalog.

use anyhow::Result;
use microlector::testing::TempDirPath;
use microlector::{Catalog, ErrorKind, FormatDefinition, LookupNode};

const EPF: &str = r#"[
  {"file": "hogares", "length": 7, "key": ["numero"],
   "fields": [
     {"name": "numero", "type": "integer", "length": 4},
     {"name": "zona", "type": "key", "keytype": "tree", "keylength": [1, 1], "length": 2,
      "values": {"1": {"name": "Norte", "values": {"1": "Costa", "2": "Interior"}}, "2": "Sur"}},
     {"name": "miembros", "type": "integer", "length": 1, "null": 9}
   ]},
  {"file": "personas", "length": 10, "parent": {"file": "hogares", "key": ["numero"]},
   "fields": [
     {"name": "numero", "type": "integer", "length": 4},
     {"name": "ingresos", "type": "double", "length": 6, "decimals": 2, "null": "999999"}
   ]}
]"#;

#[test]
fn test_parse_definition_array() -> Result<()> {
    let def = FormatDefinition::from_json_str(EPF)?;
    assert_eq!(def.files().len(), 2);

    let hogares = def.file("hogares").unwrap();
    assert!(hogares.is_root());
    assert_eq!(hogares.record_length, 7);
    assert_eq!(hogares.fields_length(), 7);
    assert_eq!(hogares.field("miembros").unwrap().null_sentinel.as_ref().unwrap().as_str(), "9");

    let zona = hogares.field("zona").unwrap();
    assert_eq!(zona.key_lengths.as_deref(), Some(&[1, 1][..]));
    match zona.value_table.as_ref().unwrap().get("1") {
        Some(LookupNode::Subtree { name, values }) => {
            assert_eq!(name, "Norte");
            assert_eq!(values.get("2").map(LookupNode::label), Some("Interior"));
        }
        other => panic!("expected subtree, got {other:?}"),
    }

    let personas = def.file("personas").unwrap();
    assert!(personas.is_child());
    assert_eq!(personas.parent.as_ref().unwrap().file_id, "hogares");
    assert_eq!(personas.field("ingresos").unwrap().decimals, Some(2));
    Ok(())
}

#[test]
fn test_single_object_is_one_file_definition() -> Result<()> {
    let def = FormatDefinition::from_json_str(
        r#"{"file": "solo", "length": 3, "key": ["a"],
            "fields": [{"name": "a", "type": "integer", "length": 3}]}"#,
    )?;
    assert_eq!(def.files().len(), 1);
    assert_eq!(def.files()[0].id, "solo");
    Ok(())
}

#[test]
fn test_parse_error_names_file_and_member() {
    let err = FormatDefinition::from_json_str(r#"[{"file":"h","length":"7","fields":[]}]"#)
        .unwrap_err()
        .to_string();
    assert!(err.contains("'h'"), "{err}");
    assert!(err.contains("`length`"), "{err}");
    assert!(!err.contains("untagged"), "{err}");
}

#[test]
fn test_parse_error_names_field() {
    let err = FormatDefinition::from_json_str(
        r#"{"file": "h", "length": 2,
            "fields": [{"name": "x", "type": "integer", "length": 2, "decimals": "dos"}]}"#,
    )
    .unwrap_err()
    .to_string();
    assert!(err.contains("field 'x'"), "{err}");
    assert!(err.contains("`decimals`"), "{err}");

    let err = FormatDefinition::from_json_str(
        r#"{"file": "h", "length": 2,
            "fields": [{"name": "z", "type": "key", "keytype": "string", "length": 2,
                        "values": {"01": 5}}]}"#,
    )
    .unwrap_err()
    .to_string();
    assert!(err.contains("`values`"), "{err}");
    assert!(err.contains("subtree"), "{err}");
}

#[test]
fn test_parse_error_reports_missing_member() {
    let err = FormatDefinition::from_json_str(r#"[{"file": "h", "fields": []}]"#)
        .unwrap_err()
        .to_string();
    assert!(err.contains("missing field `length`"), "{err}");
}

#[test]
fn test_catalog_loads_by_file_type() -> Result<()> {
    let dir = TempDirPath::new()?;
    std::fs::write(dir.file_path("epf.json"), EPF)?;
    std::fs::write(dir.file_path("notes.txt"), "ignored")?;

    let catalog = Catalog::new(dir.path());
    assert_eq!(catalog.file_types()?, vec!["epf"]);
    assert_eq!(catalog.load("epf")?.files().len(), 2);
    Ok(())
}

#[test]
fn test_catalog_missing_and_malformed() -> Result<()> {
    let dir = TempDirPath::new()?;
    std::fs::write(dir.file_path("rota.json"), "[{\"file\": ")?;
    let catalog = Catalog::new(dir.path());

    assert_eq!(catalog.load("eph").unwrap_err().kind(), ErrorKind::DefinitionNotFound);
    assert_eq!(catalog.load("rota").unwrap_err().kind(), ErrorKind::DefinitionParse);
    Ok(())
}
