#![allow(missing_docs)]

use std::fs;

use occamy::storage::catalog::{ColumnType, MemoryCatalog, SchemaCatalog};
use occamy::types::{OccamyError, Result, TypeId};
use tempfile::tempdir;

const CATALOG: &str = r#"
[[edge_type]]
id = 7
name = "follows"
columns = [
    { name = "dst", type = "vertex" },
    { name = "weight", type = "f64" },
]

[[edge_type]]
id = 12
name = "messaged"
columns = [
    { name = "dst", type = "vertex" },
    { name = "at", type = "i64" },
    { name = "body", type = "str" },
    { name = "attachment", type = "bytes" },
]
"#;

#[test]
fn load_catalog_from_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("catalog.toml");
    fs::write(&path, CATALOG)?;

    let catalog = MemoryCatalog::load(&path)?;
    assert_eq!(catalog.len(), 2);
    let messaged = catalog.edge_schema(TypeId(12))?;
    assert_eq!(messaged.name, "messaged");
    assert_eq!(messaged.column_count(), 4);
    assert_eq!(messaged.column(2)?.ty, ColumnType::Str);
    assert_eq!(messaged.ordinal_of("attachment"), Some(3));
    assert!(matches!(
        catalog.edge_schema(TypeId(99)),
        Err(OccamyError::NotFound(_))
    ));
    Ok(())
}

#[test]
fn catalog_survives_toml_roundtrip() -> Result<()> {
    let catalog = MemoryCatalog::from_toml_str(CATALOG)?;
    let reparsed = MemoryCatalog::from_toml_str(&catalog.to_toml_string()?)?;
    for ty in [TypeId(7), TypeId(12)] {
        assert_eq!(*catalog.edge_schema(ty)?, *reparsed.edge_schema(ty)?);
    }
    Ok(())
}

#[test]
fn duplicate_edge_type_is_config_error() {
    let text = format!("{CATALOG}\n[[edge_type]]\nid = 7\ncolumns = [{{ name = \"x\", type = \"u32\" }}]\n");
    assert!(matches!(
        MemoryCatalog::from_toml_str(&text),
        Err(OccamyError::Config(_))
    ));
}

#[test]
fn malformed_catalogs_are_rejected() {
    assert!(matches!(
        MemoryCatalog::from_toml_str("[[edge_type]]\nid = \"seven\"\n"),
        Err(OccamyError::Config(_))
    ));
    assert!(matches!(
        MemoryCatalog::from_toml_str(
            "[[edge_type]]\nid = 1\ncolumns = [{ name = \"a\", type = \"decimal\" }]\n"
        ),
        Err(OccamyError::Config(_))
    ));
    assert!(MemoryCatalog::from_toml_str("[[edge_type]]\nid = 1\ncolumns = []\n").is_err());
    assert!(MemoryCatalog::from_toml_str("").expect("empty catalog").is_empty());
}

#[test]
fn missing_catalog_file_is_io_error() {
    let dir = tempdir().expect("tempdir");
    let err = MemoryCatalog::load(&dir.path().join("absent.toml")).unwrap_err();
    assert_eq!(err.kind(), "io");
}
