#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assert_cmd::cargo::cargo_bin_cmd;
use occamy::storage::catalog::{ColumnDef, ColumnType, EdgeSchema, MemoryCatalog};
use occamy::storage::sfile::{ColumnValue, EdgeGroupBuilder, SegFileWriter, SegManifest};
use occamy::storage::SegFileOptions;
use occamy::types::{TypeId, VertexId};
use serde_json::Value;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    catalog: PathBuf,
    segfile: PathBuf,
    manifest: SegManifest,
}

fn setup(name: &str) -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let catalog = dir.path().join("catalog.toml");
    let segfile = dir.path().join(format!("{name}.seg"));
    let manifest = seed(&catalog, &segfile).expect("seed seg file");
    Fixture {
        _dir: dir,
        catalog,
        segfile,
        manifest,
    }
}

/// Three groups with 4, 0, and 6 rows; the `note` column is mixed in every non-empty group.
fn seed(catalog_path: &Path, segfile: &Path) -> occamy::types::Result<SegManifest> {
    let schema = EdgeSchema::new(
        TypeId(5),
        "follows",
        vec![
            ColumnDef::new("dst", ColumnType::Vertex),
            ColumnDef::new("note", ColumnType::Str),
        ],
    )?;
    let mut catalog = MemoryCatalog::new();
    let schema: Arc<EdgeSchema> = catalog.register(schema)?;
    fs::write(catalog_path, catalog.to_toml_string()?)?;

    let mut writer = SegFileWriter::create(segfile, TypeId(5), SegFileOptions::default())?;
    for (source, fanout) in [(1u64, 4u64), (2, 0), (3, 6)] {
        let mut builder = EdgeGroupBuilder::new(Arc::clone(&schema), VertexId(source));
        for i in 0..fanout {
            let note = format!("n{i}");
            let note = if i % 2 == 1 {
                ColumnValue::Null
            } else {
                ColumnValue::Str(&note)
            };
            builder.push_row(&[ColumnValue::Vertex(VertexId(source * 100 + i)), note])?;
        }
        writer.append(&builder.finish())?;
    }
    let (_, manifest) = writer.finish()?;
    let mut sidecar = segfile.as_os_str().to_os_string();
    sidecar.push(".manifest.json");
    manifest.save(Path::new(&sidecar))?;
    Ok(manifest)
}

#[test]
fn summary_emits_json() {
    let fx = setup("summary");
    let output = cargo_bin_cmd!("occamy-inspect")
        .arg("--catalog")
        .arg(&fx.catalog)
        .args(["--format", "json"])
        .arg(&fx.segfile)
        .arg("summary")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["edge_type"], 5);
    assert_eq!(json["edge_name"], "follows");
    assert_eq!(json["groups"], 3);
    assert_eq!(json["rows"], 10);
    let detail = json["detail"].as_array().expect("detail array");
    assert_eq!(detail[2]["source"], 3);
    assert_eq!(detail[2]["columns"][1]["null_state"], "mixed");
    assert_eq!(detail[2]["columns"][1]["nulls"], 3);
    assert_eq!(detail[1]["columns"][0]["null_state"], "none");
}

#[test]
fn dump_respects_group_and_limit() {
    let fx = setup("dump");
    let output = cargo_bin_cmd!("occamy-inspect")
        .arg("--catalog")
        .arg(&fx.catalog)
        .args(["--format", "json"])
        .arg(&fx.segfile)
        .args(["dump", "--group", "2", "--limit", "4"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["source"], 3);
    let rows = json["rows"].as_array().expect("rows array");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0][0], "v300");
    assert_eq!(rows[1][1], "null");

    cargo_bin_cmd!("occamy-inspect")
        .arg("--catalog")
        .arg(&fx.catalog)
        .arg(&fx.segfile)
        .args(["dump", "--group", "7"])
        .assert()
        .failure();
}

#[test]
fn verify_passes_on_intact_file() {
    let fx = setup("verify-ok");
    let output = cargo_bin_cmd!("occamy-inspect")
        .arg("--catalog")
        .arg(&fx.catalog)
        .args(["--format", "json"])
        .arg(&fx.segfile)
        .arg("verify")
        .assert()
        .code(0)
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["success"], true);
    assert_eq!(json["groups_decoded"], 3);
}

#[test]
fn verify_exits_two_on_flipped_byte() {
    let fx = setup("verify-bad");
    let mut bytes = fs::read(&fx.segfile).expect("read seg file");
    let third = fx.manifest.groups[2].offset as usize;
    bytes[third] ^= 0x40;
    fs::write(&fx.segfile, &bytes).expect("rewrite seg file");

    let output = cargo_bin_cmd!("occamy-inspect")
        .arg("--catalog")
        .arg(&fx.catalog)
        .args(["--format", "json"])
        .arg(&fx.segfile)
        .arg("verify")
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["success"], false);
    assert_eq!(json["groups_decoded"], 2);
    assert!(json["error"].as_str().expect("error text").contains("checksum"));
}
