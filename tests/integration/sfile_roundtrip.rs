#![allow(missing_docs)]

use std::fs;
use std::sync::{Arc, Once};

use occamy::primitives::bits::BitRead;
use occamy::storage::catalog::{ColumnDef, ColumnType, EdgeSchema};
use occamy::storage::sfile::{
    ColumnRange, ColumnValue, DataSection, EdgeGroup, EdgeGroupBuilder, Footer, NullState,
    SegFile, SegFileWriter, SegManifest, ValueLayout,
};
use occamy::storage::{CounterMetrics, SegFileOptions};
use occamy::types::{Result, TypeId, VertexId};
use tempfile::tempdir;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("occamy=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}

fn transfers() -> Arc<EdgeSchema> {
    Arc::new(
        EdgeSchema::new(
            TypeId(42),
            "transfer",
            vec![
                ColumnDef::new("dst", ColumnType::Vertex),
                ColumnDef::new("amount", ColumnType::I64),
                ColumnDef::new("memo", ColumnType::Str),
                ColumnDef::new("flagged", ColumnType::Bool),
            ],
        )
        .expect("schema"),
    )
}

fn build_group(schema: &Arc<EdgeSchema>, source: u64, fanout: u64) -> Result<EdgeGroupBuilder> {
    let mut builder = EdgeGroupBuilder::new(Arc::clone(schema), VertexId(source));
    for i in 0..fanout {
        let memo = format!("memo-{source}-{i}");
        let memo = if i % 4 == 1 {
            ColumnValue::Null
        } else {
            ColumnValue::Str(&memo)
        };
        builder.push_row(&[
            ColumnValue::Vertex(VertexId(1_000 + source * 10 + i)),
            ColumnValue::Int(i as i64 * 25 - 10),
            memo,
            ColumnValue::Null,
        ])?;
    }
    Ok(builder)
}

#[test]
fn fixed_width_column_without_nulls() -> Result<()> {
    let mut bytes = Vec::new();
    let stored: Vec<u32> = (0..10).map(|i| 7 * i + 3).collect();
    for v in &stored {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes.extend_from_slice(&Footer::new(NullState::NoNulls).encode());

    let section = DataSection::new(&bytes, 10, ValueLayout::Fixed { width: 4 })?;
    assert_eq!(section.value::<u32>(3)?, stored[3]);
    assert_eq!(section.bitmap_bytes().len(), 0);
    for row in 0..10 {
        assert!(!section.is_null(row)?);
    }
    Ok(())
}

#[test]
fn mixed_column_reads_physical_bits() -> Result<()> {
    let mut bytes = vec![0u8; 16 * 2];
    let bitmap = [0b1011_0000u8, 0b0000_0001];
    bytes.extend_from_slice(&bitmap);
    bytes.extend_from_slice(&Footer::new(NullState::Mixed).encode());

    let section = DataSection::new(&bytes, 16, ValueLayout::Fixed { width: 2 })?;
    assert!(!section.is_null(0)?);
    assert!(section.is_null(4)?);
    assert!(section.is_null(8)?);
    assert!(!section.is_null(15)?);
    let map = section.null_map().expect("bitmap present");
    for row in 0..16 {
        assert_eq!(section.is_null(row)?, map.test(row)?);
    }
    Ok(())
}

#[test]
fn hand_split_columns_decode_as_group() -> Result<()> {
    let schema = transfers();
    let encoded = build_group(&schema, 5, 9)?.finish();
    let mut ranges = Vec::new();
    let mut at = 0usize;
    for (len, offsets) in encoded.column_lens.iter().zip(&encoded.offsets) {
        let end = at + *len as usize;
        let bytes = &encoded.bytes[at..end];
        ranges.push(match offsets {
            Some(offsets) => ColumnRange::variable(bytes, offsets),
            None => ColumnRange::fixed(bytes),
        });
        at = end;
    }
    let group = EdgeGroup::new(TypeId(42), VertexId(5), &ranges, 9, &schema)?;
    assert_eq!(group.get(0, 2)?, ColumnValue::Vertex(VertexId(1_052)));
    assert_eq!(group.get(1, 0)?, ColumnValue::Int(-10));
    assert_eq!(group.get(2, 4)?, ColumnValue::Str("memo-5-4"));
    assert!(group.is_null(2, 5)?);
    assert_eq!(group.section(3)?.null_state(), NullState::AllNull);
    assert_eq!(group.section(3)?.value_bytes().len(), 0);
    assert_eq!(group.section(0)?.null_state(), NullState::NoNulls);
    assert_eq!(group.section(2)?.null_state(), NullState::Mixed);
    Ok(())
}

#[test]
fn writer_to_disk_and_reopen() -> Result<()> {
    init_tracing();
    let dir = tempdir()?;
    let path = dir.path().join("transfer.seg");
    let manifest_path = dir.path().join("transfer.seg.manifest.json");
    let schema = transfers();

    let metrics = Arc::new(CounterMetrics::default());
    let options = SegFileOptions::default().metrics(metrics.clone());
    let mut writer = SegFileWriter::create(&path, TypeId(42), options.clone())?;
    for (source, fanout) in [(1u64, 3u64), (2, 0), (3, 17)] {
        writer.append(&build_group(&schema, source, fanout)?.finish())?;
    }
    let (_, manifest) = writer.finish()?;
    manifest.save(&manifest_path)?;
    assert_eq!(metrics.snapshot().groups_appended, 3);

    let bytes = fs::read(&path)?;
    let manifest = SegManifest::load(&manifest_path)?;
    let file = SegFile::open(&bytes, &manifest, &schema, &options)?;
    assert_eq!(file.len(), 3);
    assert_eq!(file.row_count(), 20);
    let sources: Vec<u64> = file.iter().map(|g| g.source_vertex().0).collect();
    assert_eq!(sources, vec![1, 2, 3]);
    let again: Vec<u64> = file.iter().map(|g| g.source_vertex().0).collect();
    assert_eq!(sources, again);

    let last = file.iter().last().expect("three groups");
    assert_eq!(last.row_count(), 17);
    assert_eq!(last.get(1, 16)?, ColumnValue::Int(16 * 25 - 10));
    assert_eq!(last.get(2, 13)?, ColumnValue::Null);
    assert_eq!(metrics.snapshot().groups_decoded, 3);
    Ok(())
}

#[test]
fn resume_appends_after_existing_groups() -> Result<()> {
    init_tracing();
    let dir = tempdir()?;
    let path = dir.path().join("resume.seg");
    let schema = transfers();

    let mut writer = SegFileWriter::create(&path, TypeId(42), SegFileOptions::default())?;
    writer.append(&build_group(&schema, 1, 4)?.finish())?;
    let (_, manifest) = writer.finish()?;

    let mut writer = SegFileWriter::resume(&path, manifest, SegFileOptions::default())?;
    let extent = writer.append(&build_group(&schema, 2, 2)?.finish())?.clone();
    assert!(extent.offset > 0);
    let (_, manifest) = writer.finish()?;

    let bytes = fs::read(&path)?;
    let file = SegFile::open(&bytes, &manifest, &schema, &SegFileOptions::default())?;
    let sources: Vec<u64> = file.iter().map(|g| g.source_vertex().0).collect();
    assert_eq!(sources, vec![1, 2]);
    Ok(())
}

#[test]
fn resume_rejects_length_mismatch() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("short.seg");
    let schema = transfers();
    let mut writer = SegFileWriter::create(&path, TypeId(42), SegFileOptions::default())?;
    writer.append(&build_group(&schema, 1, 4)?.finish())?;
    let (_, manifest) = writer.finish()?;

    let bytes = fs::read(&path)?;
    fs::write(&path, &bytes[..bytes.len() - 1])?;
    assert!(SegFileWriter::resume(&path, manifest, SegFileOptions::default()).is_err());
    Ok(())
}

#[test]
fn create_refuses_existing_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("exists.seg");
    fs::write(&path, b"")?;
    assert!(SegFileWriter::create(&path, TypeId(42), SegFileOptions::default()).is_err());
    Ok(())
}
