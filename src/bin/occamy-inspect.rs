//! Binary entry point for the seg file inspector.
#![forbid(unsafe_code)]

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use occamy::storage::catalog::{MemoryCatalog, SchemaCatalog};
use occamy::storage::sfile::{NullState, SegFile, SegManifest};
use occamy::storage::{CounterMetrics, SegFileOptions};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "occamy-inspect",
    version,
    about = "Inspect Occamy seg files",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "TOML catalog describing edge types")]
    catalog: PathBuf,

    #[arg(
        long,
        value_name = "FILE",
        help = "Manifest sidecar (defaults to <SEGFILE>.manifest.json)"
    )]
    manifest: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(value_name = "SEGFILE")]
    segfile: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Per-group row and null counts
    Summary,
    /// Decoded rows of one group
    Dump {
        #[arg(long, default_value_t = 0, help = "Group index in append order")]
        group: usize,
        #[arg(long, default_value_t = 20, help = "Maximum rows to print")]
        limit: usize,
    },
    /// Re-open with checksum verification
    Verify,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct ColumnSummary {
    name: String,
    ty: &'static str,
    null_state: &'static str,
    nulls: usize,
    bytes: usize,
}

#[derive(Serialize)]
struct GroupSummary {
    index: usize,
    source: u64,
    rows: usize,
    bytes: usize,
    columns: Vec<ColumnSummary>,
}

#[derive(Serialize)]
struct SummaryReport {
    edge_type: u32,
    edge_name: String,
    groups: usize,
    rows: usize,
    file_bytes: usize,
    detail: Vec<GroupSummary>,
}

#[derive(Serialize)]
struct DumpReport {
    group: usize,
    source: u64,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct VerifyReport {
    success: bool,
    groups_decoded: u64,
    error: Option<String>,
}

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("occamy=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn default_manifest_path(segfile: &Path) -> PathBuf {
    let mut name = segfile.as_os_str().to_os_string();
    name.push(".manifest.json");
    PathBuf::from(name)
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let catalog = MemoryCatalog::load(&cli.catalog)?;
    let manifest_path = cli
        .manifest
        .clone()
        .unwrap_or_else(|| default_manifest_path(&cli.segfile));
    let manifest = SegManifest::load(&manifest_path)?;
    let schema = catalog.edge_schema(manifest.edge_type)?;
    let bytes = fs::read(&cli.segfile)?;
    info!(
        segfile = %cli.segfile.display(),
        manifest = %manifest_path.display(),
        groups = manifest.groups.len(),
        "inspect.open"
    );

    match cli.command {
        Command::Summary => {
            let file = SegFile::open(&bytes, &manifest, &schema, &SegFileOptions::default())?;
            let mut detail = Vec::with_capacity(file.len());
            for (index, group) in file.iter().enumerate() {
                let mut columns = Vec::with_capacity(group.column_count());
                for (ordinal, def) in schema.columns.iter().enumerate() {
                    let section = group.section(ordinal)?;
                    columns.push(ColumnSummary {
                        name: def.name.clone(),
                        ty: def.ty.name(),
                        null_state: null_state_name(section.null_state()),
                        nulls: section.null_count(),
                        bytes: section.len(),
                    });
                }
                detail.push(GroupSummary {
                    index,
                    source: group.source_vertex().0,
                    rows: group.row_count(),
                    bytes: group.byte_len(),
                    columns,
                });
            }
            let report = SummaryReport {
                edge_type: schema.edge_type.0,
                edge_name: schema.name.clone(),
                groups: file.len(),
                rows: file.row_count(),
                file_bytes: bytes.len(),
                detail,
            };
            emit(cli.format, &report, print_summary_text)?;
        }
        Command::Dump { group, limit } => {
            let file = SegFile::open(&bytes, &manifest, &schema, &SegFileOptions::default())?;
            let Some(edges) = file.iter().nth(group) else {
                return Err(format!("group {group} not found ({} groups)", file.len()).into());
            };
            let mut rows: Vec<Vec<String>> = Vec::new();
            for row in 0..edges.row_count().min(limit) {
                rows.push(edges.row(row)?.iter().map(ToString::to_string).collect());
            }
            let report = DumpReport {
                group,
                source: edges.source_vertex().0,
                columns: schema.columns.iter().map(|c| c.name.clone()).collect(),
                rows,
            };
            emit(cli.format, &report, print_dump_text)?;
        }
        Command::Verify => {
            let metrics = Arc::new(CounterMetrics::default());
            let options = SegFileOptions::default()
                .verify_checksums(true)
                .metrics(metrics.clone());
            let error = SegFile::open(&bytes, &manifest, &schema, &options)
                .err()
                .map(|err| err.to_string());
            let report = VerifyReport {
                success: error.is_none(),
                groups_decoded: metrics.snapshot().groups_decoded,
                error,
            };
            emit(cli.format, &report, print_verify_text)?;
            if !report.success {
                std::process::exit(2);
            }
        }
    }
    Ok(())
}

fn null_state_name(state: NullState) -> &'static str {
    match state {
        NullState::NoNulls => "none",
        NullState::AllNull => "all",
        NullState::Mixed => "mixed",
    }
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: Fn(&T),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(value),
    }
    Ok(())
}

fn print_summary_text(report: &SummaryReport) {
    println!(
        "edge type {} ({}): {} groups, {} rows, {} bytes",
        report.edge_type, report.edge_name, report.groups, report.rows, report.file_bytes
    );
    for group in &report.detail {
        println!(
            "  group {} source={} rows={} bytes={}",
            group.index, group.source, group.rows, group.bytes
        );
        for column in &group.columns {
            println!(
                "    {:<16} {:<6} nulls={:<6} ({}) bytes={}",
                column.name, column.ty, column.nulls, column.null_state, column.bytes
            );
        }
    }
}

fn print_dump_text(report: &DumpReport) {
    println!("group {} source={}", report.group, report.source);
    println!("  {}", report.columns.join(" | "));
    for row in &report.rows {
        println!("  {}", row.join(" | "));
    }
}

fn print_verify_text(report: &VerifyReport) {
    match &report.error {
        None => println!("ok: {} groups verified", report.groups_decoded),
        Some(err) => println!("FAILED after {} groups: {err}", report.groups_decoded),
    }
}
