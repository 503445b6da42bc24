//! Package Export CLI
//!
//! Reads stored tenders from a JSON file or a directory of JSON files and
//! writes OCDS release or record packages, one per batch.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use ocds_export::config::OutputFormat;
use ocds_export::{
    package_records, package_releases, ExportConfig, MergeCompiler, PackageMode, SchemaVariant,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "ocds-export")]
#[command(about = "Export stored tenders as OCDS release or record packages")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Tender JSON file, or a directory of them
    #[arg(short, long)]
    input: PathBuf,

    /// Schema variant (overrides config)
    #[arg(long, value_enum)]
    variant: Option<SchemaVariant>,

    /// Write record packages instead of release packages
    #[arg(long)]
    records: bool,

    /// Output directory (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Tenders per package (overrides config)
    #[arg(short = 'n', long)]
    batch_size: Option<usize>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config =
        ExportConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if let Some(variant) = cli.variant {
        config.export.variant = variant;
    }
    if cli.records {
        config.export.mode = PackageMode::Records;
    }
    if let Some(output) = cli.output {
        config.output.path = output;
    }
    if let Some(batch_size) = cli.batch_size {
        config.export.batch_size = batch_size;
    }
    if config.export.batch_size == 0 {
        bail!("batch size must be positive");
    }

    let schema = config.export.variant.schema();
    let output_dir = config.output_path();
    fs::create_dir_all(&output_dir).with_context(|| format!("creating {:?}", output_dir))?;

    println!("📦 OCDS Export");
    println!("  Variant: {} (OCDS {})", config.export.variant, schema.version);
    println!("  Mode:    {:?}", config.export.mode);
    println!("  Output:  {:?}", output_dir);
    println!();

    let tenders = collect_tenders(&cli.input)?;
    println!("🔍 Loaded {} tenders from {:?}", tenders.len(), cli.input);

    let stamp = chrono::Utc::now().timestamp();
    for (n, batch) in tenders.chunks(config.export.batch_size).enumerate() {
        let batch = batch.to_vec();
        match config.export.mode {
            PackageMode::Releases => {
                let package = package_releases(batch, &schema, &config.release);
                let name = format!("release-{}-{}.json", stamp, n);
                write_package(&output_dir.join(&name), &package, config.output.format)?;
                println!("  ✅ {} ({} releases)", name, package.releases.len());
            }
            PackageMode::Records => {
                let package = package_records(batch, &schema, &config.release, &MergeCompiler);
                let name = format!("record-{}-{}.json", stamp, n);
                write_package(&output_dir.join(&name), &package, config.output.format)?;
                println!("  ✅ {} ({} records)", name, package.records.len());
            }
        }
    }

    info!("export finished");
    Ok(())
}

/// Every tender in `input`; a file holds one tender or an array of them
fn collect_tenders(input: &Path) -> anyhow::Result<Vec<Value>> {
    let mut files: Vec<PathBuf> = if input.is_dir() {
        WalkDir::new(input)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map(|x| x == "json").unwrap_or(false))
            .map(|e| e.into_path())
            .collect()
    } else {
        vec![input.to_path_buf()]
    };
    files.sort();

    let mut tenders = Vec::new();
    for path in files {
        let content = fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
        let value: Value =
            serde_json::from_str(&content).with_context(|| format!("parsing {:?}", path))?;
        match value {
            Value::Array(items) => tenders.extend(items),
            other => tenders.push(other),
        }
    }
    Ok(tenders)
}

fn write_package<T: Serialize>(
    path: &Path,
    package: &T,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let content = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(package)?,
        OutputFormat::Compact => serde_json::to_string(package)?,
    };
    fs::write(path, content).with_context(|| format!("writing {:?}", path))?;
    Ok(())
}
