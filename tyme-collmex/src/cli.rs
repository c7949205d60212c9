///
/// This module implements the CLI interface for tyme-collmex: command parsing,
/// argument validation, file I/O and the async entrypoint shared by `main` and tests.
///
/// All conversion logic (export model, span splitting, schemas, serialization,
/// upload orchestration) lives in the [`tyme-collmex-core`] crate. This module is
/// strictly glue: read the export, write the Collmex file, optionally upload it.
///
/// ## How To Use
/// - Command line: `tyme-collmex convert export.json --config collmex.yaml`.
/// - Programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`tyme-collmex-core`]: ../../tyme-collmex-core/
use crate::load_config::load_config;
use crate::upload::CollmexClient;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tyme_collmex_core::config::ConversionSettings;
use tyme_collmex_core::convert::convert;
use tyme_collmex_core::publish::publish;
use tyme_collmex_core::schema::SchemaRegistry;
use tyme_collmex_core::serialize::{serialize_counted, DataSet};
use tyme_collmex_core::source::parse_export;

/// CLI for tyme-collmex: convert Tyme exports into Collmex activity imports.
#[derive(Parser)]
#[clap(
    name = "tyme-collmex",
    version,
    about = "Convert Tyme time-tracking exports into Collmex CMXACT import files and upload them"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a Tyme JSON export and optionally upload it to Collmex
    Convert {
        /// Path to the Tyme JSON export
        source: PathBuf,
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Where to write the Collmex file (defaults to the source path with a .csv extension)
        #[clap(long)]
        output: Option<PathBuf>,
        /// Upload regardless of the config's use_api flag
        #[clap(long, conflicts_with = "no_upload")]
        upload: bool,
        /// Never upload, even if the config's use_api flag is set
        #[clap(long)]
        no_upload: bool,
    },
}

/// `export.json` becomes `export.csv`; a `.csv` source gets `.collmex.csv`
/// so it is never overwritten.
pub fn default_output_path(source: &Path) -> PathBuf {
    match source.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => source.with_extension("collmex.csv"),
        _ => source.with_extension("csv"),
    }
}

/// Read, convert and write one export. Returns the converted records for upload.
///
/// Fails instead of writing an empty file when no record survives validation.
pub fn convert_file(
    source: &Path,
    output: &Path,
    settings: &ConversionSettings,
) -> Result<DataSet> {
    let json = fs::read_to_string(source)
        .with_context(|| format!("Failed to read Tyme export {:?}", source))?;
    let export = parse_export(&json).with_context(|| format!("Invalid Tyme export {:?}", source))?;
    let conversion = convert(&export, settings)?;

    for skipped in &conversion.skipped {
        eprintln!("[WARN] Skipped entry #{}: {}", skipped.index, skipped.error);
    }

    let data = conversion.into_data_set();
    let serialized = serialize_counted(&data, &SchemaRegistry::collmex())?;
    if serialized.total_written() == 0 {
        tracing::error!(source = %source.display(), skipped = serialized.skipped, "No Collmex records to write");
        bail!("No Collmex records to write for {:?}", source);
    }
    fs::write(output, &serialized.text)
        .with_context(|| format!("Failed to write Collmex file {:?}", output))?;

    tracing::info!(
        output = %output.display(),
        records = serialized.total_written(),
        skipped = serialized.skipped,
        "Collmex file written"
    );
    println!("Collmex CSV saved: {}", output.display());
    Ok(data)
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Convert {
            source,
            config,
            output,
            upload,
            no_upload,
        } => {
            let config = load_config(config)?;
            config.conversion.trace_loaded();
            tracing::info!(command = "convert", source = %source.display(), "Starting conversion");

            let output = output.unwrap_or_else(|| default_output_path(&source));
            let data = convert_file(&source, &output, &config.conversion)?;

            let should_upload = (config.collmex.use_api || upload) && !no_upload;
            if !should_upload {
                tracing::info!(command = "convert", "Upload disabled, done");
                return Ok(());
            }

            let login = config.collmex.login()?;
            let client = CollmexClient::new(&config.collmex)?;
            match publish(&client, &data, &login, &SchemaRegistry::collmex()).await {
                Ok(report) => {
                    tracing::info!(command = "convert", ?report, "Upload complete");
                    for warning in &report.warnings {
                        eprintln!("[WARN] Collmex {}: {}", warning.code, warning.text);
                    }
                    println!(
                        "Uploaded {} record(s) to Collmex (HTTP {}).",
                        report.records_sent, report.status
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "convert", error = %e, "Upload failed");
                    Err(anyhow::Error::new(e).context("Upload to Collmex failed"))
                }
            }
        }
    }
}
