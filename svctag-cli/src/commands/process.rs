//! Process command - batch lookups from a CSV file.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use svctag_batch::{
    BatchProcessor, CsvExporter, ExportLayout, ImportOptions, import_tags_from_path,
    write_failures_csv,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{build_client, load_config};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input CSV with one service tag per row.
    pub input: PathBuf,

    /// Output CSV for entitlement rows.
    #[arg(long, short, default_value = "entitlements.csv")]
    pub output: PathBuf,

    /// Tag column name (default: auto-detect, then first column).
    #[arg(long)]
    pub column: Option<String>,

    /// Include asset columns (name, service tag, product, ship date, country).
    #[arg(long)]
    pub detailed: bool,

    /// Write failed rows to this CSV file.
    #[arg(long)]
    pub failures: Option<PathBuf>,

    /// Lookups in flight (default from config).
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Runs the process command.
pub async fn run(args: &ProcessArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    let mut options = ImportOptions::default();
    if let Some(column) = &args.column {
        options = options.with_column(column);
    }
    let import = import_tags_from_path(&args.input, &options)?;
    for skipped in import.skipped() {
        warn!(row = skipped.row, reason = %skipped.reason, "Skipping row");
    }

    let client = build_client(&config)?;
    let processor = BatchProcessor::new(Arc::new(client))
        .with_concurrency(args.concurrency.unwrap_or(config.concurrency));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing lookups in flight");
            on_signal.cancel();
        }
    });

    let result = processor.process_import_with_cancel(&import, &cancel).await;

    let layout = if args.detailed {
        ExportLayout::Detailed
    } else {
        ExportLayout::Default
    };
    let csv = CsvExporter::new()
        .with_delimiter(config.csv_delimiter)
        .with_encoding(config.csv_encoding)
        .with_layout(layout)
        .to_csv(&result)?;
    std::fs::write(&args.output, csv)
        .with_context(|| format!("Cannot write {}", args.output.display()))?;
    info!(path = %args.output.display(), "Wrote entitlements");

    if let Some(path) = &args.failures {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        write_failures_csv(std::io::BufWriter::new(file), &result, config.csv_delimiter)?;
        info!(path = %path.display(), "Wrote failure report");
    }

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_batch(&result));
            println!("Output: {}", args.output.display());
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_batch(&result)?);
        }
    }

    Ok(())
}
