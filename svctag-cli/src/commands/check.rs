//! Check command - look up a single service tag.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use svctag_batch::{CsvExporter, ExportLayout};
use svctag_core::EntitlementLookup;
use tracing::info;

use super::{build_client, load_config};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Service tag to look up.
    pub tag: String,

    /// Also write the entitlements to this CSV file.
    #[arg(long, short)]
    pub export: Option<PathBuf>,

    /// Include asset columns in the exported CSV.
    #[arg(long)]
    pub detailed: bool,
}

/// Runs the check command.
pub async fn run(args: &CheckArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let client = build_client(&config)?;

    let data = client.lookup(&args.tag).await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_asset(&data));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(data.as_ref())?);
        }
    }

    if let Some(path) = &args.export {
        let layout = if args.detailed {
            ExportLayout::Detailed
        } else {
            ExportLayout::Default
        };
        let csv = CsvExporter::new()
            .with_delimiter(config.csv_delimiter)
            .with_encoding(config.csv_encoding)
            .with_layout(layout)
            .asset_to_csv(&data, None)?;
        std::fs::write(path, csv).with_context(|| format!("Cannot write {}", path.display()))?;
        info!(path = %path.display(), rows = data.entitlements.len(), "Exported entitlements");
    }

    Ok(())
}
