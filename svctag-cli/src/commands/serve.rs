//! Serve command - run the REST facade.

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use tracing::info;

use super::{build_client, load_config};
use crate::Cli;
use crate::server::{AppState, router};

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Bind host (default from config).
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (default from config).
    #[arg(long, short)]
    pub port: Option<u16>,
}

/// Runs the serve command until Ctrl-C.
pub async fn run(args: &ServeArgs, cli: &Cli) -> Result<()> {
    let mut config = load_config(cli)?;
    if let Some(host) = &args.host {
        config.server_host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }

    let client = build_client(&config)?;
    let app = router(AppState::new(Arc::new(client), config.concurrency));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot bind {addr}"))?;
    info!(addr = %addr, "Listening");
    if !cli.quiet {
        eprintln!("svctag API listening on http://{addr}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")
}
