use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use ghstats::cli::Cli;
use ghstats::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Arc::new(cli.into_config()?);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after saving the cache");
            on_interrupt.cancel();
        }
    });

    let outcome = ghstats::run(Arc::clone(&config), cancel)
        .await
        .with_context(|| format!("collecting statistics for {}", config.user))?;

    if config.output.is_none() {
        print!("{}", outcome.report);
    }
    Ok(())
}
