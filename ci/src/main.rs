use std::sync::Arc;

use clap::Parser;
use dagger_sdk::logging::TracingLogger;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = cli::Cli::parse();
    gradle_service::logging::install(cli.log_level)?;

    let config = cli.pipeline.load()?;
    if let cli::Command::Config = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let cfg = dagger_sdk::Config::new(
        None,
        None,
        None,
        None,
        Some(Arc::new(TracingLogger::default())),
    );

    dagger_sdk::connect_opts(cfg, |client| async move {
        commands::run(cli, config, client).await
    })
    .await?;

    Ok(())
}
