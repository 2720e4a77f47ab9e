use anyhow::Result;
use clap::Parser;
use gleaner_common::observability::init_logging;
use gleaner_config::{GleanerConfig, GleanerConfigLoader};
use tracing::debug;

use commands::Cli;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Env overrides win over the file.
    let cfg: GleanerConfig = GleanerConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()?;

    let log_file = init_logging(cfg.logging.to_log_config("gleaner"))?;
    debug!(path = %log_file.display(), "logging initialised");

    commands::run(cli.command, cfg).await
}
