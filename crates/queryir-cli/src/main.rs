use anyhow::Result;
use clap::Parser;
use tracing::debug;

use queryir_cli::{cli::Cli, commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for rendered output
    let level = cli.level_filter();
    let env_filter = format!("queryir={},queryir_cli={},qir={}", level, level, level);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .init();

    debug!(level = %level, "logging initialized");

    let output = commands::execute(cli.command, cli.config)?;
    println!("{}", output);
    Ok(())
}
