use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mutscore::cli::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("mutscore={default_level}"))),
        )
        .with_target(false)
        .init();

    cli::run(cli)?;
    Ok(())
}
