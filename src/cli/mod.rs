//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::EngineConfig;
use crate::core::{Error, Result};
use crate::mutation::{BatchItem, Engine};
use crate::report::CompletenessReport;

/// Mutation-based completeness scoring for generated program assertions.
#[derive(Debug, Parser)]
#[command(name = "mutscore", version, about)]
pub struct Cli {
    /// Path to a TOML config file (defaults to ./mutscore.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate a batch of functions and write the completeness report.
    Evaluate {
        /// JSON batch file: a list of {function_id, source, assertions,
        /// test_cases} entries.
        #[arg(long)]
        batch: PathBuf,

        /// Output path for the report JSON.
        #[arg(long)]
        output: PathBuf,

        /// Reuse entries from an existing report at the output path instead
        /// of recomputing them.
        #[arg(long)]
        reuse: bool,

        /// Override the number of mutants per function.
        #[arg(long)]
        mutants: Option<usize>,

        /// Override the generation RNG seed.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate and print a function's mutant batch without executing
    /// anything.
    Mutants {
        /// File containing the function source.
        #[arg(long)]
        source: PathBuf,

        /// Override the number of mutants to generate.
        #[arg(long)]
        count: Option<usize>,

        /// Emit JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },

    /// Write a default config file.
    InitConfig {
        /// Destination path.
        #[arg(long, default_value = "mutscore.toml")]
        path: PathBuf,
    },
}

/// Run a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::load_default(".")?,
    };

    match cli.command {
        Command::Evaluate {
            batch,
            output,
            reuse,
            mutants,
            seed,
        } => {
            if let Some(k) = mutants {
                config.mutants_per_function = k;
            }
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if reuse {
                config.reuse_existing = true;
            }

            let text = std::fs::read_to_string(&batch)?;
            let items: Vec<BatchItem> = serde_json::from_str(&text)?;
            if items.is_empty() {
                return Err(Error::InvalidArgument("batch file is empty".into()));
            }
            info!(functions = items.len(), "loaded batch");

            let previous = if config.reuse_existing && output.exists() {
                Some(CompletenessReport::load(&output)?)
            } else {
                None
            };

            let engine = Engine::with_config(config);
            let report = engine.evaluate_batch(&items, previous.as_ref());
            report.save(&output)?;
            println!("report written to {}", output.display());
            Ok(())
        }

        Command::Mutants {
            source,
            count,
            json,
        } => {
            if let Some(k) = count {
                config.mutants_per_function = k;
            }
            let text = std::fs::read_to_string(&source)?;
            let engine = Engine::with_config(config);
            let listings = engine.list_mutants(&text)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&listings)?);
            } else {
                for listing in &listings {
                    let tag = if listing.flagged_duplicate {
                        " (duplicate)"
                    } else {
                        ""
                    };
                    println!("== {} [{}]{} {}", listing.id, listing.operator, tag, listing.detail);
                    println!("{}", listing.source);
                }
            }
            Ok(())
        }

        Command::InitConfig { path } => {
            if path.exists() {
                return Err(Error::InvalidArgument(format!(
                    "refusing to overwrite existing {}",
                    path.display()
                )));
            }
            std::fs::write(&path, EngineConfig::default_toml())?;
            println!("wrote {}", path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_evaluate_args() {
        let cli = Cli::parse_from([
            "mutscore", "evaluate", "--batch", "b.json", "--output", "r.json", "--reuse",
            "--seed", "9",
        ]);
        match cli.command {
            Command::Evaluate {
                reuse,
                seed,
                mutants,
                ..
            } => {
                assert!(reuse);
                assert_eq!(seed, Some(9));
                assert_eq!(mutants, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_mutants_args() {
        let cli = Cli::parse_from(["mutscore", "mutants", "--source", "f.txt", "--count", "3"]);
        match cli.command {
            Command::Mutants { count, json, .. } => {
                assert_eq!(count, Some(3));
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
