use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use narsync_cli::commands::{build, parse_script, show_config, validate};
use narsync_cli::{Cli, Commands, Config};
use narsync_core::Expectations;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // stdout carries command output.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Commands::Build { lessons, out_dir } => {
            build::run(&mut stdout, &config, &lessons, out_dir.as_deref())?;
        }
        Commands::Validate {
            timeline,
            expected_segments,
            speakers,
            strict,
            json,
        } => {
            let expectations = Expectations {
                segment_count: expected_segments,
                speakers: (!speakers.is_empty()).then_some(speakers),
            };
            validate::run(&mut stdout, &config, &timeline, &expectations, strict, json)?;
        }
        Commands::ParseScript { script, character } => {
            parse_script::run(&mut stdout, &script, &character)?;
        }
        Commands::Config => {
            show_config::run(&mut stdout, &config)?;
        }
    }

    Ok(())
}
