// ABOUTME: Entry point for the sitepush CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use sitepush::config::{self, Config};
use sitepush::error::Result;
use sitepush::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    match cli.command {
        Some(Commands::Init {
            host,
            remote_root,
            force,
        }) => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, host.as_deref(), remote_root.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Some(Commands::Deploy { only }) => {
            let config = load_config(cli.config.as_deref())?;
            commands::deploy(config, cli::selector(only), output).await
        }
        None => {
            let config = load_config(cli.config.as_deref())?;
            commands::deploy(config, cli::selector(None), output).await
        }
        Some(Commands::Check) => {
            let config = load_config(cli.config.as_deref())?;
            commands::check(config, output).await
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::discover(&env::current_dir()?),
    }
}
