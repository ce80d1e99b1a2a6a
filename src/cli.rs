// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand, ValueEnum};
use sitepush::deploy::Selector;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sitepush")]
#[command(about = "Publish a static site to a git remote and an SFTP host")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output for CI (only the summary)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Output JSON lines for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the config file (default: discover in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new sitepush.yml configuration file
    Init {
        /// Remote host as [user@]host[:port]
        #[arg(long)]
        host: Option<String>,

        /// Absolute destination directory on the remote host
        #[arg(long)]
        remote_root: Option<String>,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Publish the site (both targets unless --only is given)
    Deploy {
        /// Publish to a single target
        #[arg(long, value_enum)]
        only: Option<TargetArg>,
    },

    /// Verify the remote connection and list remote directories (no writes)
    Check,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TargetArg {
    /// The git remote only
    Git,
    /// The remote file host only
    Host,
}

/// Map `--only` onto the deployer's target selection.
pub fn selector(only: Option<TargetArg>) -> Selector {
    match only {
        Some(TargetArg::Git) => Selector::Git,
        Some(TargetArg::Host) => Selector::RemoteHost,
        None => Selector::Both,
    }
}
