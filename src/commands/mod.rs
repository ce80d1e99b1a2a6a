// ABOUTME: Command module aggregator for the sitepush CLI.
// ABOUTME: Re-exports deploy and check command handlers.

mod check;
mod deploy;

pub use check::check;
pub use deploy::deploy;
