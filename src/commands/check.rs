// ABOUTME: Check command implementation.
// ABOUTME: Authenticates and lists remote directories without writing anything.

use sitepush::config::Config;
use sitepush::deploy::Deployer;
use sitepush::error::Result;
use sitepush::output::Output;

pub async fn check(config: Config, output: Output) -> Result<()> {
    let deployer = Deployer::from_config(&config)?;

    output.progress(&format!("Checking connection to {}...", config.host.host));
    let report = deployer.check().await?;
    output.progress(&format!("  ✓ Connected and authenticated ({})", report.target));

    match &report.hosting_dirs {
        Some(dirs) => {
            output.progress("  → Hosting directories:");
            for dir in dirs {
                output.progress(&format!("      {}/", dir));
            }
        }
        None if config.host.hosting_root.is_some() => {
            output.warning("hosting root could not be listed");
        }
        None => {}
    }

    match &report.remote_root_entries {
        Some(entries) => {
            output.progress(&format!("  → Contents of {}:", config.host.remote_root));
            for entry in entries {
                let suffix = if entry.is_dir { "/" } else { "" };
                output.progress(&format!("      {}{}", entry.name, suffix));
            }
        }
        None => output.warning(&format!(
            "{} not found (it will be created on first deploy)",
            config.host.remote_root
        )),
    }

    output.success("Remote host reachable");
    Ok(())
}
