// ABOUTME: Config scaffolding for new sites.
// ABOUTME: Creates sitepush.yml template files.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config, HostAddress};

pub fn init_config(
    dir: &Path,
    host: Option<&str>,
    remote_root: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(h) = host {
        HostAddress::parse(h).map_err(Error::InvalidConfig)?;
        config.host.host = h.to_string();
    }

    if let Some(root) = remote_root {
        config.host.remote_root = root.to_string();
        config.host.validate()?;
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    let exclude = config
        .exclude
        .iter()
        .map(|name| format!("  - \"{}\"", name))
        .collect::<Vec<_>>()
        .join("\n");
    let protected = config
        .protected
        .iter()
        .map(|name| format!("  - \"{}\"", name))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"# Names never uploaded (exact path segment match)
exclude:
{exclude}

# Remote subtrees that are never created, overwritten or deleted
protected:
{protected}

git:
  remote: {remote}
  branch: {branch}

host:
  host: {host}
  remote_root: {remote_root}
  password:
    env: SITEPUSH_PASSWORD
  # SSH host key verification
  # Set to false to require a pre-populated ~/.ssh/known_hosts
  # trust_first_connection: true
"#,
        remote = config.git.remote,
        branch = config.git.branch,
        host = config.host.host,
        remote_root = config.host.remote_root,
    )
}
