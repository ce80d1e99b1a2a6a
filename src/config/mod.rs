// ABOUTME: Configuration types and parsing for sitepush.yml.
// ABOUTME: Handles YAML parsing, discovery, defaults and env var credentials.

mod env_value;
mod host;
mod init;

pub use env_value::EnvValue;
pub use host::{HostAddress, HostConfig};
pub use init::init_config;

use crate::error::{Error, Result};
use crate::filter::PathFilter;
use crate::vcs::GitCli;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "sitepush.yml";
pub const CONFIG_FILENAME_ALT: &str = "sitepush.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".sitepush/config.yml";

/// Names never uploaded unless the config overrides the list.
pub const DEFAULT_EXCLUDE: &[&str] = &[
    ".git",
    "node_modules",
    ".env",
    "package.json",
    "package-lock.json",
    ".gitignore",
    "README.md",
    CONFIG_FILENAME,
    CONFIG_FILENAME_ALT,
    ".sitepush",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Site root, relative to the directory holding the config file.
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub protected: Vec<String>,

    #[serde(default)]
    pub git: GitConfig,

    pub host: HostConfig,

    /// Directory the config was loaded from.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_message_prefix")]
    pub message_prefix: String,
    #[serde(default = "default_git_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            branch: default_branch(),
            message_prefix: default_message_prefix(),
            timeout: default_git_timeout(),
        }
    }
}

fn default_exclude() -> Vec<String> {
    DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_message_prefix() -> String {
    "Deploy".to_string()
}

fn default_git_timeout() -> Duration {
    Duration::from_secs(300)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.base_dir = config_base_dir(path);
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("loading config from {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn validate(&self) -> Result<()> {
        self.host.validate()?;
        self.path_filter()?;
        if self.git.remote.trim().is_empty() || self.git.branch.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "git remote and branch cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Local site root.
    pub fn local_root(&self) -> PathBuf {
        let base = if self.base_dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            self.base_dir.as_path()
        };
        match &self.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => base.join(root),
            None => base.to_path_buf(),
        }
    }

    pub fn path_filter(&self) -> Result<PathFilter> {
        PathFilter::new(self.exclude.iter().cloned(), &self.protected)
            .map_err(|e| Error::InvalidConfig(format!("protected entry: {}", e)))
    }

    pub fn git_client(&self) -> GitCli {
        GitCli::new(&self.local_root(), &self.git.remote, &self.git.branch)
            .timeout(self.git.timeout)
    }

    pub fn template() -> Self {
        Config {
            root: None,
            exclude: default_exclude(),
            protected: vec!["blog".to_string()],
            git: GitConfig::default(),
            host: HostConfig::new(
                "deploy@www.example.com",
                "/var/www/vhosts/example.com/httpdocs",
            ),
            base_dir: PathBuf::new(),
        }
    }
}

/// `.sitepush/config.yml` belongs to the project directory, not `.sitepush/`.
fn config_base_dir(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if parent.file_name().is_some_and(|name| name == ".sitepush") {
        parent.parent().unwrap_or(parent).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}
