// ABOUTME: Remote file host configuration.
// ABOUTME: Accepts "host", "user@host", "host:port" or "user@host:port" in the host field.

use super::EnvValue;
use crate::error::{Error, Result};
use crate::sftp::RemoteTarget;
use crate::ssh::SessionConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<EnvValue>,
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    pub remote_root: String,
    #[serde(default)]
    pub hosting_root: Option<String>,
    #[serde(default = "default_trust_first_connection")]
    pub trust_first_connection: bool,
    #[serde(default)]
    pub known_hosts: Option<PathBuf>,
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
    #[serde(default = "default_transfer_timeout", with = "humantime_serde")]
    pub transfer_timeout: Duration,
}

fn default_trust_first_connection() -> bool {
    true
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_transfer_timeout() -> Duration {
    Duration::from_secs(300)
}

/// Parsed `[user@]host[:port]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAddress {
    pub host: String,
    pub port: Option<u16>,
    pub user: Option<String>,
}

impl HostAddress {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("host address cannot be empty".to_string());
        }

        let (user_part, rest) = if let Some(at_pos) = s.find('@') {
            (Some(&s[..at_pos]), &s[at_pos + 1..])
        } else {
            (None, s)
        };

        let (host, port) = if let Some(colon_pos) = rest.rfind(':') {
            let port_str = &rest[colon_pos + 1..];
            let port = port_str
                .parse::<u16>()
                .map_err(|_| format!("invalid port: {}", port_str))?;
            (&rest[..colon_pos], Some(port))
        } else {
            (rest, None)
        };

        if host.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }
        if user_part.is_some_and(str::is_empty) {
            return Err("user cannot be empty".to_string());
        }

        Ok(HostAddress {
            host: host.to_string(),
            port,
            user: user_part.map(|s| s.to_string()),
        })
    }
}

impl HostConfig {
    /// Minimal config for `host` with everything else defaulted.
    pub fn new(host: impl Into<String>, remote_root: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            user: None,
            password: None,
            key_path: None,
            remote_root: remote_root.into(),
            hosting_root: None,
            trust_first_connection: default_trust_first_connection(),
            known_hosts: None,
            connect_timeout: default_connect_timeout(),
            transfer_timeout: default_transfer_timeout(),
        }
    }

    /// Explicit `port`/`user` fields win over the address shorthand.
    pub fn address(&self) -> Result<HostAddress> {
        let mut address = HostAddress::parse(&self.host).map_err(Error::InvalidConfig)?;
        if self.port.is_some() {
            address.port = self.port;
        }
        if self.user.is_some() {
            address.user = self.user.clone();
        }
        Ok(address)
    }

    pub fn validate(&self) -> Result<()> {
        self.address()?;
        let root = self.remote_root.trim_end_matches('/');
        if !self.remote_root.starts_with('/') || root.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "remote_root must be an absolute directory other than '/': {}",
                self.remote_root
            )));
        }
        if let Some(hosting_root) = &self.hosting_root
            && !hosting_root.starts_with('/')
        {
            return Err(Error::InvalidConfig(format!(
                "hosting_root must be absolute: {}",
                hosting_root
            )));
        }
        Ok(())
    }

    /// Resolve credentials and build the connection descriptor.
    pub fn remote_target(&self) -> Result<RemoteTarget> {
        self.validate()?;
        let address = self.address()?;

        let user = address
            .user
            .unwrap_or_else(|| std::env::var("USER").unwrap_or_else(|_| "root".to_string()));

        let mut session = SessionConfig::new(address.host, user)
            .port(address.port.unwrap_or(22))
            .trust_on_first_use(self.trust_first_connection)
            .connect_timeout(self.connect_timeout);

        if let Some(password) = &self.password {
            session = session.password(password.resolve()?);
        }
        if let Some(key_path) = &self.key_path {
            session = session.key_path(key_path);
        }
        if let Some(known_hosts) = &self.known_hosts {
            session = session.known_hosts_path(known_hosts);
        }

        let mut target = RemoteTarget::new(session, self.remote_root.trim_end_matches('/'))
            .transfer_timeout(self.transfer_timeout);
        if let Some(hosting_root) = &self.hosting_root {
            target = target.hosting_root(hosting_root.clone());
        }
        Ok(target)
    }
}
