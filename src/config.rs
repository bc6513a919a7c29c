//! Configuration types for edge-dns.
//!
//! Loaded once by the binary and passed down explicitly; nothing reads
//! settings from global state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cloudflare::CLOUDFLARE_API;
use crate::registry::ServerRegistry;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Domains records may be created for
    pub domains: Vec<String>,

    /// Servers that `server` records may point at
    #[serde(default)]
    pub servers: ServerRegistry,

    /// Records document, relative to the config file
    #[serde(default = "default_records_path")]
    pub records: PathBuf,

    /// Transforms document, relative to the config file
    #[serde(default = "default_transforms_path")]
    pub transforms: PathBuf,

    /// Fixed zone identifiers used by `--offline` runs
    #[serde(default)]
    pub zones: BTreeMap<String, String>,

    #[serde(default)]
    pub cloudflare: CloudflareConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Cloudflare API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudflareConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the API token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// GCP project for Secret Manager, used when the env var is unset
    #[serde(default)]
    pub gcp_project: Option<String>,

    #[serde(default = "default_secret_name")]
    pub secret_name: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CloudflareConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token_env: default_token_env(),
            gcp_project: None,
            secret_name: default_secret_name(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter (e.g., "info", "edge_dns=debug,warn").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones
    #[serde(default)]
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

fn default_records_path() -> PathBuf {
    PathBuf::from("records.yml")
}

fn default_transforms_path() -> PathBuf {
    PathBuf::from("transforms.yml")
}

fn default_api_base() -> String {
    CLOUDFLARE_API.to_string()
}

fn default_token_env() -> String {
    "CLOUDFLARE_API_TOKEN".to_string()
}

fn default_secret_name() -> String {
    "cloudflare-api-token".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Parse a configuration document; relative paths resolve against `base_dir`
    pub fn parse(input: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config: Config =
            serde_yaml::from_str(input).context("Failed to parse configuration")?;
        config.base_dir = base_dir.into();
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&content, base_dir)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn records_path(&self) -> PathBuf {
        self.base_dir.join(&self.records)
    }

    pub fn transforms_path(&self) -> PathBuf {
        self.base_dir.join(&self.transforms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let config = Config::parse("domains: [example.com]\n", "/etc/edge-dns").unwrap();

        assert_eq!(config.domains, vec!["example.com".to_string()]);
        assert!(config.servers.is_empty());
        assert_eq!(config.records_path(), PathBuf::from("/etc/edge-dns/records.yml"));
        assert_eq!(
            config.transforms_path(),
            PathBuf::from("/etc/edge-dns/transforms.yml")
        );
        assert_eq!(config.cloudflare.api_base, CLOUDFLARE_API);
        assert_eq!(config.cloudflare.token_env, "CLOUDFLARE_API_TOKEN");
        assert_eq!(config.cloudflare.timeout(), Duration::from_secs(30));
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
domains:
  - example.com
  - example.org
servers:
  waffle-primary:
    v4: 203.0.113.7
    v6: "2001:db8::7"
records: dns/records.yml
zones:
  example.com: zid-1
cloudflare:
  gcp_project: infra
  timeout_secs: 5
telemetry:
  log_level: debug
  json: true
"#,
            "",
        )
        .unwrap();

        assert_eq!(config.domains.len(), 2);
        assert!(config.servers.get("waffle-primary").is_some());
        assert_eq!(config.records_path(), PathBuf::from("dns/records.yml"));
        assert_eq!(config.zones["example.com"], "zid-1");
        assert_eq!(config.cloudflare.gcp_project.as_deref(), Some("infra"));
        assert_eq!(config.cloudflare.secret_name, "cloudflare-api-token");
        assert!(config.telemetry.json);
    }

    #[test]
    fn test_missing_domains_is_an_error() {
        assert!(Config::parse("servers: {}\n", "").is_err());
    }
}
