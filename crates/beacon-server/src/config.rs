//! Server configuration.
//!
//! Settings are layered: compiled-in defaults, then the first `beacon.toml`
//! found on the search path, then `BEACON_*` environment overrides. Every
//! section and field is optional in the file.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Bind address for the relay itself.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Endpoint paths for the two namespaces.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_chat_path")]
    pub chat_path: String,
    #[serde(default = "default_video_path")]
    pub video_path: String,
}

/// Handshake credential verification.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret access tokens are signed with.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
}

/// Per-connection resource limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Largest inbound frame accepted, in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

/// Prometheus exporter.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_chat_path() -> String {
    "/chat".to_string()
}

fn default_video_path() -> String {
    "/video".to_string()
}

fn default_jwt_secret() -> String {
    "beacon-dev-secret".to_string()
}

fn default_max_message_size() -> usize {
    beacon_protocol::MAX_EVENT_SIZE
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            chat_path: default_chat_path(),
            video_path: default_video_path(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            host: default_host(),
            port: default_metrics_port(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the first file found on the search
    /// path, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::from_first_file()?.unwrap_or_default();
        config.apply_env();
        config.validate()?;
        if config.auth.jwt_secret == default_jwt_secret() {
            warn!("Using the built-in development JWT secret; set BEACON_JWT_SECRET in production");
        }
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("failed to parse configuration")
    }

    fn from_first_file() -> Result<Option<Self>> {
        for candidate in Self::search_paths() {
            if !candidate.exists() {
                continue;
            }
            let raw = std::fs::read_to_string(&candidate)
                .with_context(|| format!("failed to read {}", candidate.display()))?;
            let config = Self::from_toml(&raw)
                .with_context(|| format!("failed to parse {}", candidate.display()))?;
            info!(path = %candidate.display(), "Loaded configuration file");
            return Ok(Some(config));
        }
        Ok(None)
    }

    fn search_paths() -> Vec<PathBuf> {
        [
            "beacon.toml",
            "~/.config/beacon/beacon.toml",
            "/etc/beacon/beacon.toml",
        ]
        .iter()
        .map(|path| PathBuf::from(shellexpand::tilde(path).into_owned()))
        .collect()
    }

    fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("BEACON_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("BEACON_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %port, "Ignoring unparseable BEACON_PORT"),
            }
        }
        if let Ok(secret) = std::env::var("BEACON_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
    }

    fn validate(&self) -> Result<()> {
        for path in [&self.transport.chat_path, &self.transport.video_path] {
            if !path.starts_with('/') {
                bail!("endpoint path {path:?} must start with '/'");
            }
        }
        if self.transport.chat_path == self.transport.video_path {
            bail!("chat and video endpoints must use distinct paths");
        }
        Ok(())
    }

    /// Socket address the relay binds.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.server.host, self.server.port))
    }
}

impl MetricsConfig {
    /// Socket address the exporter binds.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid metrics address {}:{}", self.host, self.port))
    }
}
