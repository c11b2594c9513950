//! Application configuration.
//!
//! Values come from an optional TOML file (`appointment.toml` by default)
//! overridden by `APPOINTMENT__SECTION__KEY` environment variables.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        self.server.host_ip()?;
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.storage.backend == StorageBackend::Neo4j {
            let neo4j = &self.storage.neo4j;
            if neo4j.uri.is_empty() {
                return Err("storage.neo4j.uri must not be empty".into());
            }
            if neo4j.max_connections == 0 {
                return Err("storage.neo4j.max_connections must be > 0".into());
            }
            if neo4j.fetch_size == 0 {
                return Err("storage.neo4j.fetch_size must be > 0".into());
            }
        }
        Ok(())
    }

    /// Listen address. Call after [`AppConfig::validate`]; an unparsable
    /// host falls back to loopback.
    pub fn addr(&self) -> SocketAddr {
        let host = self
            .server
            .host_ip()
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    4 * 1024 * 1024
}

impl ServerConfig {
    /// Parses `host` as an IP literal. `localhost` means the IPv4 loopback.
    pub fn host_ip(&self) -> Result<IpAddr, String> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(IpAddr::V4(Ipv4Addr::LOCALHOST));
        }
        self.host
            .parse()
            .map_err(|_| format!("server.host must be an IP address or localhost, got {:?}", self.host))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Neo4j,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub neo4j: Neo4jConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    #[serde(default = "default_neo4j_uri")]
    pub uri: String,
    #[serde(default = "default_neo4j_user")]
    pub user: String,
    /// Prefer APPOINTMENT__STORAGE__NEO4J__PASSWORD over the file.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default = "default_neo4j_fetch_size")]
    pub fetch_size: usize,
    #[serde(default = "default_neo4j_max_connections")]
    pub max_connections: usize,
}

fn default_neo4j_uri() -> String {
    "bolt://localhost:7687".into()
}
fn default_neo4j_user() -> String {
    "neo4j".into()
}
fn default_neo4j_fetch_size() -> usize {
    200
}
fn default_neo4j_max_connections() -> usize {
    16
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: default_neo4j_uri(),
            user: default_neo4j_user(),
            password: String::new(),
            database: None,
            fetch_size: default_neo4j_fetch_size(),
            max_connections: default_neo4j_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum resources per submitted document after bundle flattening.
    /// `0` disables the limit.
    #[serde(default = "default_max_bundle_entries")]
    pub max_bundle_entries: usize,
}

fn default_max_bundle_entries() -> usize {
    1000
}

impl IngestConfig {
    pub fn bundle_limit(&self) -> Option<usize> {
        (self.max_bundle_entries > 0).then_some(self.max_bundle_entries)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_bundle_entries: default_max_bundle_entries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_FILE: &str = "appointment.toml";
    pub const ENV_PREFIX: &str = "APPOINTMENT";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if !pathbuf.exists() {
                    return Err(format!("config file not found: {p}"));
                }
                builder = builder.add_source(File::from(pathbuf));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., APPOINTMENT__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
