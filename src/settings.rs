// src/settings.rs
//! Service configuration.
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. An optional `sbt-registry.toml` in the working directory
//! 3. `SBT__*` environment variables (e.g. `SBT__SERVER__PORT=8080`,
//!    `SBT__STORAGE__SNAPSHOT_PATH=/var/lib/sbt/registry.json`)

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettings {
    /// Registry snapshot file; state is kept in memory only when unset
    pub snapshot_path: Option<PathBuf>,
}

impl Settings {
    /// Loads settings from defaults, the optional config file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(Environment::with_prefix("SBT").separator("__"))
    }

    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .add_source(File::with_name("sbt-registry").required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }
}
