// SPDX-License-Identifier: MIT

//! Server configuration.
//!
//! Defaults live in code; a TOML file may override them and `MAESTRO_*`
//! environment variables override the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// REST listener port.
    pub http_port: u16,
    /// WebSocket bridge port (`ws://host:<ws_port>`, no path).
    pub ws_port: u16,
    /// Where the JSON collections live.
    pub state_dir: PathBuf,
    /// Base URL advertised to spawned agents; defaults to the local HTTP
    /// listener.
    pub server_url: Option<String>,
    /// Command the host runs to start an agent.
    pub agent_command: String,
    /// Root for spawn manifests.
    pub sessions_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let maestro = home.join(".maestro");
        Self {
            http_port: 8700,
            ws_port: 8701,
            state_dir: maestro.join("state"),
            server_url: None,
            agent_command: "claude".into(),
            sessions_dir: maestro.join("sessions"),
        }
    }
}

/// On-disk shape; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    http_port: Option<u16>,
    ws_port: Option<u16>,
    state_dir: Option<PathBuf>,
    server_url: Option<String>,
    agent_command: Option<String>,
    sessions_dir: Option<PathBuf>,
}

/// Configuration loading failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config at {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("cannot parse config at {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("invalid {var}: {value}")]
    BadEnv { var: &'static str, value: String },
}

impl Config {
    /// Load: defaults ← optional TOML file ← `MAESTRO_*` environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = path {
            if path.exists() {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let file: FileConfig = toml::from_str(&raw).map_err(|source| {
                    ConfigError::Parse { path: path.to_path_buf(), source }
                })?;
                config.apply_file(file);
            }
        }

        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(port) = file.http_port {
            self.http_port = port;
        }
        if let Some(port) = file.ws_port {
            self.ws_port = port;
        }
        if let Some(dir) = file.state_dir {
            self.state_dir = dir;
        }
        if file.server_url.is_some() {
            self.server_url = file.server_url;
        }
        if let Some(command) = file.agent_command {
            self.agent_command = command;
        }
        if let Some(dir) = file.sessions_dir {
            self.sessions_dir = dir;
        }
    }

    fn apply_env(
        &mut self,
        get: impl Fn(&'static str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = get("MAESTRO_HTTP_PORT") {
            self.http_port = value
                .parse()
                .map_err(|_| ConfigError::BadEnv { var: "MAESTRO_HTTP_PORT", value })?;
        }
        if let Some(value) = get("MAESTRO_WS_PORT") {
            self.ws_port = value
                .parse()
                .map_err(|_| ConfigError::BadEnv { var: "MAESTRO_WS_PORT", value })?;
        }
        if let Some(value) = get("MAESTRO_STATE_DIR") {
            self.state_dir = PathBuf::from(value);
        }
        if let Some(value) = get("MAESTRO_SERVER_URL") {
            self.server_url = Some(value);
        }
        if let Some(value) = get("MAESTRO_AGENT_COMMAND") {
            self.agent_command = value;
        }
        if let Some(value) = get("MAESTRO_SESSIONS_DIR") {
            self.sessions_dir = PathBuf::from(value);
        }
        Ok(())
    }

    /// URL spawned agents call back to.
    pub fn advertised_url(&self) -> String {
        self.server_url
            .clone()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", self.http_port))
    }
}
