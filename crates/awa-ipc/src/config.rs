// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Harness configuration.
//!
//! Either built with one of the presets or loaded from a TOML file. IPC
//! ports may be a single port or a list to rotate through, so consecutive
//! test runs do not trip over sockets still held by a previous daemon.

use crate::daemon::{ClientArgs, ContentType, ServerArgs, DEFAULT_READY_TIMEOUT};
use crate::error::IpcError;
use crate::transport::IpcChannel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// One IPC port, or a pool of ports picked by rotation index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    Single(u16),
    Rotating(Vec<u16>),
}

impl PortSpec {
    /// Ports `start..end`.
    pub fn range(start: u16, end: u16) -> Self {
        Self::Rotating((start..end).collect())
    }

    /// Port for rotation step `index`; `None` for an empty pool.
    pub fn pick(&self, index: usize) -> Option<u16> {
        match self {
            Self::Single(port) => Some(*port),
            Self::Rotating(ports) if ports.is_empty() => None,
            Self::Rotating(ports) => Some(ports[index % ports.len()]),
        }
    }

    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        let ports: &[u16] = match self {
            Self::Single(port) => std::slice::from_ref(port),
            Self::Rotating(ports) => ports,
        };
        if ports.is_empty() {
            return Err(ConfigError::Invalid(format!("{} has no ports", field)));
        }
        if ports.contains(&0) {
            return Err(ConfigError::Invalid(format!("{} contains port 0", field)));
        }
        Ok(())
    }
}

impl From<u16> for PortSpec {
    fn from(port: u16) -> Self {
        Self::Single(port)
    }
}

/// Rotation counter, owned by whoever starts harnesses in sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortRotation {
    index: usize,
}

impl PortRotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(index: usize) -> Self {
        Self { index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn advance(&mut self) {
        self.index = self.index.wrapping_add(1);
    }
}

/// Harness configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Start the server daemon instead of attaching to a running one.
    #[serde(default)]
    pub spawn_server_daemon: bool,

    #[serde(default)]
    pub spawn_client_daemon: bool,

    #[serde(default = "default_server_ipc_port")]
    pub server_ipc_port: PortSpec,

    #[serde(default = "default_client_ipc_port")]
    pub client_ipc_port: PortSpec,

    /// Address the server daemon binds its CoAP socket to.
    #[serde(default = "default_server_address")]
    pub server_address: String,

    #[serde(default = "default_server_coap_port")]
    pub server_coap_port: u16,

    #[serde(default = "default_client_coap_port")]
    pub client_coap_port: u16,

    #[serde(default = "default_server_log_file")]
    pub server_log_file: PathBuf,

    #[serde(default = "default_client_log_file")]
    pub client_log_file: PathBuf,

    /// Factory bootstrap file handed to the client daemon.
    #[serde(default = "default_bootstrap_config_file")]
    pub bootstrap_config_file: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_definitions_file: Option<PathBuf>,

    #[serde(default = "default_client_endpoint_name")]
    pub client_endpoint_name: String,

    /// MIME name of the CoAP content type the server should prefer.
    #[serde(default = "default_server_content_type")]
    pub server_content_type: String,

    /// Bound on daemon readiness and client registration.
    #[serde(default = "default_ipc_timeout_ms")]
    pub ipc_timeout_ms: u64,
}

fn default_server_ipc_port() -> PortSpec {
    PortSpec::Single(54321)
}

fn default_client_ipc_port() -> PortSpec {
    PortSpec::Single(12345)
}

fn default_server_address() -> String {
    "127.0.0.1".to_string()
}

fn default_server_coap_port() -> u16 {
    5683
}

fn default_client_coap_port() -> u16 {
    6000
}

fn default_server_log_file() -> PathBuf {
    PathBuf::from("awa_serverd.log")
}

fn default_client_log_file() -> PathBuf {
    PathBuf::from("awa_clientd.log")
}

fn default_bootstrap_config_file() -> PathBuf {
    PathBuf::from("../../localhost.bsc")
}

fn default_client_endpoint_name() -> String {
    "TestClient".to_string()
}

fn default_server_content_type() -> String {
    ContentType::default().mime().to_string()
}

fn default_ipc_timeout_ms() -> u64 {
    DEFAULT_READY_TIMEOUT.as_millis() as u64
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::standalone()
    }
}

impl HarnessConfig {
    /// Attach to daemons that are already running.
    pub fn standalone() -> Self {
        Self {
            spawn_server_daemon: false,
            spawn_client_daemon: false,
            server_ipc_port: default_server_ipc_port(),
            client_ipc_port: default_client_ipc_port(),
            server_address: default_server_address(),
            server_coap_port: default_server_coap_port(),
            client_coap_port: default_client_coap_port(),
            server_log_file: default_server_log_file(),
            client_log_file: default_client_log_file(),
            bootstrap_config_file: default_bootstrap_config_file(),
            object_definitions_file: None,
            client_endpoint_name: default_client_endpoint_name(),
            server_content_type: default_server_content_type(),
            ipc_timeout_ms: default_ipc_timeout_ms(),
        }
    }

    /// Spawn both daemons on rotating IPC ports.
    pub fn spawning() -> Self {
        Self {
            spawn_server_daemon: true,
            spawn_client_daemon: true,
            server_ipc_port: PortSpec::range(61731, 61741),
            client_ipc_port: PortSpec::range(61742, 61752),
            server_coap_port: 6101,
            client_coap_port: 6102,
            client_endpoint_name: "imgClient".to_string(),
            ..Self::standalone()
        }
    }

    /// Load and validate a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server_ipc_port.validate("server_ipc_port")?;
        self.client_ipc_port.validate("client_ipc_port")?;

        if self.server_address.is_empty() {
            return Err(ConfigError::Invalid("server_address is empty".into()));
        }
        if self.client_endpoint_name.is_empty() {
            return Err(ConfigError::Invalid("client_endpoint_name is empty".into()));
        }
        if self.ipc_timeout_ms == 0 {
            return Err(ConfigError::Invalid("ipc_timeout_ms must be positive".into()));
        }
        if self.spawn_server_daemon && self.server_coap_port == 0 {
            return Err(ConfigError::Invalid("server_coap_port is 0".into()));
        }
        if self.spawn_client_daemon && self.client_coap_port == 0 {
            return Err(ConfigError::Invalid("client_coap_port is 0".into()));
        }
        self.content_type()?;
        Ok(())
    }

    pub fn content_type(&self) -> Result<ContentType, ConfigError> {
        self.server_content_type
            .parse()
            .map_err(|e: IpcError| ConfigError::Invalid(e.to_string()))
    }

    pub fn ipc_timeout(&self) -> Duration {
        Duration::from_millis(self.ipc_timeout_ms)
    }

    /// Pick concrete ports for this run and advance `rotation`.
    pub fn resolve(&self, rotation: &mut PortRotation) -> Result<ResolvedConfig, ConfigError> {
        self.validate()?;
        let index = rotation.index();
        rotation.advance();

        let pick = |spec: &PortSpec, field: &str| {
            spec.pick(index)
                .ok_or_else(|| ConfigError::Invalid(format!("{} has no ports", field)))
        };
        let resolved = ResolvedConfig {
            server_ipc_port: pick(&self.server_ipc_port, "server_ipc_port")?,
            client_ipc_port: pick(&self.client_ipc_port, "client_ipc_port")?,
            content_type: self.content_type()?,
            config: self.clone(),
        };
        tracing::debug!(
            rotation = index,
            server_ipc_port = resolved.server_ipc_port,
            client_ipc_port = resolved.client_ipc_port,
            "harness ports resolved"
        );
        Ok(resolved)
    }
}

/// A [`HarnessConfig`] with concrete ports.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    config: HarnessConfig,
    server_ipc_port: u16,
    client_ipc_port: u16,
    content_type: ContentType,
}

impl ResolvedConfig {
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn server_ipc_port(&self) -> u16 {
        self.server_ipc_port
    }

    pub fn client_ipc_port(&self) -> u16 {
        self.client_ipc_port
    }

    pub fn server_ipc(&self) -> IpcChannel {
        IpcChannel::localhost(self.server_ipc_port)
    }

    pub fn client_ipc(&self) -> IpcChannel {
        IpcChannel::localhost(self.client_ipc_port)
    }

    pub fn ipc_timeout(&self) -> Duration {
        self.config.ipc_timeout()
    }

    pub fn server_args(&self) -> ServerArgs {
        ServerArgs {
            address: self.config.server_address.clone(),
            coap_port: self.config.server_coap_port,
            ipc_port: self.server_ipc_port,
            log_file: self.config.server_log_file.clone(),
            content_type: self.content_type,
        }
    }

    pub fn client_args(&self) -> ClientArgs {
        ClientArgs {
            coap_port: self.config.client_coap_port,
            ipc_port: self.client_ipc_port,
            log_file: self.config.client_log_file.clone(),
            endpoint_name: self.config.client_endpoint_name.clone(),
            bootstrap_config: self.config.bootstrap_config_file.clone(),
            object_definitions: self.config.object_definitions_file.clone(),
        }
    }
}
