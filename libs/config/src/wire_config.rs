//! Wire Configuration Module
//!
//! Connection timeouts and record extent limits for gadget connections.
//! Loaded from an optional TOML file, an optional environment-specific
//! overlay, and `GADGET_`-prefixed environment variables, in that order.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use gadget_codec::WireLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default connect timeout (milliseconds)
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Default write timeout (milliseconds)
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 30_000;

/// Prefix of environment variable overrides (`GADGET_LIMITS__MAX_SAMPLE_ELEMENTS`)
pub const ENV_PREFIX: &str = "GADGET";

/// Settings for one gadget connection
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct WireConfig {
    /// Peer to connect to, `host:port`; `${VAR}` references are expanded
    pub peer_address: Option<String>,

    pub connect_timeout_ms: u64,

    /// 0 blocks until the next record arrives
    pub read_timeout_ms: u64,

    /// 0 blocks until the send completes
    pub write_timeout_ms: u64,

    /// Disable Nagle so small headers are not held back
    pub nodelay: bool,

    /// Extent limits applied before allocating record buffers
    pub limits: WireLimits,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            peer_address: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: 0,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
            nodelay: true,
            limits: WireLimits::default(),
        }
    }
}

impl WireConfig {
    /// Load configuration from files with environment overrides
    ///
    /// `environment` selects `<base dir>/environments/<name>.toml`.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        Self::load_with_prefix(base_path, environment, ENV_PREFIX)
    }

    /// [`WireConfig::load`] reading overrides from `<env_prefix>_*` variables
    pub fn load_with_prefix(
        base_path: Option<&Path>,
        environment: Option<&str>,
        env_prefix: &str,
    ) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(base) = base_path {
            debug!("Loading wire config: {:?}", base);
            builder = builder.add_source(File::from(base).required(true));
        }

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = base_path
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("config"))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (`__` for nesting)
        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: WireConfig = builder
            .build()
            .context("Failed to build wire configuration")?
            .try_deserialize()
            .context("Failed to deserialize wire configuration")?;

        config.expand_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Expand environment variables in string values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        if let Some(peer) = &self.peer_address {
            let expanded = shellexpand::env(peer).context("Failed to expand peer address")?;
            self.peer_address = Some(expanded.to_string());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.limits.max_sample_elements == 0 {
            bail!("limits.max_sample_elements must be greater than zero");
        }
        if self.limits.max_trajectory_elements == 0 {
            bail!("limits.max_trajectory_elements must be greater than zero");
        }
        if self.connect_timeout_ms == 0 {
            bail!("connect_timeout_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }
}
