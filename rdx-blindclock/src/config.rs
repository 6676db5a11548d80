//! Defines all configuration structures for the blind clock binaries.
//!
//! These structs are deserialized with `serde` from a TOML file layered with
//! `BLINDCLOCK__*` environment variables through the `config` crate. The file
//! supplies the HTTP bind address, the venue timezone, the static staff
//! directory and the tournaments that seed the in-memory repository.

use crate::access::StaffEntry;
use crate::engine::DEFAULT_EVENT_CAPACITY;
use crate::tournament::TournamentRecord;
use anyhow::Context;
use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::net::SocketAddr;

/// Prefix of environment overrides, e.g. `BLINDCLOCK__SERVER__BIND`.
pub const ENV_PREFIX: &str = "BLINDCLOCK";

/// The top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BlindClockConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// The timezone wall-clock times are rendered in for staff. Uses IANA
    /// names (e.g. "America/Las_Vegas"). Defaults to UTC.
    #[serde(default = "default_timezone")]
    pub venue_timezone: Tz,

    /// Capacity of the clock event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    #[serde(default)]
    pub staff: Vec<StaffEntry>,

    /// Tournament records loaded into the repository at startup.
    #[serde(default)]
    pub tournaments: Vec<TournamentRecord>,
}

/// Settings of the HTTP action/query surface.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl BlindClockConfig {
    /// Loads configuration from `path` (if given and present) and the environment.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        let config: Self = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("failed to read blind clock configuration")?
            .try_deserialize()
            .context("invalid blind clock configuration")?;
        config.validated()
    }

    /// Parses configuration from TOML text, without environment overrides.
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: Self = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .context("failed to parse blind clock configuration")?
            .try_deserialize()
            .context("invalid blind clock configuration")?;
        config.validated()
    }

    /// Refuses seed tournaments whose stored level is outside their structure.
    fn validated(self) -> anyhow::Result<Self> {
        for tournament in &self.tournaments {
            tournament
                .validate()
                .context("invalid seed tournament in blind clock configuration")?;
        }
        Ok(self)
    }
}

impl Default for BlindClockConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            venue_timezone: default_timezone(),
            event_capacity: default_event_capacity(),
            staff: Vec::new(),
            tournaments: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

// --- Default value functions for serde ---

fn default_timezone() -> Tz {
    Tz::UTC
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7878))
}
