//! Configuration for the orchestra daemons.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $ORCHESTRA_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/orchestra/config.toml
//!   3. ~/.config/orchestra/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::wire;

/// Top-level configuration, shared by auditord and musiciand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestraConfig {
    pub network: NetworkConfig,
    pub auditor: AuditorConfig,
    pub musician: MusicianConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// IPv4 address of the interface to use for multicast.
    /// 0.0.0.0 lets the kernel choose.
    pub interface: String,
    /// Multicast group announcements travel on.
    pub multicast_group: String,
    /// UDP port announcements are sent to.
    pub announce_port: u16,
    /// TCP port the auditor serves snapshots on.
    pub snapshot_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditorConfig {
    /// Seconds of silence after which a musician stops counting as active.
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicianConfig {
    /// Milliseconds between announcements.
    pub interval_millis: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for OrchestraConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            auditor: AuditorConfig::default(),
            musician: MusicianConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            interface: "0.0.0.0".to_string(),
            multicast_group: wire::MULTICAST_GROUP.to_string(),
            announce_port: wire::ANNOUNCE_PORT,
            snapshot_port: wire::SNAPSHOT_PORT,
        }
    }
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            ttl_secs: wire::ACTIVE_TTL_SECS,
        }
    }
}

impl Default for MusicianConfig {
    fn default() -> Self {
        Self {
            interval_millis: wire::ANNOUNCE_INTERVAL_MILLIS,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("orchestra")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl OrchestraConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            OrchestraConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config from an explicit file. No env overrides are applied.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("ORCHESTRA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&OrchestraConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply ORCHESTRA_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ORCHESTRA_NETWORK__INTERFACE") {
            self.network.interface = v;
        }
        if let Ok(v) = std::env::var("ORCHESTRA_NETWORK__MULTICAST_GROUP") {
            self.network.multicast_group = v;
        }
        if let Ok(v) = std::env::var("ORCHESTRA_NETWORK__ANNOUNCE_PORT") {
            if let Ok(p) = v.parse() {
                self.network.announce_port = p;
            }
        }
        if let Ok(v) = std::env::var("ORCHESTRA_NETWORK__SNAPSHOT_PORT") {
            if let Ok(p) = v.parse() {
                self.network.snapshot_port = p;
            }
        }
        if let Ok(v) = std::env::var("ORCHESTRA_AUDITOR__TTL_SECS") {
            if let Ok(t) = v.parse() {
                self.auditor.ttl_secs = t;
            }
        }
        if let Ok(v) = std::env::var("ORCHESTRA_MUSICIAN__INTERVAL_MILLIS") {
            if let Ok(ms) = v.parse() {
                self.musician.interval_millis = ms;
            }
        }
    }
}
