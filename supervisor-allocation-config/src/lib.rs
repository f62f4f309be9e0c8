use core::fmt::{Debug, Display};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;
use supervisor_allocation_database::Phase;

/// Whether a student may withdraw a pending application outside of the selection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    #[default]
    AnyPhase,
    StudentSelectingOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: SocketAddr,
    pub initial_phase: Phase,
    /// Confirm quota for roster instructors that don't specify one.
    pub default_confirm_quota: u32,
    pub cancel_policy: CancelPolicy,
    pub snapshot_path: Option<PathBuf>,
    pub roster_path: Option<PathBuf>,
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 3000)),
            initial_phase: Phase::StudentSelecting,
            default_confirm_quota: 5,
            cancel_policy: CancelPolicy::AnyPhase,
            snapshot_path: None,
            roster_path: None,
            log_filter: None,
        }
    }
}

#[derive(thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] figment::Error),
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[must_use]
pub fn figment() -> Figment {
    Figment::new()
        .merge(Toml::file("sva.toml"))
        .merge(Env::prefixed("SVA_"))
}

pub fn get_config() -> Result<Config, ConfigError> {
    Ok(figment().extract()?)
}
