//! # Guard configuration — `guard.toml`
//!
//! Timing knobs for the session guard layer. The web client uses the defaults;
//! a deployment can ship a TOML document (embedded at build time or fetched) to
//! change them.
//!
//! ## Structure
//!
//! ```toml
//! [session]
//! cache_window_secs = 300     # trust a cached role this long without a server check
//!
//! [monitor]
//! poll_interval_secs = 30     # tamper poll period
//! emergency_delay_secs = 3    # warning shown this long before forced sign-out
//! ```
//!
//! All structs derive `Default` with the production values, so a missing or
//! empty document is equivalent to the default configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level guard configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Session validation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a validated role is trusted without asking the server.
    #[serde(default = "default_cache_window")]
    pub cache_window_secs: u64,
}

fn default_cache_window() -> u64 {
    5 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache_window_secs: default_cache_window(),
        }
    }
}

/// Tamper monitor settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_emergency_delay")]
    pub emergency_delay_secs: u64,
}

fn default_poll_interval() -> u64 {
    30
}

fn default_emergency_delay() -> u64 {
    3
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            emergency_delay_secs: default_emergency_delay(),
        }
    }
}

impl GuardConfig {
    /// Builder method to set the role cache window.
    pub fn with_cache_window(mut self, secs: u64) -> Self {
        self.session.cache_window_secs = secs;
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "guard.toml"
    }

    pub fn cache_window(&self) -> Duration {
        Duration::from_secs(self.session.cache_window_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.poll_interval_secs)
    }

    pub fn emergency_delay(&self) -> Duration {
        Duration::from_secs(self.monitor.emergency_delay_secs)
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
