// src/config/model.rs

use serde::Deserialize;
use std::time::Duration;

use crate::types::{DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_DELAY, WatchOptions};

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [watch]
/// poll_interval_ms = 30000
/// retry_delay_ms = 200
/// notify = true
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Period of the metadata poller, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay before retrying a failed read, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Subscribe to OS change notifications in addition to polling.
    #[serde(default = "default_notify")]
    pub notify: bool,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY.as_millis() as u64
}

fn default_notify() -> bool {
    true
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            notify: default_notify(),
        }
    }
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    watch: WatchSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(watch: WatchSection) -> Self {
        Self { watch }
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            poll_interval: Duration::from_millis(self.watch.poll_interval_ms),
            retry_delay: Duration::from_millis(self.watch.retry_delay_ms),
            notify: self.watch.notify,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(WatchSection::default())
    }
}
