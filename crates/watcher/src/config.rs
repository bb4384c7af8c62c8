//! Watcher configuration
//!
//! Only the debounce duration is required; everything else has a default.
//! Configuration can be built in code or loaded from a TOML file, where the
//! quiet period is given in whole milliseconds:
//!
//! ```toml
//! debounce_ms = 1000
//! ignore_temporary_files = false
//!
//! [ignore]
//! editor_temp_files = true
//! patterns = ["*.part"]
//! ```

use crate::error::{Result, WatchError};
use crate::filter::IgnoreConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default quiet period
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Largest `debounce_ms` accepted from a file or the command line
pub const MAX_DEBOUNCE_MS: u64 = 3_600_000;
const MAX_CAPACITY: usize = 65_536;

/// Watcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatcherConfig {
    /// Quiet period before a pending event settles
    ///
    /// Any duration is accepted in code. The TOML key is `debounce_ms`,
    /// limited to 1-3600000 when loaded from a file.
    #[serde(rename = "debounce_ms", with = "millis")]
    pub debounce: Duration,

    /// Hide files created and removed within one debounce window (default: true)
    pub ignore_temporary_files: bool,

    /// Capacity of each per-path worker inbox (default: 16)
    pub inbound_capacity: usize,

    /// Capacity of the settled-event and error channels (default: 1)
    pub sink_capacity: usize,

    /// Capacity of the raw channels between the event source and the dispatch loop (default: 256)
    pub source_capacity: usize,

    /// Event filtering
    pub ignore: IgnoreConfig,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            ignore_temporary_files: true,
            inbound_capacity: 16,
            sink_capacity: 1,
            source_capacity: 256,
            ignore: IgnoreConfig::default(),
        }
    }
}

impl WatcherConfig {
    /// Default configuration with the given quiet period
    pub fn new(debounce: Duration) -> Self {
        Self::default().with_debounce(debounce)
    }

    /// Replace the quiet period
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        check_debounce_ms(config.debounce)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Render as a TOML document
    ///
    /// The quiet period is rendered in whole milliseconds.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| WatchError::Config(e.to_string()))
    }

    /// Check the channel capacities against their valid range
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("inbound_capacity", self.inbound_capacity),
            ("sink_capacity", self.sink_capacity),
            ("source_capacity", self.source_capacity),
        ] {
            if !(1..=MAX_CAPACITY).contains(&value) {
                return Err(WatchError::Config(format!(
                    "{} must be between 1 and {}, got {}",
                    key, MAX_CAPACITY, value
                )));
            }
        }

        Ok(())
    }
}

/// Range check for quiet periods read from a file
fn check_debounce_ms(debounce: Duration) -> Result<()> {
    let ms = debounce.as_millis();
    if !(1..=u128::from(MAX_DEBOUNCE_MS)).contains(&ms) {
        return Err(WatchError::Config(format!(
            "debounce_ms must be between 1 and {}, got {}",
            MAX_DEBOUNCE_MS, ms
        )));
    }
    Ok(())
}

/// `Duration` as whole milliseconds
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
