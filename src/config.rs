// Config: three keys under [disks-poweroff]. Malformed values fall back to
// documented defaults with a warning; loading never fails.

use crate::device::DeviceId;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;

#[derive(Debug, Clone)]
pub struct Config {
    /// Cycle period.
    pub polling_interval: Duration,
    /// Idle duration before a spin-down is triggered.
    pub timeout: Duration,
    /// Normalized device names from config; empty means "track every
    /// discovered device".
    pub devices: Vec<DeviceId>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            polling_interval: Duration::from_secs(DEFAULT_POLLING_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            devices: Vec::new(),
        }
    }
}

// Raw layer keeps the numeric keys as toml::Value so a bad type on one key
// degrades that key alone instead of failing the whole parse.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    #[serde(rename = "disks-poweroff")]
    disks_poweroff: RawSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSection {
    polling_interval: Option<toml::Value>,
    timeout: Option<toml::Value>,
    devices: Option<String>,
}

impl Config {
    /// Reads the config file. Any problem (missing file, bad TOML, bad
    /// values) degrades to defaults so the daemon always starts.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => Self::load_from_str(&s),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Config file unreadable, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> Self {
        let raw: RawConfig = match toml::from_str(s) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Config file malformed, using defaults");
                return Self::default();
            }
        };
        let section = raw.disks_poweroff;
        let polling_interval = seconds_or_default(
            section.polling_interval.as_ref(),
            "polling_interval",
            DEFAULT_POLLING_INTERVAL_SECS,
        );
        let timeout = seconds_or_default(section.timeout.as_ref(), "timeout", DEFAULT_TIMEOUT_SECS);
        let devices = section
            .devices
            .as_deref()
            .map(parse_device_list)
            .unwrap_or_default();
        Self {
            polling_interval: Duration::from_secs(polling_interval),
            timeout: Duration::from_secs(timeout),
            devices,
        }
    }
}

/// Accepts a non-negative integer number of seconds; anything else warns and
/// falls back to the default.
fn seconds_or_default(value: Option<&toml::Value>, key: &'static str, default: u64) -> u64 {
    match value {
        None => default,
        Some(toml::Value::Integer(n)) if *n >= 0 => *n as u64,
        Some(other) => {
            tracing::warn!(key, value = %other, default, "Invalid config value, using default");
            default
        }
    }
}

/// Splits a comma-separated device list, normalizing each entry.
pub fn parse_device_list(raw: &str) -> Vec<DeviceId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(DeviceId::normalize)
        .collect()
}
