//! Session configuration.

use crate::error::{OverrideError, Result};
use crate::hosts_file::default_hosts_path;
use crate::resolver::DEFAULT_PROBE_HOST;
use std::path::PathBuf;
use std::time::Duration;

/// Default refresh period when refreshing is enabled.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Configuration for one override session.
///
/// # Example
///
/// ```
/// use hosts_override::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::new().with_refresh(Duration::from_secs(60));
///
/// assert_eq!(config.refresh, Some(Duration::from_secs(60)));
/// assert_eq!(config.probe_host.as_deref(), Some("example.com"));
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Hosts file to manage. Defaults to the platform path.
    pub hosts_path: PathBuf,

    /// Refresh period, or `None` to install once and never re-resolve.
    pub refresh: Option<Duration>,

    /// Reference hostname resolved before each refresh to check that the
    /// resolver is up. `None` disables the probe.
    pub probe_host: Option<String>,

    /// Clear the terminal before printing the active mappings.
    pub clear_screen: bool,
}

impl SessionConfig {
    /// Creates a config for the platform hosts file with refreshing disabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hosts_path: default_hosts_path(),
            refresh: None,
            probe_host: Some(DEFAULT_PROBE_HOST.to_string()),
            clear_screen: true,
        }
    }

    /// Overrides the hosts file path.
    #[must_use]
    pub fn with_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.hosts_path = path.into();
        self
    }

    /// Enables refreshing every `interval`.
    #[must_use]
    pub const fn with_refresh(mut self, interval: Duration) -> Self {
        self.refresh = Some(interval);
        self
    }

    /// Sets or disables the reachability probe hostname.
    #[must_use]
    pub fn with_probe_host(mut self, host: Option<String>) -> Self {
        self.probe_host = host;
        self
    }

    /// Enables or disables screen clearing.
    #[must_use]
    pub const fn with_clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    /// Checks value constraints.
    ///
    /// # Errors
    ///
    /// Returns [`OverrideError::InvalidConfig`] for a zero refresh interval
    /// or an empty probe hostname.
    pub fn validate(&self) -> Result<()> {
        if self.refresh.is_some_and(|d| d.is_zero()) {
            return Err(OverrideError::InvalidConfig(
                "refresh interval must be greater than zero".into(),
            ));
        }
        if self.probe_host.as_deref().is_some_and(str::is_empty) {
            return Err(OverrideError::InvalidConfig("probe host is empty".into()));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses an interval such as `300`, `300s`, `5m`, `1h`, `1m30s` or `5m0s`.
///
/// A bare number is seconds. Anything else goes through
/// [`humantime::parse_duration`].
///
/// # Errors
///
/// Returns [`OverrideError::InvalidConfig`] for empty input or anything
/// `humantime` rejects.
pub fn parse_interval(value: &str) -> Result<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return Err(OverrideError::InvalidConfig("interval is empty".into()));
    }
    if let Ok(secs) = value.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    humantime::parse_duration(value)
        .map_err(|e| OverrideError::InvalidConfig(format!("invalid interval {value:?}: {e}")))
}
