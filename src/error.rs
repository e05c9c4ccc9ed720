//! Error types.

use thiserror::Error;

/// Result alias for override operations.
pub type Result<T> = std::result::Result<T, OverrideError>;

/// Errors returned by override operations.
#[derive(Debug, Error)]
pub enum OverrideError {
    /// Hosts file I/O failed (typically `PermissionDenied` on `/etc/hosts`).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A command-line token is not of the form `HOSTNAME,TARGET`.
    #[error("invalid override {token:?}: {reason}")]
    InvalidRequest {
        /// The offending token as supplied.
        token: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A target hostname could not be resolved.
    #[error("could not resolve {hostname}: {source}")]
    Resolution {
        /// The hostname that failed to resolve.
        hostname: String,
        /// Underlying resolver error.
        #[source]
        source: std::io::Error,
    },

    /// The reachability probe failed, so the resolver is assumed to be down.
    #[error("resolver unreachable (probe {probe} failed): {source}")]
    Unreachable {
        /// The reference hostname used for probing.
        probe: String,
        /// Underlying resolver error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl OverrideError {
    /// Returns `true` if the underlying I/O error is `PermissionDenied`.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied)
    }

    /// Returns `true` for errors caused by malformed user input.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::InvalidRequest { .. } | Self::InvalidConfig(_))
    }
}
