//! Hosts file mutation.
//!
//! Every operation is a discrete open-modify-close; the file is never held
//! open between calls. This module assumes it is the only writer of the
//! file for the lifetime of a session.

use crate::block;
use crate::error::Result;
use crate::util::unix_timestamp;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default hosts file on unix-like systems.
#[cfg(not(windows))]
const DEFAULT_HOSTS_PATH: &str = "/etc/hosts";

/// Returns the platform hosts file path.
///
/// On Windows this is `%SystemRoot%\System32\drivers\etc\hosts`, falling back
/// to `C:\Windows` when `SystemRoot` is unset.
#[must_use]
pub fn default_hosts_path() -> PathBuf {
    #[cfg(windows)]
    {
        let root = std::env::var_os("SystemRoot").unwrap_or_else(|| "C:\\Windows".into());
        PathBuf::from(root).join(r"System32\drivers\etc\hosts")
    }
    #[cfg(not(windows))]
    {
        PathBuf::from(DEFAULT_HOSTS_PATH)
    }
}

/// Applies and removes the managed block in a hosts file.
///
/// # Lifecycle
///
/// 1. [`snapshot`](Self::snapshot) copies the file aside for manual recovery.
/// 2. [`uninstall`](Self::uninstall) clears any block left by a crash.
/// 3. [`install`](Self::install) appends the rendered block.
/// 4. [`uninstall`](Self::uninstall) again on shutdown.
///
/// # Permissions
///
/// The system hosts file is writable only by root/Administrator. The caller
/// must handle elevation.
///
/// # Example
///
/// ```rust,ignore
/// use hosts_override::{HostsFile, block};
///
/// let hosts = HostsFile::new();
/// hosts.install(&block::render(&set))?;
/// // ...
/// hosts.uninstall()?;
/// ```
#[derive(Debug, Clone)]
pub struct HostsFile {
    path: PathBuf,
}

impl HostsFile {
    /// Targets the platform default hosts file.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: default_hosts_path(),
        }
    }

    /// Targets a custom file (useful for testing).
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the hosts file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole file as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`OverrideError::Io`](crate::OverrideError::Io) if the file
    /// cannot be read.
    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }

    /// Appends a rendered block, creating the file if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`OverrideError::Io`](crate::OverrideError::Io) if the file
    /// cannot be opened or written.
    pub fn install(&self, rendered: &str) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        file.write_all(rendered.as_bytes())?;
        file.flush()?;

        tracing::info!(
            path = %self.path.display(),
            bytes = rendered.len(),
            "Installed hosts overrides"
        );
        Ok(())
    }

    /// Removes the managed block, rewriting the file in full.
    ///
    /// Returns `true` if a block was removed. A missing file or a file
    /// with no block is left untouched. The file is handled as raw bytes,
    /// so content that is not UTF-8 survives unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`OverrideError::Io`](crate::OverrideError::Io) if the file
    /// exists but cannot be read, or if the stripped content cannot be
    /// written back. Nothing is written after a failed read, so callers can
    /// rely on an error meaning "no block was removed".
    pub fn uninstall(&self) -> Result<bool> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Hosts file does not exist, skipping");
                return Ok(false);
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to read hosts file, nothing removed"
                );
                return Err(e.into());
            }
        };

        let stripped = block::strip(&content);
        if stripped.len() == content.len() {
            tracing::debug!(path = %self.path.display(), "No managed block present");
            return Ok(false);
        }

        std::fs::write(&self.path, stripped)?;
        tracing::info!(path = %self.path.display(), "Removed hosts overrides");
        Ok(true)
    }

    /// Copies the current file to `<path>.backup-<unix-timestamp>`.
    ///
    /// Backups are never cleaned up automatically.
    ///
    /// # Errors
    ///
    /// Returns [`OverrideError::Io`](crate::OverrideError::Io) if the file
    /// cannot be read or the copy cannot be written.
    pub fn snapshot(&self) -> Result<PathBuf> {
        let backup = self.backup_path(unix_timestamp());
        let content = std::fs::read(&self.path)?;
        std::fs::write(&backup, content)?;

        tracing::info!(
            path = %self.path.display(),
            backup = %backup.display(),
            "Backed up hosts file"
        );
        Ok(backup)
    }

    fn backup_path(&self, timestamp: u64) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".backup-{timestamp}"));
        PathBuf::from(name)
    }
}

impl Default for HostsFile {
    fn default() -> Self {
        Self::new()
    }
}
