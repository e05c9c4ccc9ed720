//! Internal utilities.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns `true` if the process runs with an effective UID of 0.
///
/// Always `true` on non-unix targets, where elevation cannot be checked this
/// way and the write itself reports `PermissionDenied`.
#[must_use]
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: `geteuid` has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Seconds since the Unix epoch, or 0 if the clock is before it.
#[must_use]
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
