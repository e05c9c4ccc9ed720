//! # hosts-override
//!
//! Override hosts file entries for the lifetime of a process.
//!
//! Each `HOSTNAME,TARGET` request maps a hostname to a literal IP, or to
//! every address a target hostname currently resolves to. The resulting
//! entries are appended to the hosts file inside a delimited block that is
//! removed again when the process receives an interrupt or terminate signal.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use hosts_override::{OverrideSession, SessionConfig, parse_requests, shutdown_signal};
//! use std::sync::Arc;
//!
//! let requests = parse_requests(["db,192.168.1.50", "api,example.org"])?;
//! let session = Arc::new(OverrideSession::from_config(requests, &SessionConfig::new()));
//!
//! // Installs, then blocks until SIGINT/SIGTERM and restores the file.
//! session.run(shutdown_signal()).await?;
//! ```
//!
//! ## Crash recovery
//!
//! The block is found by its fixed start and finish markers alone. Every
//! session removes any block already present before installing its own, so
//! a block left behind by a killed process is cleaned up on the next run.
//! A timestamped copy of the file is also written next to it before any
//! change.
//!
//! ## Refresh
//!
//! With a refresh interval, targets are re-resolved periodically and the
//! block is swapped. If the resolver is unreachable or any target fails,
//! the previous block stays in place.
//!
//! ## Permissions
//!
//! Writing the system hosts file requires root (or Administrator). The
//! caller is responsible for privilege elevation.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod config;
pub mod display;
pub mod entry;
pub mod error;
pub mod expand;
pub mod hosts_file;
pub mod resolver;
pub mod session;
pub mod signal;
pub mod util;

pub use config::{DEFAULT_REFRESH_INTERVAL, SessionConfig, parse_interval};
pub use display::Console;
pub use entry::{OverrideRequest, OverrideSet, ResolvedEntry, parse_requests};
pub use error::{OverrideError, Result};
pub use expand::{Expander, Mode};
pub use hosts_file::{HostsFile, default_hosts_path};
pub use resolver::{
    AlwaysReachable, DEFAULT_PROBE_HOST, Reachability, Resolve, ResolverProbe, SystemResolver,
    Target,
};
pub use session::{OverrideSession, SessionState};
pub use signal::shutdown_signal;
