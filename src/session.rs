//! The override session: install, refresh, and guaranteed teardown.
//!
//! ```text
//! Idle -> Installing -> Active -> (Refreshing -> Active)* -> TearingDown -> Idle
//! ```
//!
//! All hosts file mutation happens while holding the session lock, so a
//! refresh's uninstall/install pair and the teardown never interleave. The
//! teardown cancels the refresh token before taking the lock; a refresh that
//! gets the lock afterwards sees the cancellation and writes nothing.

use crate::block;
use crate::config::SessionConfig;
use crate::display::Console;
use crate::entry::{OverrideRequest, OverrideSet};
use crate::error::Result;
use crate::expand::Expander;
use crate::hosts_file::HostsFile;
use crate::resolver::{AlwaysReachable, Reachability, Resolve, ResolverProbe, SystemResolver};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started, or finished.
    Idle,
    /// Backing up, repairing and writing the first block.
    Installing,
    /// A block is installed; waiting for a refresh tick or shutdown.
    Active,
    /// Swapping the installed block for a freshly resolved one.
    Refreshing,
    /// Removing the block before exit.
    TearingDown,
}

#[derive(Debug)]
struct Lifecycle {
    state: SessionState,
    installed: Option<OverrideSet>,
    torn_down: bool,
}

/// One override session against one hosts file.
///
/// Construct once per process and share behind an [`Arc`] with the refresh
/// task.
///
/// # Example
///
/// ```rust,ignore
/// use hosts_override::{OverrideSession, SessionConfig, parse_requests};
/// use std::sync::Arc;
///
/// let requests = parse_requests(["db,192.168.1.50"])?;
/// let session = Arc::new(OverrideSession::from_config(requests, &SessionConfig::new()));
/// session.run(hosts_override::shutdown_signal()).await?;
/// ```
pub struct OverrideSession {
    requests: Vec<OverrideRequest>,
    hosts: HostsFile,
    expander: Expander,
    refresh: Option<Duration>,
    console: Option<Console>,
    lifecycle: Mutex<Lifecycle>,
    cancel: CancellationToken,
}

impl OverrideSession {
    /// Creates an idle session with refreshing disabled and no console.
    #[must_use]
    pub fn new(requests: Vec<OverrideRequest>, hosts: HostsFile, expander: Expander) -> Self {
        Self {
            requests,
            hosts,
            expander,
            refresh: None,
            console: None,
            lifecycle: Mutex::new(Lifecycle {
                state: SessionState::Idle,
                installed: None,
                torn_down: false,
            }),
            cancel: CancellationToken::new(),
        }
    }

    /// Builds a session using the system resolver and the configured probe.
    #[must_use]
    pub fn from_config(requests: Vec<OverrideRequest>, config: &SessionConfig) -> Self {
        let resolver: Arc<dyn Resolve> = Arc::new(SystemResolver);
        let probe: Arc<dyn Reachability> = match &config.probe_host {
            Some(host) => Arc::new(ResolverProbe::new(Arc::clone(&resolver), host.clone())),
            None => Arc::new(AlwaysReachable),
        };

        Self::new(
            requests,
            HostsFile::with_path(&config.hosts_path),
            Expander::new(resolver, probe),
        )
        .with_refresh(config.refresh)
        .with_console(Console::new(config.clear_screen))
    }

    /// Sets the refresh period; `None` disables refreshing.
    #[must_use]
    pub const fn with_refresh(mut self, refresh: Option<Duration>) -> Self {
        self.refresh = refresh;
        self
    }

    /// Prints status to `console` after every install.
    #[must_use]
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = Some(console);
        self
    }

    /// The managed hosts file.
    #[must_use]
    pub const fn hosts(&self) -> &HostsFile {
        &self.hosts
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SessionState {
        self.lifecycle.lock().await.state
    }

    /// The set most recently written to the hosts file, if one is installed.
    pub async fn installed(&self) -> Option<OverrideSet> {
        self.lifecycle.lock().await.installed.clone()
    }

    /// Backs up the file, removes any stale block, resolves every request
    /// strictly and installs the result.
    ///
    /// A backup failure is logged and does not stop the install. A failed
    /// repair does: appending after it could leave two blocks behind.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if a stale block cannot be removed or the new
    /// block cannot be written, or the resolution error if any target fails
    /// to resolve. The session is back in [`SessionState::Idle`] with
    /// nothing installed in every case.
    pub async fn start(&self) -> Result<OverrideSet> {
        let mut lifecycle = self.lifecycle.lock().await;
        lifecycle.state = SessionState::Installing;

        if let Err(e) = self.hosts.snapshot() {
            tracing::warn!(path = %self.hosts.path().display(), error = %e, "Failed to back up hosts file");
        }

        let installed = match self.hosts.uninstall() {
            Ok(_) => match self.expander.strict(&self.requests).await {
                Ok(set) => self.hosts.install(&block::render(&set)).map(|()| set),
                Err(e) => Err(e),
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to remove stale overrides");
                Err(e)
            }
        };
        let set = match installed {
            Ok(set) => set,
            Err(e) => {
                lifecycle.state = SessionState::Idle;
                return Err(e);
            }
        };

        lifecycle.state = SessionState::Active;
        lifecycle.installed = Some(set.clone());
        drop(lifecycle);

        tracing::info!(entries = set.len(), "Overrides active");
        self.show(&set);
        Ok(set)
    }

    /// Re-resolves every request and swaps the installed block.
    ///
    /// Returns `Ok(None)` and leaves the file untouched when resolution is
    /// abandoned, when the session is shutting down, or when it is not
    /// [`SessionState::Active`].
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the old block cannot be removed or the new
    /// one cannot be written. Nothing is appended when the file cannot be
    /// read.
    pub async fn refresh(&self) -> Result<Option<OverrideSet>> {
        if self.cancel.is_cancelled() {
            return Ok(None);
        }

        let Some(set) = self.expander.best_effort(&self.requests).await else {
            return Ok(None);
        };

        let mut lifecycle = self.lifecycle.lock().await;
        if self.cancel.is_cancelled() || lifecycle.state != SessionState::Active {
            tracing::debug!(state = ?lifecycle.state, "Skipping refresh");
            return Ok(None);
        }

        lifecycle.state = SessionState::Refreshing;
        let result = self.reinstall(&set);
        lifecycle.state = SessionState::Active;
        match result {
            Ok(()) => lifecycle.installed = Some(set.clone()),
            Err(e) => {
                lifecycle.installed = None;
                return Err(e);
            }
        }
        drop(lifecycle);

        tracing::info!(entries = set.len(), "Overrides refreshed");
        self.show(&set);
        Ok(Some(set))
    }

    /// Stops refreshing and removes the block. Only the first call touches
    /// the file; later calls return `Ok(false)`.
    ///
    /// Waits for an in-flight refresh write to finish first.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the stripped file cannot be written back.
    pub async fn teardown(&self) -> Result<bool> {
        self.cancel.cancel();

        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.torn_down {
            return Ok(false);
        }

        lifecycle.state = SessionState::TearingDown;
        let result = self.hosts.uninstall();
        lifecycle.state = SessionState::Idle;
        lifecycle.installed = None;
        lifecycle.torn_down = true;
        drop(lifecycle);

        match &result {
            Ok(removed) => tracing::info!(removed, "Hosts file restored"),
            Err(e) => tracing::error!(error = %e, "Failed to restore hosts file"),
        }
        result
    }

    /// Runs the whole session until `shutdown` resolves.
    ///
    /// Installs, starts the refresh task if enabled, waits for `shutdown`,
    /// then tears down. A shutdown that arrives during the initial install
    /// still tears down.
    ///
    /// # Errors
    ///
    /// Returns the initial install error, or the teardown error.
    pub async fn run<F>(self: Arc<Self>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tokio::select! {
            started = self.start() => { started?; }
            () = &mut shutdown => {
                tracing::info!("Shutdown requested during install");
                self.teardown().await?;
                return Ok(());
            }
        }

        let refresher = self
            .refresh
            .map(|interval| Arc::clone(&self).spawn_refresh(interval));

        shutdown.await;
        if let Some(console) = &self.console {
            console.stopping();
        }

        let result = self.teardown().await;
        if let Some(handle) = refresher {
            handle.abort();
        }
        result.map(|_| ())
    }

    /// Spawns the periodic refresh task. It stops when the session is torn
    /// down.
    pub fn spawn_refresh(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = self.cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.refresh().await {
                            tracing::warn!(error = %e, "Refresh failed");
                        }
                    }
                }
            }
            tracing::debug!("Refresh task stopped");
        })
    }

    fn reinstall(&self, set: &OverrideSet) -> Result<()> {
        self.hosts.uninstall()?;
        self.hosts.install(&block::render(set))
    }

    fn show(&self, set: &OverrideSet) {
        if let Some(console) = &self.console {
            console.active(set, self.refresh);
        }
    }
}
