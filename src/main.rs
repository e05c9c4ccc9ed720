use anyhow::Context;
use clap::{CommandFactory, Parser, error::ErrorKind};
use hosts_override::util::is_elevated;
use hosts_override::{
    DEFAULT_PROBE_HOST, OverrideSession, SessionConfig, parse_interval, parse_requests,
    shutdown_signal,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hosts-override", version)]
#[command(about = "Override hosts file entries for the lifetime of the process")]
struct Cli {
    /// Overrides as HOSTNAME,TARGET where TARGET is an IP or a resolvable hostname
    #[arg(required = true, value_name = "HOSTNAME,TARGET")]
    overrides: Vec<String>,

    /// Periodically re-resolve hostname targets
    #[arg(short, long)]
    refresh: bool,

    /// Refresh interval, e.g. 300, 90s, 5m, 5m0s, 1h
    #[arg(short = 'i', long, default_value = "5m", value_parser = parse_interval)]
    refresh_interval: Duration,

    /// Hostname resolved before each refresh to check the resolver is up
    #[arg(long, default_value = DEFAULT_PROBE_HOST, conflicts_with = "no_probe")]
    probe_host: String,

    /// Skip the reachability check before refreshing
    #[arg(long)]
    no_probe: bool,

    /// Do not clear the terminal when printing status
    #[arg(long)]
    no_clear: bool,
}

impl Cli {
    fn config(&self) -> SessionConfig {
        let config = SessionConfig::new()
            .with_probe_host((!self.no_probe).then(|| self.probe_host.clone()))
            .with_clear_screen(!self.no_clear);
        if self.refresh {
            config.with_refresh(self.refresh_interval)
        } else {
            config
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let requests = match parse_requests(&cli.overrides) {
        Ok(requests) => requests,
        Err(e) => Cli::command().error(ErrorKind::InvalidValue, e).exit(),
    };
    let config = cli.config();
    if let Err(e) = config.validate() {
        Cli::command().error(ErrorKind::InvalidValue, e).exit();
    }

    if !is_elevated() {
        tracing::warn!(
            path = %config.hosts_path.display(),
            "Not running as root, writing the hosts file will likely fail"
        );
    }

    let session = Arc::new(OverrideSession::from_config(requests, &config));
    session
        .run(shutdown_signal())
        .await
        .with_context(|| format!("overriding {}", config.hosts_path.display()))?;

    Ok(())
}
