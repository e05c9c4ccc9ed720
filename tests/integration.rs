//! Integration tests for `hosts-override`.
//!
//! Tests marked `#[ignore]` require root:
//!
//! ```bash
//! sudo cargo test -- --ignored
//! ```

use async_trait::async_trait;
use hosts_override::block::{self, START_MARKER, count_blocks};
use hosts_override::{
    AlwaysReachable, Expander, HostsFile, OverrideError, OverrideSession, Reachability, Resolve,
    ResolvedEntry, Result, SessionState, parse_requests,
};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

const ORIGINAL: &str = "127.0.0.1\tlocalhost\n::1\tlocalhost ip6-localhost\n# keep me\n";

#[derive(Default)]
struct Static(HashMap<&'static str, Vec<IpAddr>>);

impl Static {
    fn with(mut self, host: &'static str, ips: &[&str]) -> Self {
        self.0
            .insert(host, ips.iter().map(|ip| ip.parse().unwrap()).collect());
        self
    }
}

#[async_trait]
impl Resolve for Static {
    async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>> {
        self.0
            .get(hostname)
            .cloned()
            .ok_or_else(|| OverrideError::Resolution {
                hostname: hostname.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }
}

fn session(dir: &tempfile::TempDir, tokens: &[&str], resolver: Static) -> OverrideSession {
    let path = dir.path().join("hosts");
    let probe: Arc<dyn Reachability> = Arc::new(AlwaysReachable);
    OverrideSession::new(
        parse_requests(tokens).unwrap(),
        HostsFile::with_path(path),
        Expander::new(Arc::new(resolver), probe),
    )
}

fn scratch() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hosts"), ORIGINAL).unwrap();
    dir
}

fn read(dir: &tempfile::TempDir) -> String {
    std::fs::read_to_string(dir.path().join("hosts")).unwrap()
}

// ---------------------------------------------------------------------------
// Tempfile tests (no root required)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn end_to_end() {
    let dir = scratch();
    let resolver = Static::default().with("example.org", &["93.184.216.34"]);
    let s = Arc::new(session(
        &dir,
        &["db,192.168.1.50", "api,example.org"],
        resolver,
    ));

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(Arc::clone(&s).run(async {
        let _ = rx.await;
    }));
    while s.state().await != SessionState::Active {
        tokio::task::yield_now().await;
    }

    let content = read(&dir);
    assert!(content.starts_with(ORIGINAL));
    let lines: Vec<&str> = content[ORIGINAL.len()..]
        .lines()
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();
    assert_eq!(
        lines,
        [
            "192.168.1.50 db",
            "93.184.216.34 api  # IP resolved from example.org"
        ]
    );

    // Simulated termination signal.
    tx.send(()).unwrap();
    running.await.unwrap().unwrap();
    assert_eq!(read(&dir), ORIGINAL);
    assert_eq!(s.state().await, SessionState::Idle);
}

#[tokio::test]
async fn repairs_unclean_shutdown() {
    let dir = scratch();
    let stale: hosts_override::OverrideSet =
        vec![ResolvedEntry::literal("old", "10.10.10.10".parse().unwrap())].into();
    std::fs::write(
        dir.path().join("hosts"),
        format!("{ORIGINAL}{}", block::render(&stale)),
    )
    .unwrap();

    let s = session(&dir, &["new,10.20.30.40"], Static::default());
    s.start().await.unwrap();

    let content = read(&dir);
    assert_eq!(count_blocks(&content), 1);
    assert!(!content.contains("10.10.10.10 old"));
    assert!(content.contains("10.20.30.40 new"));

    s.teardown().await.unwrap();
    assert_eq!(read(&dir), ORIGINAL);
}

#[tokio::test]
async fn at_most_one_block() {
    let dir = scratch();
    let resolver = Static::default().with("pool.internal", &["10.0.0.1", "10.0.0.2"]);
    let s = session(&dir, &["svc,pool.internal", "db,::1"], resolver);

    s.start().await.unwrap();
    for _ in 0..3 {
        s.refresh().await.unwrap().unwrap();
        assert_eq!(read(&dir).matches(START_MARKER).count(), 1);
    }
    assert_eq!(s.state().await, SessionState::Active);

    s.teardown().await.unwrap();
    s.teardown().await.unwrap();
    assert_eq!(read(&dir).matches(START_MARKER).count(), 0);
    assert_eq!(read(&dir), ORIGINAL);
}

#[tokio::test]
async fn non_utf8_hosts_file_round_trips() {
    const RAW: &[u8] = b"127.0.0.1 localhost # caf\xe9\n";

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hosts");
    std::fs::write(&path, RAW).unwrap();

    let resolver = Static::default().with("example.org", &["93.184.216.34"]);
    let s = session(&dir, &["db,192.168.1.50", "api,example.org"], resolver);

    s.start().await.unwrap();
    s.refresh().await.unwrap().unwrap();
    s.refresh().await.unwrap().unwrap();
    assert_eq!(count_blocks(std::fs::read(&path).unwrap()), 1);

    assert!(s.teardown().await.unwrap());
    assert_eq!(std::fs::read(&path).unwrap(), RAW);
}

#[tokio::test]
async fn backup_written_before_mutation() {
    let dir = scratch();
    let s = session(&dir, &["db,192.168.1.50"], Static::default());
    s.start().await.unwrap();

    let backups: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("hosts.backup-"))
        })
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(std::fs::read_to_string(&backups[0]).unwrap(), ORIGINAL);
}

#[tokio::test]
async fn strict_failure_leaves_file_repaired_but_empty_of_overrides() {
    let dir = scratch();
    let stale: hosts_override::OverrideSet =
        vec![ResolvedEntry::literal("old", "10.10.10.10".parse().unwrap())].into();
    std::fs::write(
        dir.path().join("hosts"),
        format!("{ORIGINAL}{}", block::render(&stale)),
    )
    .unwrap();

    let s = session(&dir, &["api,unknown.invalid"], Static::default());
    assert!(s.start().await.is_err());
    assert_eq!(read(&dir), ORIGINAL);
}

#[test]
fn parse_errors_are_usage_errors() {
    let err = parse_requests(["db,10.0.0.1", "db;10.0.0.1"]).unwrap_err();
    assert!(err.is_usage());
}

// ---------------------------------------------------------------------------
// Root-only tests
// ---------------------------------------------------------------------------

#[tokio::test]
#[ignore = "requires root to write the system hosts file"]
async fn real_install_and_teardown() {
    let hosts = HostsFile::new();
    let before = hosts.read().unwrap();

    let probe: Arc<dyn Reachability> = Arc::new(AlwaysReachable);
    let s = OverrideSession::new(
        parse_requests(["hosts-override-test.invalid,127.0.0.2"]).unwrap(),
        hosts.clone(),
        Expander::new(Arc::new(Static::default()), probe),
    );

    s.start().await.unwrap();
    assert!(
        String::from_utf8_lossy(&hosts.read().unwrap())
            .contains("127.0.0.2 hosts-override-test.invalid")
    );

    s.teardown().await.unwrap();
    assert_eq!(hosts.read().unwrap(), before);
}
