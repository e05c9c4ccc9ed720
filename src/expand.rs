//! Expansion of override requests into concrete entries.

use crate::entry::{OverrideRequest, OverrideSet, ResolvedEntry};
use crate::error::Result;
use crate::resolver::{Reachability, Resolve, Target};
use std::sync::Arc;

/// How resolution failures are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Initial install: any failure is returned to the caller.
    Strict,
    /// Scheduled refresh: any failure abandons the whole pass.
    BestEffort,
}

/// Turns requests into an [`OverrideSet`] using a resolver and a probe.
#[derive(Clone)]
pub struct Expander {
    resolver: Arc<dyn Resolve>,
    probe: Arc<dyn Reachability>,
}

impl Expander {
    /// Creates an expander.
    #[must_use]
    pub fn new(resolver: Arc<dyn Resolve>, probe: Arc<dyn Reachability>) -> Self {
        Self { resolver, probe }
    }

    /// Expands `requests` in order under `mode`.
    ///
    /// Literal targets yield one entry without provenance. Hostname targets
    /// yield one entry per resolved address, in resolver order, with no
    /// de-duplication. `Ok(None)` is only returned in [`Mode::BestEffort`].
    ///
    /// # Errors
    ///
    /// In [`Mode::Strict`], returns the first resolution error.
    pub async fn expand(
        &self,
        requests: &[OverrideRequest],
        mode: Mode,
    ) -> Result<Option<OverrideSet>> {
        match mode {
            Mode::Strict => self.strict(requests).await.map(Some),
            Mode::BestEffort => Ok(self.best_effort(requests).await),
        }
    }

    /// Expands `requests`, failing on the first target that does not resolve.
    ///
    /// # Errors
    ///
    /// Returns [`OverrideError::Resolution`](crate::OverrideError::Resolution)
    /// for the first failing target.
    pub async fn strict(&self, requests: &[OverrideRequest]) -> Result<OverrideSet> {
        self.resolve_all(requests).await.map_err(|e| {
            tracing::error!(error = %e, "Could not resolve overrides");
            e
        })
    }

    /// Expands `requests` for an unattended refresh.
    ///
    /// Runs the reachability probe first. Any probe or resolution failure
    /// abandons the whole pass and returns `None`; the caller must keep
    /// whatever block is currently installed.
    pub async fn best_effort(&self, requests: &[OverrideRequest]) -> Option<OverrideSet> {
        if requests.is_empty() {
            return Some(OverrideSet::default());
        }

        if let Err(e) = self.probe.probe().await {
            tracing::warn!(error = %e, "Resolver unreachable, keeping current overrides");
            return None;
        }

        match self.resolve_all(requests).await {
            Ok(set) => Some(set),
            Err(e) => {
                tracing::warn!(error = %e, "Target no longer resolves, keeping current overrides");
                None
            }
        }
    }

    async fn resolve_all(&self, requests: &[OverrideRequest]) -> Result<OverrideSet> {
        let mut entries = Vec::with_capacity(requests.len());
        for request in requests {
            match Target::classify(&request.target) {
                Target::LiteralIp(ip) => {
                    entries.push(ResolvedEntry::literal(&request.hostname, ip));
                }
                Target::NeedsResolution => {
                    let ips = self.resolver.resolve(&request.target).await?;
                    tracing::debug!(
                        hostname = %request.hostname,
                        target = %request.target,
                        count = ips.len(),
                        "Expanded override"
                    );
                    entries.extend(ips.into_iter().map(|ip| {
                        ResolvedEntry::resolved(&request.hostname, ip, &request.target)
                    }));
                }
            }
        }
        Ok(entries.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OverrideError;
    use crate::resolver::AlwaysReachable;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::net::IpAddr;

    struct Table(HashMap<&'static str, Vec<IpAddr>>);

    #[async_trait]
    impl Resolve for Table {
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

    struct Unreachable;

    #[async_trait]
    impl Reachability for Unreachable {
        async fn probe(&self) -> Result<()> {
            Err(OverrideError::Unreachable {
                probe: "reference.test".into(),
                source: std::io::Error::other("offline"),
            })
        }
    }

    fn table() -> Arc<Table> {
        let mut map = HashMap::new();
        map.insert(
            "pool.internal",
            vec!["10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap()],
        );
        map.insert("example.org", vec!["93.184.216.34".parse().unwrap()]);
        Arc::new(Table(map))
    }

    fn expander() -> Expander {
        Expander::new(table(), Arc::new(AlwaysReachable))
    }

    #[tokio::test]
    async fn fans_out_one_entry_per_address() {
        let requests = [OverrideRequest::new("svc", "pool.internal")];
        let set = expander()
            .expand(&requests, Mode::Strict)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(set.len(), 2);
        for (entry, ip) in set.iter().zip(["10.0.0.1", "10.0.0.2"]) {
            assert_eq!(entry.hostname, "svc");
            assert_eq!(entry.ip.to_string(), ip);
            assert_eq!(entry.resolved_from.as_deref(), Some("pool.internal"));
        }
    }

    #[tokio::test]
    async fn preserves_request_order() {
        let requests = [
            OverrideRequest::new("db", "192.168.1.50"),
            OverrideRequest::new("api", "example.org"),
            OverrideRequest::new("db", "192.168.1.50"),
        ];
        let set = expander()
            .expand(&requests, Mode::Strict)
            .await
            .unwrap()
            .unwrap();

        let lines: Vec<String> = set.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            [
                "192.168.1.50 db",
                "93.184.216.34 api  # IP resolved from example.org",
                "192.168.1.50 db",
            ]
        );
    }

    #[tokio::test]
    async fn strict_returns_resolution_error() {
        let requests = [
            OverrideRequest::new("db", "192.168.1.50"),
            OverrideRequest::new("bad", "999.999.999.999"),
        ];
        let err = expander()
            .expand(&requests, Mode::Strict)
            .await
            .unwrap_err();
        assert!(matches!(err, OverrideError::Resolution { hostname, .. } if hostname == "999.999.999.999"));
    }

    #[tokio::test]
    async fn best_effort_abandons_on_resolution_failure() {
        let requests = [
            OverrideRequest::new("api", "example.org"),
            OverrideRequest::new("gone", "missing.internal"),
        ];
        let result = expander()
            .expand(&requests, Mode::BestEffort)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn best_effort_abandons_when_probe_fails() {
        let expander = Expander::new(table(), Arc::new(Unreachable));
        let requests = [OverrideRequest::new("db", "192.168.1.50")];
        assert!(
            expander
                .expand(&requests, Mode::BestEffort)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn strict_ignores_probe() {
        let expander = Expander::new(table(), Arc::new(Unreachable));
        let requests = [OverrideRequest::new("db", "192.168.1.50")];
        let set = expander
            .expand(&requests, Mode::Strict)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(set.len(), 1);
    }
}
