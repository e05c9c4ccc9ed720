//! Target classification, name resolution and the reachability probe.
//!
//! Resolution is pluggable through [`Resolve`] so sessions can be driven by
//! the operating system resolver in production and by fixed tables in tests.

use crate::error::{OverrideError, Result};
use async_trait::async_trait;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;

/// Default reference hostname for [`ResolverProbe`].
pub const DEFAULT_PROBE_HOST: &str = "example.com";

/// What a request's target turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A valid IPv4 or IPv6 literal, canonicalized.
    LiteralIp(IpAddr),
    /// Anything else; must go through [`Resolve`].
    NeedsResolution,
}

impl Target {
    /// Classifies `value` as a literal IP or a name to resolve.
    ///
    /// IPv4-mapped IPv6 literals (`::ffff:a.b.c.d`) collapse to IPv4. Invalid
    /// literals such as `999.999.999.999` fall through to resolution.
    ///
    /// ```
    /// use hosts_override::Target;
    ///
    /// assert!(matches!(Target::classify("::1"), Target::LiteralIp(_)));
    /// assert_eq!(Target::classify("example.internal"), Target::NeedsResolution);
    /// ```
    #[must_use]
    pub fn classify(value: &str) -> Self {
        match value.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => {
                Self::LiteralIp(v6.to_ipv4_mapped().map_or(IpAddr::V6(v6), IpAddr::V4))
            }
            Ok(ip) => Self::LiteralIp(ip),
            Err(_) => Self::NeedsResolution,
        }
    }
}

/// Forward name resolution.
///
/// Implementations return every address the lookup yields, in whatever order
/// the backend produced them. An empty answer is an error.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Resolves `hostname` to one or more addresses.
    ///
    /// # Errors
    ///
    /// Returns [`OverrideError::Resolution`] if the lookup fails or is empty.
    async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system (`getaddrinfo`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolve for SystemResolver {
    async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>> {
        tracing::debug!(hostname = %hostname, "resolving via system resolver");

        let addrs = tokio::net::lookup_host((hostname, 0))
            .await
            .map_err(|source| OverrideError::Resolution {
                hostname: hostname.to_string(),
                source,
            })?;

        let ips: Vec<IpAddr> = addrs.map(|addr| addr.ip()).collect();
        if ips.is_empty() {
            return Err(OverrideError::Resolution {
                hostname: hostname.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
            });
        }

        tracing::debug!(hostname = %hostname, count = ips.len(), "resolution complete");
        Ok(ips)
    }
}

/// Distinguishes "the resolver is down" from "this name does not exist".
#[async_trait]
pub trait Reachability: Send + Sync {
    /// Checks that name resolution works at all.
    ///
    /// # Errors
    ///
    /// Returns [`OverrideError::Unreachable`] if the check fails.
    async fn probe(&self) -> Result<()>;
}

/// Probes by resolving a fixed reference hostname that is never user input.
pub struct ResolverProbe {
    resolver: Arc<dyn Resolve>,
    reference: String,
}

impl ResolverProbe {
    /// Creates a probe that resolves `reference` through `resolver`.
    #[must_use]
    pub fn new(resolver: Arc<dyn Resolve>, reference: impl Into<String>) -> Self {
        Self {
            resolver,
            reference: reference.into(),
        }
    }

    /// The reference hostname.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

#[async_trait]
impl Reachability for ResolverProbe {
    async fn probe(&self) -> Result<()> {
        match self.resolver.resolve(&self.reference).await {
            Ok(_) => Ok(()),
            Err(OverrideError::Resolution { source, .. }) => Err(OverrideError::Unreachable {
                probe: self.reference.clone(),
                source,
            }),
            Err(e) => Err(e),
        }
    }
}

/// Probe that always succeeds, for environments without network resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReachable;

#[async_trait]
impl Reachability for AlwaysReachable {
    async fn probe(&self) -> Result<()> {
        Ok(())
    }
}
