//! Override requests and the entries they expand into.

use crate::error::{OverrideError, Result};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// One user-requested override, parsed from a `HOSTNAME,TARGET` token.
///
/// `target` is either a literal IP address or a hostname to resolve. No
/// normalization (case, trailing dots) is applied to either field.
///
/// # Example
///
/// ```
/// use hosts_override::OverrideRequest;
///
/// let request: OverrideRequest = "api,example.org".parse().unwrap();
/// assert_eq!(request.hostname, "api");
/// assert_eq!(request.target, "example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRequest {
    /// Hostname to override in the hosts file.
    pub hostname: String,

    /// Literal IP or hostname whose addresses the override points at.
    pub target: String,
}

impl OverrideRequest {
    /// Creates a request from its two fields.
    #[must_use]
    pub fn new(hostname: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            target: target.into(),
        }
    }
}

impl FromStr for OverrideRequest {
    type Err = OverrideError;

    fn from_str(token: &str) -> Result<Self> {
        let invalid = |reason| OverrideError::InvalidRequest {
            token: token.to_string(),
            reason,
        };

        let mut fields = token.split(',');
        let (Some(hostname), Some(target), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(invalid("expected exactly two comma-separated fields HOSTNAME,TARGET"));
        };

        if hostname.is_empty() {
            return Err(invalid("hostname is empty"));
        }
        if target.is_empty() {
            return Err(invalid("target is empty"));
        }
        // Each entry must stay on a single hosts line.
        if token.chars().any(char::is_control) {
            return Err(invalid("contains control characters"));
        }

        Ok(Self::new(hostname, target))
    }
}

/// Parses every `HOSTNAME,TARGET` token, failing on the first malformed one.
///
/// # Errors
///
/// Returns [`OverrideError::InvalidRequest`] naming the first bad token.
pub fn parse_requests<I, S>(tokens: I) -> Result<Vec<OverrideRequest>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens.into_iter().map(|t| t.as_ref().parse()).collect()
}

/// One concrete `ip hostname` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    /// Hostname copied from the originating request.
    pub hostname: String,

    /// Address the hostname maps to.
    pub ip: IpAddr,

    /// The request's target, present only when it was a hostname that had
    /// to be resolved rather than a literal IP.
    pub resolved_from: Option<String>,
}

impl ResolvedEntry {
    /// Entry for a target that was already a literal IP.
    #[must_use]
    pub fn literal(hostname: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            hostname: hostname.into(),
            ip,
            resolved_from: None,
        }
    }

    /// Entry for an address obtained by resolving `target`.
    #[must_use]
    pub fn resolved(hostname: impl Into<String>, ip: IpAddr, target: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ip,
            resolved_from: Some(target.into()),
        }
    }
}

/// Formats the entry as a hosts file line, without the trailing newline.
impl fmt::Display for ResolvedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ip, self.hostname)?;
        if let Some(target) = &self.resolved_from {
            write!(f, "  # IP resolved from {target}")?;
        }
        Ok(())
    }
}

/// The ordered expansion of all requests from one resolution pass.
///
/// Rebuilt wholesale on every refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet(Vec<ResolvedEntry>);

impl OverrideSet {
    /// Number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in request order.
    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedEntry> {
        self.0.iter()
    }

    /// Entries as a slice.
    #[must_use]
    pub fn entries(&self) -> &[ResolvedEntry] {
        &self.0
    }
}

impl From<Vec<ResolvedEntry>> for OverrideSet {
    fn from(entries: Vec<ResolvedEntry>) -> Self {
        Self(entries)
    }
}

impl FromIterator<ResolvedEntry> for OverrideSet {
    fn from_iter<T: IntoIterator<Item = ResolvedEntry>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a OverrideSet {
    type Item = &'a ResolvedEntry;
    type IntoIter = std::slice::Iter<'a, ResolvedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
