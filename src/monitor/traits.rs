//! Capabilities the monitor depends on.
//!
//! The monitor never talks to sockets or resolvers directly. It drives a
//! [`Prober`] and a [`Resolver`], so the ICMP transport and DNS lookups can be
//! swapped out (tests use in-memory fakes).

use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;

use super::target::IpVersion;

/// Errors produced by a single probe attempt.
///
/// These never escape a schedule: every variant is recorded as a failed
/// outcome and counted as lost.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No reply arrived before the timeout elapsed.
    #[error("timeout elapsed")]
    Timeout,

    /// No ICMP socket is available for this address family.
    #[error("ICMP over {0} is not available")]
    Unsupported(IpVersion),

    /// The ICMP exchange failed (unreachable, socket error, bad reply).
    #[error("icmp error: {0}")]
    Icmp(String),
}

/// Errors produced while resolving a target host.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The system resolver failed.
    #[error("lookup failed: {0}")]
    Lookup(#[from] std::io::Error),

    /// The lookup succeeded but yielded no usable address.
    #[error("no addresses found for '{0}'")]
    NoAddresses(String),
}

/// Sends one echo request and measures its round trip.
#[async_trait::async_trait]
pub trait Prober: Send + Sync + 'static {
    /// Probe `addr` once, giving up after `timeout`.
    ///
    /// `payload_size` is the number of payload bytes carried by the request.
    async fn probe(
        &self,
        addr: IpAddr,
        timeout: Duration,
        payload_size: u16,
    ) -> Result<Duration, ProbeError>;
}

/// Resolves a host name to its current address set.
#[async_trait::async_trait]
pub trait Resolver: Send + Sync + 'static {
    /// Resolve `host`. The returned list may contain duplicates; callers dedupe.
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_error_display() {
        assert_eq!(ProbeError::Timeout.to_string(), "timeout elapsed");
        assert_eq!(
            ProbeError::Unsupported(IpVersion::V6).to_string(),
            "ICMP over IPv6 is not available"
        );
    }

    #[test]
    fn test_resolve_error_display() {
        let err = ResolveError::NoAddresses("example.com".to_string());
        assert!(err.to_string().contains("example.com"));
    }
}
