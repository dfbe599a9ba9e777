//! System DNS resolver.

use std::collections::BTreeSet;
use std::net::IpAddr;

use crate::monitor::{ResolveError, Resolver};

/// Resolves hosts with the operating system resolver.
///
/// Literal IP addresses are returned as-is without a lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait::async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        if let Some(ip) = parse_literal(host) {
            return Ok(vec![ip]);
        }

        let addrs: BTreeSet<IpAddr> = tokio::net::lookup_host(format!("{host}:0"))
            .await?
            .map(|addr| addr.ip())
            .collect();

        if addrs.is_empty() {
            return Err(ResolveError::NoAddresses(host.to_string()));
        }
        Ok(addrs.into_iter().collect())
    }
}

/// Parse `host` as an address, accepting bracketed IPv6 (`[::1]`).
fn parse_literal(host: &str) -> Option<IpAddr> {
    let trimmed = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    trimmed.parse().ok()
}
