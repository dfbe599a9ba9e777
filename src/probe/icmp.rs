//! ICMP echo prober.
//!
//! Measures ICMP round-trip time to a single address.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};

use crate::monitor::{IpVersion, ProbeError, Prober};

/// Largest payload accepted by [`IcmpProber::probe`].
const MAX_PAYLOAD_SIZE: u16 = 65500;

/// ICMP prober holding one client per address family.
///
/// A family whose socket cannot be opened (missing privileges, no IPv6
/// stack) is disabled; probes to it fail with [`ProbeError::Unsupported`].
pub struct IcmpProber {
    v4: Option<Client>,
    v6: Option<Client>,
    sequence: AtomicU16,
}

impl IcmpProber {
    /// Open ICMP clients for IPv4 and IPv6.
    ///
    /// # Errors
    /// Fails only if neither family can be opened.
    pub fn new() -> Result<Self, std::io::Error> {
        let v4 = open_client(IpVersion::V4);
        let v6 = open_client(IpVersion::V6);

        if v4.is_none() && v6.is_none() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "unable to open an ICMP socket for IPv4 or IPv6",
            ));
        }

        Ok(Self {
            v4,
            v6,
            sequence: AtomicU16::new(0),
        })
    }

    /// Whether probes to `version` addresses can be sent.
    pub fn supports(&self, version: IpVersion) -> bool {
        self.client(version).is_some()
    }

    fn client(&self, version: IpVersion) -> Option<&Client> {
        match version {
            IpVersion::V4 => self.v4.as_ref(),
            IpVersion::V6 => self.v6.as_ref(),
        }
    }
}

impl std::fmt::Debug for IcmpProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcmpProber")
            .field("ipv4", &self.v4.is_some())
            .field("ipv6", &self.v6.is_some())
            .finish_non_exhaustive()
    }
}

fn open_client(version: IpVersion) -> Option<Client> {
    let config = match version {
        IpVersion::V4 => Config::default(),
        IpVersion::V6 => Config::builder().kind(ICMP::V6).build(),
    };
    match Client::new(&config) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(family = %version, error = %e, "Failed to create ICMP client");
            None
        }
    }
}

#[async_trait::async_trait]
impl Prober for IcmpProber {
    async fn probe(
        &self,
        addr: IpAddr,
        timeout: Duration,
        payload_size: u16,
    ) -> Result<Duration, ProbeError> {
        let version = IpVersion::of(&addr);
        let client = self.client(version).ok_or(ProbeError::Unsupported(version))?;

        let mut pinger = client.pinger(addr, PingIdentifier(rand::random())).await;
        pinger.timeout(timeout);

        let payload = vec![0u8; payload_size.min(MAX_PAYLOAD_SIZE) as usize];
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);

        match pinger.ping(PingSequence(seq), &payload).await {
            Ok((_, rtt)) => Ok(rtt),
            Err(SurgeError::Timeout { .. }) => Err(ProbeError::Timeout),
            Err(e) => Err(ProbeError::Icmp(e.to_string())),
        }
    }
}
