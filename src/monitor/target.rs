//! Monitored targets and their resolved address sets.

use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Delay added per position in the target list to spread initial probes.
pub const STAGGER_UNIT: Duration = Duration::from_millis(10);

/// IP protocol version of a resolved address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    /// Label value: `"4"` or `"6"`.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::V4 => "4",
            Self::V6 => "6",
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => write!(f, "IPv4"),
            Self::V6 => write!(f, "IPv6"),
        }
    }
}

/// Identity of one probed address: the configured host plus the address it
/// resolved to. This is also the label set of every exported series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey {
    pub host: String,
    pub addr: IpAddr,
}

impl TargetKey {
    pub fn new(host: impl Into<String>, addr: IpAddr) -> Self {
        Self {
            host: host.into(),
            addr,
        }
    }

    pub fn ip_version(&self) -> IpVersion {
        IpVersion::of(&self.addr)
    }

    /// Label values in `target`, `ip`, `ip_version` order.
    pub fn label_values(&self) -> [String; 3] {
        [
            self.host.clone(),
            self.addr.to_string(),
            self.ip_version().as_label().to_string(),
        ]
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.host, self.addr, self.ip_version().as_label())
    }
}

/// Addresses that appeared and disappeared between two resolutions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressDiff {
    pub added: Vec<IpAddr>,
    pub removed: Vec<IpAddr>,
}

impl AddressDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// A configured host and the addresses currently believed to back it.
#[derive(Debug, Clone)]
pub struct Target {
    host: String,
    start_delay: Duration,
    addresses: BTreeSet<IpAddr>,
}

impl Target {
    /// Create the target at `index` in the configured list.
    pub fn new(host: impl Into<String>, index: usize) -> Self {
        Self {
            host: host.into(),
            start_delay: STAGGER_UNIT * index as u32,
            addresses: BTreeSet::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Offset applied once before a new schedule's first probe.
    pub fn start_delay(&self) -> Duration {
        self.start_delay
    }

    pub fn addresses(&self) -> &BTreeSet<IpAddr> {
        &self.addresses
    }

    /// Replace the address set with `resolved` and report what changed.
    ///
    /// Addresses present in both sets are reported in neither list.
    pub fn apply_resolution(&mut self, resolved: impl IntoIterator<Item = IpAddr>) -> AddressDiff {
        let next: BTreeSet<IpAddr> = resolved.into_iter().collect();
        let diff = AddressDiff {
            added: next.difference(&self.addresses).copied().collect(),
            removed: self.addresses.difference(&next).copied().collect(),
        };
        self.addresses = next;
        diff
    }
}
