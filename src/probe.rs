//! Concrete network capabilities for the monitor.
//!
//! - [`IcmpProber`]: ICMP echo over raw/datagram sockets via `surge-ping`
//! - [`SystemResolver`]: host lookups through the system resolver

mod dns;
mod icmp;

pub use dns::SystemResolver;
pub use icmp::IcmpProber;
