// # Local Interface Public IP Resolver
//
// This crate reads the public address straight off a local network
// interface instead of asking an external service. Useful when the
// machine holds a globally routable address itself (no NAT), which is
// common for IPv6 and for directly connected servers.
//
// Address selection: among the configured interface's addresses, the
// first global-unicast address of the requested family wins. Loopback,
// link-local, multicast, and unspecified addresses never qualify.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use async_trait::async_trait;
use hover_core::traits::PublicIpResolver;
use hover_core::{Error, Result};
use tracing::debug;

/// [`PublicIpResolver`] that scans one local network interface
pub struct InterfaceResolver {
    interface: String,
}

impl InterfaceResolver {
    /// Create a resolver for the named interface (e.g. "eth0")
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    /// All addresses currently assigned to the configured interface
    fn interface_addrs(&self) -> Result<Vec<IpAddr>> {
        let addrs = if_addrs::get_if_addrs()?
            .into_iter()
            .filter(|iface| iface.name == self.interface)
            .map(|iface| iface.ip())
            .collect::<Vec<_>>();

        debug!(
            "interface {} carries {} address(es)",
            self.interface,
            addrs.len()
        );
        Ok(addrs)
    }
}

#[async_trait]
impl PublicIpResolver for InterfaceResolver {
    async fn public_ipv4(&self) -> Result<Ipv4Addr> {
        select_v4(&self.interface_addrs()?).ok_or_else(|| {
            Error::public_ip(format!(
                "no global unicast IPv4 address on interface '{}'",
                self.interface
            ))
        })
    }

    async fn public_ipv6(&self) -> Result<Ipv6Addr> {
        select_v6(&self.interface_addrs()?).ok_or_else(|| {
            Error::public_ip(format!(
                "no global unicast IPv6 address on interface '{}'",
                self.interface
            ))
        })
    }
}

/// First global-unicast IPv4 address among `addrs`
fn select_v4(addrs: &[IpAddr]) -> Option<Ipv4Addr> {
    addrs.iter().find_map(|addr| match addr {
        IpAddr::V4(ip) if is_global_unicast_v4(*ip) => Some(*ip),
        _ => None,
    })
}

/// First global-unicast IPv6 address among `addrs`
fn select_v6(addrs: &[IpAddr]) -> Option<Ipv6Addr> {
    addrs.iter().find_map(|addr| match addr {
        IpAddr::V6(ip) if is_global_unicast_v6(*ip) => Some(*ip),
        _ => None,
    })
}

fn is_global_unicast_v4(ip: Ipv4Addr) -> bool {
    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_multicast())
}

fn is_global_unicast_v6(ip: Ipv6Addr) -> bool {
    // fe80::/10 is link-local unicast
    let link_local = (ip.segments()[0] & 0xffc0) == 0xfe80;
    !(ip.is_unspecified() || ip.is_loopback() || ip.is_multicast() || link_local)
}
