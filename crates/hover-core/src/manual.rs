//! Operator-supplied fixed addresses
//!
//! The simplest [`PublicIpResolver`] strategy: the addresses are literal
//! strings from configuration. Each literal is parsed once at construction.
//! An unparsable literal is not a fatal configuration error; it makes the
//! resolver fail for that family, so the family is skipped for the run.

use std::net::{Ipv4Addr, Ipv6Addr};

use async_trait::async_trait;
use tracing::warn;

use crate::error::{Error, Result};
use crate::traits::PublicIpResolver;

/// [`PublicIpResolver`] returning fixed, operator-supplied addresses
#[derive(Debug, Clone)]
pub struct ManualIpResolver {
    ipv4: Option<Ipv4Addr>,
    ipv6: Option<Ipv6Addr>,
}

impl ManualIpResolver {
    /// Parse the supplied literals once.
    pub fn new(ipv4: Option<&str>, ipv6: Option<&str>) -> Self {
        let ipv4 = ipv4.and_then(|s| match s.parse() {
            Ok(ip) => Some(ip),
            Err(_) => {
                warn!("'{s}' is not a valid IPv4 address; IPv4 will be unavailable");
                None
            }
        });
        let ipv6 = ipv6.and_then(|s| match s.parse() {
            Ok(ip) => Some(ip),
            Err(_) => {
                warn!("'{s}' is not a valid IPv6 address; IPv6 will be unavailable");
                None
            }
        });

        Self { ipv4, ipv6 }
    }
}

#[async_trait]
impl PublicIpResolver for ManualIpResolver {
    async fn public_ipv4(&self) -> Result<Ipv4Addr> {
        self.ipv4
            .ok_or_else(|| Error::public_ip("no usable manual IPv4 address configured"))
    }

    async fn public_ipv6(&self) -> Result<Ipv6Addr> {
        self.ipv6
            .ok_or_else(|| Error::public_ip("no usable manual IPv6 address configured"))
    }
}
