// # Public IP Resolver Trait
//
// Defines the interface for discovering the machine's current public
// IP addresses.
//
// ## Implementations
//
// - Plain-text HTTP endpoint: `hover-ip-http` crate
// - Local interface scan: `hover-ip-iface` crate
// - Operator-supplied literals: [`crate::ManualIpResolver`]

use std::net::{Ipv4Addr, Ipv6Addr};

use async_trait::async_trait;

/// Trait for public IP discovery strategies
///
/// A strategy that does not support a family returns an error for it; the
/// engine treats every resolver error uniformly as "could not determine"
/// and skips that family for the run. Implementations must never panic on
/// an unsupported family.
#[async_trait]
pub trait PublicIpResolver: Send + Sync {
    /// Get the current public IPv4 address
    async fn public_ipv4(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Get the current public IPv6 address
    async fn public_ipv6(&self) -> Result<Ipv6Addr, crate::Error>;
}
