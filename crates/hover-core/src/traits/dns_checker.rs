// # DNS Checker Trait
//
// Defines the interface for reading the currently published value of a
// record, so the engine can decide whether an update is needed at all.

use std::net::IpAddr;

use async_trait::async_trait;

use crate::config::RecordType;

/// Trait for authoritative DNS lookups
///
/// Implementations send the query to an explicitly configured name server
/// rather than the system resolver, so a stale local cache can never mask
/// an out-of-date record.
#[async_trait]
pub trait DnsChecker: Send + Sync {
    /// Look up the currently published address for `fqdn`.
    ///
    /// Returns an error when the query fails or the answer set is empty;
    /// callers treat that as "current value unknown", never as a crash.
    async fn lookup(&self, fqdn: &str, record_type: RecordType) -> Result<IpAddr, crate::Error>;
}
