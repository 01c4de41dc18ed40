//! Authoritative DNS lookups against an explicitly configured name server
//!
//! The engine never trusts the system resolver for the "what is currently
//! published" question: intermediate caches could serve a stale record and
//! make an out-of-date entry look current. Instead, every check goes
//! straight to one operator-configured server, uncached.

use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use hickory_resolver::{
    TokioResolver,
    config::{NameServerConfigGroup, ResolverConfig, ResolverOpts},
    name_server::TokioConnectionProvider,
};
use tracing::debug;

use crate::config::RecordType;
use crate::error::{Error, Result};
use crate::traits::DnsChecker;

/// [`DnsChecker`] implementation backed by a single explicit name server
pub struct AuthoritativeChecker {
    resolver: TokioResolver,
    server: SocketAddr,
}

impl AuthoritativeChecker {
    /// Create a checker that queries exactly `server`.
    pub fn new(server: SocketAddr) -> Self {
        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(&[server.ip()], server.port(), true),
        );
        let provider = TokioConnectionProvider::default();
        let mut opts = ResolverOpts::default();
        // Every lookup must reflect the server's live answer.
        opts.cache_size = 0;
        let resolver = TokioResolver::builder_with_config(config, provider)
            .with_options(opts)
            .build();

        Self { resolver, server }
    }

    /// The name server this checker queries
    pub fn server(&self) -> SocketAddr {
        self.server
    }
}

#[async_trait]
impl DnsChecker for AuthoritativeChecker {
    async fn lookup(&self, fqdn: &str, record_type: RecordType) -> Result<IpAddr> {
        // Trailing dot keeps the resolver from applying any search list.
        let name = format!("{fqdn}.");

        let answers: Vec<IpAddr> = match record_type {
            RecordType::A => self
                .resolver
                .ipv4_lookup(name.as_str())
                .await
                .map_err(|e| Error::dns_lookup(format!("{fqdn} A @{}: {e}", self.server)))?
                .iter()
                .map(|a| IpAddr::V4(a.0))
                .collect(),
            RecordType::Aaaa => self
                .resolver
                .ipv6_lookup(name.as_str())
                .await
                .map_err(|e| Error::dns_lookup(format!("{fqdn} AAAA @{}: {e}", self.server)))?
                .iter()
                .map(|a| IpAddr::V6(a.0))
                .collect(),
        };

        match answers.split_first() {
            Some((first, rest)) => {
                if !rest.is_empty() {
                    debug!(
                        "{} returned {} answers for {} {}; using {} and discarding the rest",
                        self.server,
                        answers.len(),
                        fqdn,
                        record_type,
                        first
                    );
                }
                Ok(*first)
            }
            None => Err(Error::dns_lookup(format!(
                "no {record_type} answer for {fqdn} from {}",
                self.server
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_remembers_its_server() {
        let server: SocketAddr = "192.0.2.53:53".parse().unwrap();
        let checker = AuthoritativeChecker::new(server);
        assert_eq!(checker.server(), server);
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn resolves_a_record_from_public_server() {
        let checker = AuthoritativeChecker::new("8.8.8.8:53".parse().unwrap());
        let ip = checker
            .lookup("dns.google", RecordType::A)
            .await
            .expect("lookup should succeed");
        assert!(ip.is_ipv4());
    }
}
