//! Test doubles and common utilities for engine contract tests
//!
//! These doubles count calls and record arguments so tests can verify the
//! engine's interaction contract without any real network traffic.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hover_core::config::{DomainTarget, RecordType};
use hover_core::engine::EngineSettings;
use hover_core::error::{Error, Result};
use hover_core::traits::{
    AuthSession, DnsChecker, PublicIpResolver, RecordClient, SessionCookie, SessionState,
    UpsertOutcome,
};

/// A resolver returning fixed addresses, counting calls per family
pub struct FixedIpResolver {
    ipv4: Option<Ipv4Addr>,
    ipv6: Option<Ipv6Addr>,
    ipv4_calls: Arc<AtomicUsize>,
    ipv6_calls: Arc<AtomicUsize>,
}

impl FixedIpResolver {
    pub fn new(ipv4: Option<Ipv4Addr>, ipv6: Option<Ipv6Addr>) -> Self {
        Self {
            ipv4,
            ipv6,
            ipv4_calls: Arc::new(AtomicUsize::new(0)),
            ipv6_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn ipv4_calls(&self) -> usize {
        self.ipv4_calls.load(Ordering::SeqCst)
    }

    pub fn ipv6_calls(&self) -> usize {
        self.ipv6_calls.load(Ordering::SeqCst)
    }

    /// Create a resolver that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            ipv4: other.ipv4,
            ipv6: other.ipv6,
            ipv4_calls: Arc::clone(&other.ipv4_calls),
            ipv6_calls: Arc::clone(&other.ipv6_calls),
        }
    }
}

#[async_trait::async_trait]
impl PublicIpResolver for FixedIpResolver {
    async fn public_ipv4(&self) -> Result<Ipv4Addr> {
        self.ipv4_calls.fetch_add(1, Ordering::SeqCst);
        self.ipv4
            .ok_or_else(|| Error::public_ip("no IPv4 configured in test resolver"))
    }

    async fn public_ipv6(&self) -> Result<Ipv6Addr> {
        self.ipv6_calls.fetch_add(1, Ordering::SeqCst);
        self.ipv6
            .ok_or_else(|| Error::public_ip("no IPv6 configured in test resolver"))
    }
}

/// A checker answering from a fixed table, recording every query
pub struct TableChecker {
    answers: HashMap<(String, RecordType), IpAddr>,
    queries: Arc<std::sync::Mutex<Vec<(String, RecordType)>>>,
}

impl TableChecker {
    pub fn new<S: Into<String>>(answers: Vec<(S, RecordType, IpAddr)>) -> Self {
        Self {
            answers: answers
                .into_iter()
                .map(|(fqdn, rt, ip)| ((fqdn.into(), rt), ip))
                .collect(),
            queries: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// A checker with no answers at all: every published value is unknown
    pub fn empty() -> Self {
        Self::new(Vec::<(String, RecordType, IpAddr)>::new())
    }

    /// All `(fqdn, record type)` pairs that were queried, in order
    pub fn queries(&self) -> Vec<(String, RecordType)> {
        self.queries.lock().unwrap().clone()
    }

    /// Create a checker that shares the query log with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            answers: other.answers.clone(),
            queries: Arc::clone(&other.queries),
        }
    }
}

#[async_trait::async_trait]
impl DnsChecker for TableChecker {
    async fn lookup(&self, fqdn: &str, record_type: RecordType) -> Result<IpAddr> {
        self.queries
            .lock()
            .unwrap()
            .push((fqdn.to_string(), record_type));
        self.answers
            .get(&(fqdn.to_string(), record_type))
            .copied()
            .ok_or_else(|| Error::dns_lookup(format!("no answer for {fqdn} {record_type}")))
    }
}

/// A record client that succeeds or fails on demand, counting everything
pub struct ScriptedClient {
    session: SessionState,
    /// Domain name → provider-side ID; missing names are "not found"
    domain_ids: HashMap<String, String>,
    fail_login: bool,
    /// `(host, record type)` pairs whose upsert should fail
    fail_upserts: Vec<(String, RecordType)>,
    login_calls: Arc<AtomicUsize>,
    domain_calls: Arc<AtomicUsize>,
    upserts: Arc<std::sync::Mutex<Vec<(String, String, IpAddr, RecordType)>>>,
}

impl ScriptedClient {
    pub fn new(domain_ids: Vec<(&str, &str)>) -> Self {
        Self {
            session: SessionState::Unauthenticated,
            domain_ids: domain_ids
                .into_iter()
                .map(|(name, id)| (name.to_string(), id.to_string()))
                .collect(),
            fail_login: false,
            fail_upserts: Vec::new(),
            login_calls: Arc::new(AtomicUsize::new(0)),
            domain_calls: Arc::new(AtomicUsize::new(0)),
            upserts: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn with_failing_login(mut self) -> Self {
        self.fail_login = true;
        self
    }

    pub fn with_failing_upsert(mut self, host: &str, record_type: RecordType) -> Self {
        self.fail_upserts.push((host.to_string(), record_type));
        self
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn domain_calls(&self) -> usize {
        self.domain_calls.load(Ordering::SeqCst)
    }

    /// All upserts attempted, as `(domain_id, host, value, record type)`
    pub fn upserts(&self) -> Vec<(String, String, IpAddr, RecordType)> {
        self.upserts.lock().unwrap().clone()
    }

    /// Create a client that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            session: SessionState::Unauthenticated,
            domain_ids: other.domain_ids.clone(),
            fail_login: other.fail_login,
            fail_upserts: other.fail_upserts.clone(),
            login_calls: Arc::clone(&other.login_calls),
            domain_calls: Arc::clone(&other.domain_calls),
            upserts: Arc::clone(&other.upserts),
        }
    }
}

#[async_trait::async_trait]
impl RecordClient for ScriptedClient {
    async fn login(&mut self) -> Result<()> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_login {
            return Err(Error::auth("scripted login failure"));
        }
        self.session = SessionState::Authenticated(AuthSession {
            session: SessionCookie::new("hover_session", "test-session"),
            auth: SessionCookie::new("hoverauth", "test-auth"),
        });
        Ok(())
    }

    fn session(&self) -> &SessionState {
        &self.session
    }

    fn reset_session(&mut self) {
        self.session = SessionState::Unauthenticated;
    }

    async fn resolve_domain_id(&self, domain: &str) -> Result<String> {
        self.domain_calls.fetch_add(1, Ordering::SeqCst);
        self.domain_ids
            .get(domain)
            .cloned()
            .ok_or_else(|| Error::domain_not_found(domain))
    }

    async fn upsert(
        &self,
        domain_id: &str,
        host: &str,
        value: IpAddr,
        record_type: RecordType,
    ) -> Result<UpsertOutcome> {
        self.upserts.lock().unwrap().push((
            domain_id.to_string(),
            host.to_string(),
            value,
            record_type,
        ));
        if self
            .fail_upserts
            .iter()
            .any(|(h, rt)| h == host && *rt == record_type)
        {
            return Err(Error::remote_api(format!(
                "scripted upsert failure for {host} {record_type}"
            )));
        }
        Ok(UpsertOutcome::Replaced)
    }
}

/// Engine settings for a single domain, IPv4 only
pub fn v4_settings(domain: &str, hosts: &[&str]) -> EngineSettings {
    EngineSettings {
        domains: vec![DomainTarget::new(
            domain,
            hosts.iter().map(|h| h.to_string()).collect(),
        )],
        force_update: false,
        dry_run: false,
        ipv4: true,
        ipv6: false,
        ipv4_override: None,
        ipv6_override: None,
    }
}
