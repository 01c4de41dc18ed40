//! Core reconciliation engine
//!
//! The ReconcileEngine drives one complete pass ("run") over all configured
//! domains and hosts:
//!
//! 1. Compute the desired addresses, once, for each enabled family
//! 2. Compare each record's published value against the desired one
//! 3. Authenticate lazily, at most once, when the first change is needed
//! 4. Replace each divergent record, containing failures per host/family
//!
//! ## Decision policy
//!
//! A record needs an update when its published value differs from the
//! desired one. "Could not determine the published value" counts as
//! different, so a failing authoritative lookup biases toward updating,
//! never toward skipping. A matching value is skipped unless force-update
//! is set.
//!
//! ## Failure containment
//!
//! An upsert failure is scoped to its host/family; the run continues with
//! the next family and the next host. The one exception is authentication:
//! without a session nothing can be mutated, so a login failure abandons
//! the remainder of the run.

use std::net::IpAddr;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{DdnsConfig, DomainTarget, RecordType};
use crate::report::{Outcome, RecordOutcome, RunReport};
use crate::traits::{DnsChecker, PublicIpResolver, RecordClient, UpsertOutcome};

/// Whether one record must be replaced, and with what knowledge
enum Decision {
    /// Published value matches the desired one (and force-update is off)
    UpToDate(IpAddr),
    /// Published value differs, is unknown, or force-update is on
    Update,
}

/// The subset of configuration the engine acts on
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Domains and hosts, visited in this order
    pub domains: Vec<DomainTarget>,
    /// Update records even when the published value already matches
    pub force_update: bool,
    /// Decide and report, but never authenticate or mutate
    pub dry_run: bool,
    /// Manage A records
    pub ipv4: bool,
    /// Manage AAAA records
    pub ipv6: bool,
    /// Literal IPv4 address used instead of a live lookup
    pub ipv4_override: Option<String>,
    /// Literal IPv6 address used instead of a live lookup
    pub ipv6_override: Option<String>,
}

impl EngineSettings {
    /// Derive engine settings from a validated configuration.
    ///
    /// Overrides are not part of the config file; the daemon sets them
    /// from command-line flags.
    pub fn from_config(config: &DdnsConfig) -> Self {
        Self {
            domains: config.domains.clone(),
            force_update: config.force_update,
            dry_run: config.dry_run,
            ipv4: config.ipv4,
            ipv6: config.ipv6,
            ipv4_override: None,
            ipv6_override: None,
        }
    }
}

/// Target addresses for one run
///
/// `None` for a family means "do not touch this family": it is never
/// compared, never authenticated for, and never mutated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DesiredState {
    /// Desired A record value
    pub ipv4: Option<std::net::Ipv4Addr>,
    /// Desired AAAA record value
    pub ipv6: Option<std::net::Ipv6Addr>,
}

impl DesiredState {
    /// Present families in update order (IPv4 first)
    pub fn families(&self) -> Vec<(RecordType, IpAddr)> {
        let mut families = Vec::with_capacity(2);
        if let Some(ip) = self.ipv4 {
            families.push((RecordType::A, IpAddr::V4(ip)));
        }
        if let Some(ip) = self.ipv6 {
            families.push((RecordType::Aaaa, IpAddr::V6(ip)));
        }
        families
    }
}

/// Core reconciliation engine
///
/// Owns the public IP resolver, the authoritative checker, and the record
/// client for the process lifetime. The client sits behind an async mutex
/// that doubles as the run guard: a trigger that fires while a run is
/// still in flight waits for it to finish, so two runs can never overlap
/// or share a session.
pub struct ReconcileEngine {
    settings: EngineSettings,
    resolver: Box<dyn PublicIpResolver>,
    checker: Box<dyn DnsChecker>,
    client: Mutex<Box<dyn RecordClient>>,
}

impl ReconcileEngine {
    /// Create a new engine
    pub fn new(
        settings: EngineSettings,
        resolver: Box<dyn PublicIpResolver>,
        checker: Box<dyn DnsChecker>,
        client: Box<dyn RecordClient>,
    ) -> Self {
        Self {
            settings,
            resolver,
            checker,
            client: Mutex::new(client),
        }
    }

    /// Execute one complete pass over all configured domains and hosts.
    ///
    /// Serialized: concurrent callers queue on the internal lock.
    pub async fn run_once(&self) -> RunReport {
        let mut client = self.client.lock().await;
        let started_at = Utc::now();

        // Any session from a previous run is stale by definition.
        client.reset_session();

        let desired = self.desired_state().await;
        let families = desired.families();

        let mut outcomes = Vec::new();
        let mut aborted = None;

        if families.is_empty() {
            warn!("no address family produced a desired value; nothing to reconcile");
        }

        'domains: for domain in &self.settings.domains {
            // Resolved at most once per domain per run; a resolution failure
            // fails every remaining host of this domain but not the run.
            let mut domain_id: Option<String> = None;
            let mut domain_error: Option<String> = None;

            for host in &domain.hosts {
                let fqdn = format!("{}.{}", host, domain.name);

                for &(record_type, desired_ip) in &families {
                    if let Decision::UpToDate(current) =
                        self.decide(&fqdn, record_type, desired_ip).await
                    {
                        outcomes.push(RecordOutcome {
                            fqdn: fqdn.clone(),
                            record_type,
                            outcome: Outcome::Skipped { current },
                        });
                        continue;
                    }

                    if self.settings.dry_run {
                        info!("dry run: would update {} {} to {}", fqdn, record_type, desired_ip);
                        outcomes.push(RecordOutcome {
                            fqdn: fqdn.clone(),
                            record_type,
                            outcome: Outcome::WouldUpdate { new: desired_ip },
                        });
                        continue;
                    }

                    // Lazy login: at most one session per run, established on
                    // the first record that actually needs a change.
                    if !client.session().is_authenticated() {
                        if let Err(e) = client.login().await {
                            warn!("authentication failed, abandoning the rest of this run: {e}");
                            outcomes.push(RecordOutcome {
                                fqdn: fqdn.clone(),
                                record_type,
                                outcome: Outcome::Failed {
                                    reason: e.to_string(),
                                },
                            });
                            aborted = Some(e.to_string());
                            break 'domains;
                        }
                        debug!("session established");
                    }

                    if domain_id.is_none() && domain_error.is_none() {
                        match client.resolve_domain_id(&domain.name).await {
                            Ok(id) => {
                                debug!("domain {} has ID {}", domain.name, id);
                                domain_id = Some(id);
                            }
                            Err(e) => {
                                warn!("could not resolve domain {}: {e}", domain.name);
                                domain_error = Some(e.to_string());
                            }
                        }
                    }

                    let Some(id) = domain_id.as_deref() else {
                        let reason = domain_error
                            .clone()
                            .unwrap_or_else(|| "domain resolution failed".to_string());
                        outcomes.push(RecordOutcome {
                            fqdn: fqdn.clone(),
                            record_type,
                            outcome: Outcome::Failed { reason },
                        });
                        continue;
                    };

                    match client.upsert(id, host, desired_ip, record_type).await {
                        Ok(result) => {
                            info!("updated {} {} to {}", fqdn, record_type, desired_ip);
                            outcomes.push(RecordOutcome {
                                fqdn: fqdn.clone(),
                                record_type,
                                outcome: Outcome::Updated {
                                    new: desired_ip,
                                    replaced: result == UpsertOutcome::Replaced,
                                },
                            });
                        }
                        Err(e) => {
                            warn!("failed to update {} {}: {e}", fqdn, record_type);
                            outcomes.push(RecordOutcome {
                                fqdn: fqdn.clone(),
                                record_type,
                                outcome: Outcome::Failed {
                                    reason: e.to_string(),
                                },
                            });
                        }
                    }
                }
            }
        }

        RunReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
            aborted,
        }
    }

    /// Compute the desired addresses for this run.
    ///
    /// A disabled family stays `None`. An override string takes the place
    /// of the live lookup; an unparsable override or a resolver error makes
    /// the family absent for this run, with a warning.
    pub async fn desired_state(&self) -> DesiredState {
        let mut desired = DesiredState::default();

        if self.settings.ipv4 {
            desired.ipv4 = match &self.settings.ipv4_override {
                Some(literal) => match literal.parse() {
                    Ok(ip) => {
                        info!("using manually provided public IPv4 address {ip}");
                        Some(ip)
                    }
                    Err(_) => {
                        warn!("'{literal}' is not a valid IPv4 address; skipping IPv4 this run");
                        None
                    }
                },
                None => match self.resolver.public_ipv4().await {
                    Ok(ip) => {
                        info!("discovered public IPv4 address {ip}");
                        Some(ip)
                    }
                    Err(e) => {
                        warn!("could not determine public IPv4 address: {e}");
                        None
                    }
                },
            };
        }

        if self.settings.ipv6 {
            desired.ipv6 = match &self.settings.ipv6_override {
                Some(literal) => match literal.parse() {
                    Ok(ip) => {
                        info!("using manually provided public IPv6 address {ip}");
                        Some(ip)
                    }
                    Err(_) => {
                        warn!("'{literal}' is not a valid IPv6 address; skipping IPv6 this run");
                        None
                    }
                },
                None => match self.resolver.public_ipv6().await {
                    Ok(ip) => {
                        info!("discovered public IPv6 address {ip}");
                        Some(ip)
                    }
                    Err(e) => {
                        warn!("could not determine public IPv6 address: {e}");
                        None
                    }
                },
            };
        }

        desired
    }

    /// Whether the record for `fqdn` must be replaced with `desired_ip`.
    ///
    /// An unknown published value (failed or empty authoritative lookup)
    /// counts as different from desired.
    async fn decide(&self, fqdn: &str, record_type: RecordType, desired_ip: IpAddr) -> Decision {
        match self.checker.lookup(fqdn, record_type).await {
            Ok(current) if current == desired_ip => {
                if self.settings.force_update {
                    info!("{} {} already up to date, but update forced", fqdn, record_type);
                    Decision::Update
                } else {
                    info!("{} {} already up to date - nothing to do", fqdn, record_type);
                    Decision::UpToDate(current)
                }
            }
            Ok(current) => {
                info!(
                    "{} {} is {} but should be {} - update required",
                    fqdn, record_type, current, desired_ip
                );
                Decision::Update
            }
            Err(e) => {
                warn!(
                    "could not resolve current value of {} {} ({e}); updating to be safe",
                    fqdn, record_type
                );
                Decision::Update
            }
        }
    }
}
