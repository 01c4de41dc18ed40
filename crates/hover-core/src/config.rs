//! Configuration types for the hover-ddns system
//!
//! This module defines all configuration structures used throughout the
//! crate. The daemon deserializes these from a YAML file and validates them
//! before the first run starts.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Main hover-ddns configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Provider account user name
    pub username: String,

    /// Provider account password
    pub password: String,

    /// Domains and the host names under each to keep in sync
    pub domains: Vec<DomainTarget>,

    /// Public IP discovery strategy
    #[serde(default)]
    pub public_ip: PublicIpConfig,

    /// Update records even when the published value already matches
    #[serde(default)]
    pub force_update: bool,

    /// Report what would change without authenticating or mutating anything
    #[serde(default)]
    pub dry_run: bool,

    /// Manage A records
    #[serde(default = "default_true")]
    pub ipv4: bool,

    /// Manage AAAA records
    #[serde(default)]
    pub ipv6: bool,

    /// Name server queried for the currently published record values.
    /// Queried directly so that local resolver caches never hide a stale
    /// record.
    #[serde(default = "default_name_server")]
    pub name_server: String,

    /// Seconds between scheduled runs
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl DdnsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.username.is_empty() {
            return Err(crate::Error::config("username must not be empty"));
        }
        if self.password.is_empty() {
            return Err(crate::Error::config("password must not be empty"));
        }
        if self.domains.is_empty() {
            return Err(crate::Error::config("no domains configured"));
        }
        for domain in &self.domains {
            domain.validate()?;
        }
        if !self.ipv4 && !self.ipv6 {
            return Err(crate::Error::config(
                "both address families are disabled; nothing to do",
            ));
        }
        if self.name_server.parse::<SocketAddr>().is_err() {
            return Err(crate::Error::config(format!(
                "name_server '{}' is not a valid address:port pair",
                self.name_server
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("poll_interval_secs must be > 0"));
        }
        self.public_ip.validate()?;
        Ok(())
    }

    /// Parsed name server address. Only valid after [`DdnsConfig::validate`].
    pub fn name_server_addr(&self) -> Result<SocketAddr, crate::Error> {
        self.name_server.parse().map_err(|_| {
            crate::Error::config(format!(
                "name_server '{}' is not a valid address:port pair",
                self.name_server
            ))
        })
    }
}

/// One configured domain and the host names under it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainTarget {
    /// Domain name as registered at the provider (e.g. "example.com")
    pub name: String,

    /// Host names to manage, in update order (e.g. "home", "vpn")
    pub hosts: Vec<String>,
}

impl DomainTarget {
    /// Create a new domain target
    pub fn new(name: impl Into<String>, hosts: Vec<String>) -> Self {
        Self {
            name: name.into(),
            hosts,
        }
    }

    fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::config("domain name must not be empty"));
        }
        if self.hosts.is_empty() {
            return Err(crate::Error::config(format!(
                "domain '{}' has no hosts configured",
                self.name
            )));
        }
        for host in &self.hosts {
            if host.is_empty() {
                return Err(crate::Error::config(format!(
                    "domain '{}' has an empty host name",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Public IP discovery strategy
///
/// A closed set of strategies, selected once at startup from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublicIpConfig {
    /// GET a plain-text endpoint that echoes the caller's address
    HttpText {
        /// Well-known endpoint preset
        #[serde(default)]
        service: TextService,
        /// Custom endpoint for IPv4 lookups; overrides the preset
        #[serde(default)]
        url: Option<String>,
        /// Custom endpoint for IPv6 lookups; defaults to `url`
        #[serde(default)]
        url_v6: Option<String>,
    },

    /// Read the address from a local network interface
    Interface {
        /// Interface name (e.g. "eth0")
        interface: String,
    },

    /// Fixed addresses supplied by the operator
    Manual {
        /// Literal IPv4 address
        #[serde(default)]
        ipv4: Option<String>,
        /// Literal IPv6 address
        #[serde(default)]
        ipv6: Option<String>,
    },
}

impl PublicIpConfig {
    /// Validate the public IP strategy configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            PublicIpConfig::HttpText { url, url_v6, .. } => {
                for candidate in [url, url_v6].into_iter().flatten() {
                    if !candidate.starts_with("http://") && !candidate.starts_with("https://") {
                        return Err(crate::Error::config(format!(
                            "public IP endpoint '{candidate}' must use HTTP or HTTPS"
                        )));
                    }
                }
                Ok(())
            }
            PublicIpConfig::Interface { interface } => {
                if interface.is_empty() {
                    return Err(crate::Error::config("interface name must not be empty"));
                }
                Ok(())
            }
            PublicIpConfig::Manual { ipv4, ipv6 } => {
                if ipv4.is_none() && ipv6.is_none() {
                    return Err(crate::Error::config(
                        "manual public IP strategy needs at least one address",
                    ));
                }
                Ok(())
            }
        }
    }
}

impl Default for PublicIpConfig {
    fn default() -> Self {
        PublicIpConfig::HttpText {
            service: TextService::default(),
            url: None,
            url_v6: None,
        }
    }
}

/// Well-known plain-text public IP endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextService {
    /// icanhazip.com; one endpoint serves both families
    #[default]
    Icanhazip,
    /// api.ipify.org / api6.ipify.org
    Ipify,
    /// checkip.amazonaws.com
    Amazon,
}

/// DNS record type managed by this system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    #[serde(rename = "A")]
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire representation of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Whether `ip` belongs to the family this record type carries
    pub fn matches(&self, ip: IpAddr) -> bool {
        match self {
            RecordType::A => ip.is_ipv4(),
            RecordType::Aaaa => ip.is_ipv6(),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

fn default_name_server() -> String {
    "8.8.8.8:53".to_string()
}

fn default_poll_interval_secs() -> u64 {
    300
}
