//! Error types for the hover-ddns system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

use crate::config::RecordType;

/// Result type alias for hover-ddns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the hover-ddns system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (fatal before any run starts)
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication failed; aborts the remainder of the current run
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The remote record API reported a failure or returned an unusable response
    #[error("remote API error: {0}")]
    RemoteApi(String),

    /// The configured domain does not exist at the provider
    #[error("domain not found: {0}")]
    DomainNotFound(String),

    /// A record was deleted but the follow-up create failed, leaving the
    /// record absent at the provider until the next run
    #[error("record '{fqdn}' ({record_type}) was deleted but not recreated: {reason}")]
    ReplaceIncomplete {
        /// Fully qualified record name
        fqdn: String,
        /// Record type that is now missing
        record_type: RecordType,
        /// Why the create step failed
        reason: String,
    },

    /// Public IP discovery failed for a family
    #[error("public IP lookup failed: {0}")]
    PublicIp(String),

    /// Authoritative DNS lookup failed or returned no answer
    #[error("DNS lookup failed: {0}")]
    DnsLookup(String),

    /// Invalid input rejected before any network call
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Network-related errors
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a remote API error
    pub fn remote_api(msg: impl Into<String>) -> Self {
        Self::RemoteApi(msg.into())
    }

    /// Create a "domain not found" error
    pub fn domain_not_found(msg: impl Into<String>) -> Self {
        Self::DomainNotFound(msg.into())
    }

    /// Create a public IP lookup error
    pub fn public_ip(msg: impl Into<String>) -> Self {
        Self::PublicIp(msg.into())
    }

    /// Create a DNS lookup error
    pub fn dns_lookup(msg: impl Into<String>) -> Self {
        Self::DnsLookup(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Whether this error means the session could not be established.
    ///
    /// The engine uses this to decide between aborting the remainder of a
    /// run (authentication is unrecoverable within a run) and carrying on
    /// with the next host/family.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
