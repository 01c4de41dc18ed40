//! Core traits for the hover-ddns system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`PublicIpResolver`]: Discover the machine's current public addresses
//! - [`DnsChecker`]: Query the currently published record values
//! - [`RecordClient`]: Authenticate against the provider and replace records

pub mod dns_checker;
pub mod public_ip;
pub mod record_client;

pub use dns_checker::DnsChecker;
pub use public_ip::PublicIpResolver;
pub use record_client::{AuthSession, RecordClient, SessionCookie, SessionState, UpsertOutcome};
