//! Per-run outcome reporting
//!
//! A run produces one [`RunReport`] summarizing, per host and per address
//! family, what happened. The daemon uses it for logging and for its exit
//! code in one-shot mode.

use std::net::IpAddr;

use chrono::{DateTime, Utc};

use crate::config::RecordType;

/// What happened to one record during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Published value already matched the desired one
    Skipped {
        /// The value currently published
        current: IpAddr,
    },
    /// The record was replaced (or created) with a new value
    Updated {
        /// The value now published
        new: IpAddr,
        /// Whether an existing record was deleted first
        replaced: bool,
    },
    /// Dry-run mode: the record differs and would have been updated
    WouldUpdate {
        /// The value that would be published
        new: IpAddr,
    },
    /// The update was attempted and failed
    Failed {
        /// Why the update failed
        reason: String,
    },
}

/// Outcome for one `(fqdn, record type)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Fully qualified record name (host.domain)
    pub fqdn: String,
    /// Address family of the record
    pub record_type: RecordType,
    /// What happened
    pub outcome: Outcome,
}

/// Summary of one complete pass over all configured domains and hosts
#[derive(Debug, Clone)]
pub struct RunReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Per-record outcomes, in visit order
    pub outcomes: Vec<RecordOutcome>,
    /// Set when authentication failed and the remainder of the run was
    /// abandoned; hosts not yet visited have no outcome entry
    pub aborted: Option<String>,
}

impl RunReport {
    /// Whether anything in this run went wrong
    pub fn has_failures(&self) -> bool {
        self.aborted.is_some()
            || self
                .outcomes
                .iter()
                .any(|o| matches!(o.outcome, Outcome::Failed { .. }))
    }

    /// Number of records updated (or that would be, in dry-run mode)
    pub fn updated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Updated { .. } | Outcome::WouldUpdate { .. }))
            .count()
    }

    /// Number of records skipped as already up to date
    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Skipped { .. }))
            .count()
    }

    /// Number of failed record updates
    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Failed { .. }))
            .count()
    }
}
