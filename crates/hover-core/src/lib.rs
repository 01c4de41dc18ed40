// # hover-core
//
// Core library for the hover-ddns record synchronizer.
//
// ## Architecture Overview
//
// This library provides the reconciliation core that keeps A/AAAA records
// at the provider in sync with the machine's public addresses:
//
// - **PublicIpResolver**: Trait for discovering the current public IPs
// - **DnsChecker**: Trait for reading the currently published record values
// - **RecordClient**: Trait for the authenticated provider record API
// - **ReconcileEngine**: Drives one pass over all domains/hosts and decides
//   what needs changing
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Discovery, checking, and mutation are
//    separate capabilities behind traits
// 2. **Run-Based**: Work happens in discrete, serialized passes; no
//    background tasks
// 3. **Lazy Authentication**: A session is established at most once per
//    run, and only when a change is actually needed
// 4. **Failure Containment**: One record's failure never stops the rest of
//    the run

pub mod checker;
pub mod config;
pub mod engine;
pub mod error;
pub mod manual;
pub mod report;
pub mod traits;

// Re-export core types for convenience
pub use checker::AuthoritativeChecker;
pub use config::{DdnsConfig, DomainTarget, PublicIpConfig, RecordType, TextService};
pub use engine::{DesiredState, EngineSettings, ReconcileEngine};
pub use error::{Error, Result};
pub use manual::ManualIpResolver;
pub use report::{Outcome, RecordOutcome, RunReport};
pub use traits::{
    AuthSession, DnsChecker, PublicIpResolver, RecordClient, SessionCookie, SessionState,
    UpsertOutcome,
};
