// # Record Client Trait
//
// Defines the interface for the authenticated provider session and the
// record replacement operation.
//
// The provider API offers no in-place update verb: a record change is a
// delete of the old entry followed by a create of the new one, performed
// by the client behind [`RecordClient::upsert`].

use std::net::IpAddr;

use async_trait::async_trait;

use crate::config::RecordType;

/// One opaque credential cookie as captured from a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
}

impl SessionCookie {
    /// Create a new cookie value pair
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The two-cookie credential bundle for one run
///
/// Held in memory only, never persisted, and discarded when the next run
/// starts. Immutable once captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Session cookie captured from the sign-in page
    pub session: SessionCookie,
    /// Auth cookie captured from the credential exchange
    pub auth: SessionCookie,
}

impl AuthSession {
    /// `Cookie` header value carrying both credentials
    pub fn cookie_header(&self) -> String {
        format!(
            "{}={}; {}={}",
            self.session.name, self.session.value, self.auth.name, self.auth.value
        )
    }
}

/// Authentication state of a record client
///
/// The transition is one-way per run: `Unauthenticated → Authenticated`.
/// There is no re-authentication, logout, or expiry handling within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No session established yet
    #[default]
    Unauthenticated,
    /// Session established; holds the credential bundle
    Authenticated(AuthSession),
}

impl SessionState {
    /// Whether a session has been established
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Result of an upsert operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record with that name/type existed; one was created
    Created,
    /// An existing record was deleted and recreated with the new value
    Replaced,
}

/// Trait for the authenticated provider record API
#[async_trait]
pub trait RecordClient: Send + Sync {
    /// Establish the session via the two-step cookie exchange.
    ///
    /// Called lazily by the engine, at most once per run, and never
    /// retried automatically.
    async fn login(&mut self) -> Result<(), crate::Error>;

    /// Current authentication state
    fn session(&self) -> &SessionState;

    /// Drop any session left over from a previous run
    fn reset_session(&mut self);

    /// Resolve the provider-side identifier for a domain name.
    ///
    /// A missing domain is an error scoped to that domain's hosts, not to
    /// the whole run.
    async fn resolve_domain_id(&self, domain: &str) -> Result<String, crate::Error>;

    /// Replace (or create) the record for `host` under `domain_id`.
    ///
    /// `value` must belong to the family of `record_type`; a mismatch is
    /// rejected locally before any network call.
    async fn upsert(
        &self,
        domain_id: &str,
        host: &str,
        value: IpAddr,
        record_type: RecordType,
    ) -> Result<UpsertOutcome, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_header_carries_both_cookies() {
        let session = AuthSession {
            session: SessionCookie::new("hover_session", "s123"),
            auth: SessionCookie::new("hoverauth", "a456"),
        };
        assert_eq!(
            session.cookie_header(),
            "hover_session=s123; hoverauth=a456"
        );
    }

    #[test]
    fn default_state_is_unauthenticated() {
        let state = SessionState::default();
        assert!(!state.is_authenticated());
    }
}
