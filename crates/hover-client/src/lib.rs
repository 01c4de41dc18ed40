// # Hover Record API Client
//
// This crate implements the authenticated session against the Hover
// record API and the record replacement operation for the hover-ddns
// system.
//
// ## Protocol
//
// The API authenticates with two opaque cookies instead of a token:
//
// 1. GET the sign-in page; the response sets a session cookie
// 2. POST JSON credentials with that cookie attached; the response sets
//    an auth cookie (the response may carry several cookies of that name,
//    only the one with a non-empty value is real)
//
// Every later call attaches both cookies. There is no update verb: a
// record change is DELETE old entry, then POST a new one.
//
// ## API Reference
//
// - Sign-in page: GET `/signin`
// - Credential exchange: POST `/api/login`
// - Domain list: GET `/api/domains/`
// - Domain records: GET/POST `/api/domains/{domain_id}/dns`
// - Record delete: DELETE `/api/dns/{record_id}`

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use hover_core::config::RecordType;
use hover_core::traits::{
    AuthSession, RecordClient, SessionCookie, SessionState, UpsertOutcome,
};
use hover_core::{Error, Result};
use reqwest::header::COOKIE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Production API base URL
const HOVER_BASE_URL: &str = "https://www.hover.com";

/// Sign-in page; sets the session cookie
const SIGNIN_PATH: &str = "/signin";

/// Credential exchange endpoint; sets the auth cookie
const AUTH_PATH: &str = "/api/login";

/// Domain list endpoint
const DOMAINS_PATH: &str = "/api/domains/";

/// Name of the cookie set by the sign-in page
const SESSION_COOKIE_NAME: &str = "hover_session";

/// Name of the cookie set by the credential exchange
const AUTH_COOKIE_NAME: &str = "hoverauth";

/// TTL attached to every record this client creates
const RECORD_TTL: u32 = 3600;

/// Total per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection establishment timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Idle keep-alive connections are dropped after this long
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Envelope of the domain list endpoint
#[derive(Debug, Deserialize)]
struct DomainListResponse {
    succeeded: bool,
    #[serde(default)]
    domains: Vec<DomainSummary>,
}

/// One domain as listed by the provider
#[derive(Debug, Deserialize)]
struct DomainSummary {
    id: String,
    domain_name: String,
}

/// Envelope of the domain records endpoint.
///
/// The entries are nested under a field named `domains` even though they
/// are records; the asymmetry is part of the wire format.
#[derive(Debug, Deserialize)]
struct RecordListResponse {
    succeeded: bool,
    #[serde(default)]
    domains: Vec<RecordGroup>,
}

#[derive(Debug, Deserialize)]
struct RecordGroup {
    #[serde(default)]
    entries: Vec<RecordEntry>,
}

/// One DNS entry as listed by the provider
#[derive(Debug, Deserialize)]
struct RecordEntry {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
}

/// Body of the credential exchange
#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

/// Body of the record create call
#[derive(Debug, Serialize)]
struct CreateRecordBody<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    content: String,
    ttl: u32,
}

/// Client for the cookie-authenticated Hover record API
///
/// Holds the credentials and, once [`RecordClient::login`] has run, the
/// immutable [`AuthSession`] for the remainder of the run. The session is
/// never persisted and is dropped by [`RecordClient::reset_session`] at
/// the start of the next run.
pub struct HoverClient {
    base_url: String,
    username: String,
    password: String,
    http: reqwest::Client,
    session: SessionState,
}

impl std::fmt::Debug for HoverClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoverClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("authenticated", &self.session.is_authenticated())
            .finish()
    }
}

impl HoverClient {
    /// Create a client against the production API
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::with_base_url(HOVER_BASE_URL, username, password)
    }

    /// Create a client against a different base URL (tests, staging)
    pub fn with_base_url(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            http,
            session: SessionState::Unauthenticated,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `Cookie` header value for authenticated calls
    fn cookie_header(&self) -> Result<String> {
        match &self.session {
            SessionState::Authenticated(session) => Ok(session.cookie_header()),
            SessionState::Unauthenticated => Err(Error::auth("not authenticated")),
        }
    }

    /// Find the record ID for an exact `(host, type)` match under a domain.
    ///
    /// `Ok(None)` means the record does not exist yet, which is a normal
    /// result, not an error. When the same name/type appears more than
    /// once, the last entry in response order wins.
    pub async fn find_record_id(
        &self,
        domain_id: &str,
        host: &str,
        record_type: RecordType,
    ) -> Result<Option<String>> {
        let url = self.url(&format!("/api/domains/{domain_id}/dns"));
        let response = self
            .http
            .get(&url)
            .header(COOKIE, self.cookie_header()?)
            .send()
            .await
            .map_err(|e| Error::http(format!("record list request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::remote_api(format!(
                "record list for domain {domain_id} returned status {status}"
            )));
        }

        let body: RecordListResponse = response
            .json()
            .await
            .map_err(|e| Error::http(format!("could not parse record list: {e}")))?;

        if !body.succeeded || body.domains.len() != 1 {
            return Err(Error::remote_api(format!(
                "record list request for domain {domain_id} failed"
            )));
        }

        let mut record_id = None;
        for entry in &body.domains[0].entries {
            debug!(
                "record: {} {} {}",
                entry.name, entry.record_type, entry.content
            );
            if entry.name == host && entry.record_type == record_type.as_str() {
                record_id = Some(entry.id.clone());
            }
        }

        Ok(record_id)
    }

    async fn delete_record(&self, record_id: &str) -> Result<()> {
        let url = self.url(&format!("/api/dns/{record_id}"));
        let response = self
            .http
            .delete(&url)
            .header(COOKIE, self.cookie_header()?)
            .send()
            .await
            .map_err(|e| Error::http(format!("record delete request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::remote_api(format!(
                "deleting record {record_id} returned status {status}"
            )));
        }
        Ok(())
    }

    async fn create_record(
        &self,
        domain_id: &str,
        host: &str,
        value: IpAddr,
        record_type: RecordType,
    ) -> Result<()> {
        let body = CreateRecordBody {
            name: host,
            record_type: record_type.as_str(),
            content: value.to_string(),
            ttl: RECORD_TTL,
        };

        let url = self.url(&format!("/api/domains/{domain_id}/dns"));
        let response = self
            .http
            .post(&url)
            .header(COOKIE, self.cookie_header()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::http(format!("record create request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::remote_api(format!(
                "creating record {host} ({record_type}) returned status {status}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordClient for HoverClient {
    async fn login(&mut self) -> Result<()> {
        // Step 1: the sign-in page hands out the session cookie.
        let response = self
            .http
            .get(self.url(SIGNIN_PATH))
            .send()
            .await
            .map_err(|e| Error::auth(format!("sign-in page request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::auth(format!(
                "sign-in page returned status {status}"
            )));
        }

        let session_cookie = response
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE_NAME)
            .map(|c| SessionCookie::new(c.name(), c.value()))
            .ok_or_else(|| Error::auth("sign-in page did not set a session cookie"))?;
        debug!("got session cookie");

        // Step 2: exchange credentials for the auth cookie.
        let body = LoginBody {
            username: &self.username,
            password: &self.password,
        };
        let response = self
            .http
            .post(self.url(AUTH_PATH))
            .header(
                COOKIE,
                format!("{}={}", session_cookie.name, session_cookie.value),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::auth(format!("credential exchange failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("credential exchange response body: {body}");
            return Err(Error::auth(format!(
                "credential exchange returned status {status}"
            )));
        }

        // The response carries two cookies of this name, the first one
        // with an empty value; only the non-empty one is the credential.
        let auth_cookie = response
            .cookies()
            .find(|c| c.name() == AUTH_COOKIE_NAME && !c.value().is_empty())
            .map(|c| SessionCookie::new(c.name(), c.value()))
            .ok_or_else(|| Error::auth("did not receive an auth cookie"))?;

        self.session = SessionState::Authenticated(AuthSession {
            session: session_cookie,
            auth: auth_cookie,
        });
        info!("session established for {}", self.username);
        Ok(())
    }

    fn session(&self) -> &SessionState {
        &self.session
    }

    fn reset_session(&mut self) {
        self.session = SessionState::Unauthenticated;
    }

    async fn resolve_domain_id(&self, domain: &str) -> Result<String> {
        let response = self
            .http
            .get(self.url(DOMAINS_PATH))
            .header(COOKIE, self.cookie_header()?)
            .send()
            .await
            .map_err(|e| Error::http(format!("domain list request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::remote_api(format!(
                "domain list returned status {status}"
            )));
        }

        let body: DomainListResponse = response
            .json()
            .await
            .map_err(|e| Error::http(format!("could not parse domain list: {e}")))?;

        if !body.succeeded {
            return Err(Error::remote_api("domain list request failed"));
        }

        let mut domain_id = None;
        for summary in &body.domains {
            if summary.domain_name == domain {
                domain_id = Some(summary.id.clone());
            }
        }

        domain_id.ok_or_else(|| {
            Error::domain_not_found(format!("could not find domain '{domain}' in domain list"))
        })
    }

    async fn upsert(
        &self,
        domain_id: &str,
        host: &str,
        value: IpAddr,
        record_type: RecordType,
    ) -> Result<UpsertOutcome> {
        // Reject a family mismatch locally; it must never reach the wire.
        if !record_type.matches(value) {
            return Err(Error::invalid_input(format!(
                "'{value}' is not a valid {record_type} record value"
            )));
        }

        match self.find_record_id(domain_id, host, record_type).await? {
            Some(record_id) => {
                // No in-place update exists: delete the old entry, then
                // create the new one. Between the two calls the record is
                // briefly absent from the zone; that window is accepted.
                info!("found existing record {record_id}, deleting");
                self.delete_record(&record_id).await?;

                if let Err(e) = self.create_record(domain_id, host, value, record_type).await {
                    return Err(Error::ReplaceIncomplete {
                        fqdn: host.to_string(),
                        record_type,
                        reason: e.to_string(),
                    });
                }
                Ok(UpsertOutcome::Replaced)
            }
            None => {
                info!("no existing {record_type} record for {host}, creating");
                self.create_record(domain_id, host, value, record_type)
                    .await?;
                Ok(UpsertOutcome::Created)
            }
        }
    }
}
