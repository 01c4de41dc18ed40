// # HTTP Text-Endpoint Public IP Resolver
//
// This crate discovers the machine's public address by asking a well-known
// endpoint that answers with the caller's address as plain text.
//
// ## Forced socket family
//
// Most of these endpoints serve the same hostname over both IPv4 and IPv6.
// If the lookup connection were allowed to pick its own family, an "IPv4"
// request could ride an IPv6 connection and come back with the wrong kind
// of address. Each family therefore gets its own HTTP client whose local
// side is bound to that family's unspecified address, which pins the
// socket family regardless of how the endpoint hostname resolves.
//
// ## Retry
//
// Requests are retried a fixed, small number of times with a fixed delay,
// then give up with an aggregate failure. Nothing retries indefinitely.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use async_trait::async_trait;
use hover_core::config::TextService;
use hover_core::traits::PublicIpResolver;
use hover_core::{Error, Result};
use tracing::{debug, warn};

/// ipify serves separate hostnames per family
const IPIFY_URL: &str = "https://api.ipify.org";
const IPIFY_URL_V6: &str = "https://api6.ipify.org";

/// icanhazip answers both families on one hostname
const ICANHAZIP_URL: &str = "https://icanhazip.com";

/// Amazon's checkip answers both families on one hostname
const AMAZON_URL: &str = "https://checkip.amazonaws.com";

/// How often a failing request is attempted in total
const RETRY_ATTEMPTS: usize = 3;

/// Fixed delay between attempts
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection establishment timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// [`PublicIpResolver`] backed by a plain-text HTTP endpoint
pub struct HttpTextResolver {
    url_v4: String,
    url_v6: String,
    client_v4: reqwest::Client,
    client_v6: reqwest::Client,
    attempts: usize,
    retry_delay: Duration,
}

impl HttpTextResolver {
    /// Create a resolver for one of the well-known endpoints
    pub fn for_service(service: TextService) -> Result<Self> {
        match service {
            TextService::Ipify => Self::with_urls(IPIFY_URL, Some(IPIFY_URL_V6)),
            TextService::Icanhazip => Self::with_urls(ICANHAZIP_URL, None::<&str>),
            TextService::Amazon => Self::with_urls(AMAZON_URL, None::<&str>),
        }
    }

    /// Create a resolver for a custom endpoint.
    ///
    /// `url_v6` defaults to `url_v4` for endpoints that serve both
    /// families on one hostname.
    pub fn with_urls(url_v4: impl Into<String>, url_v6: Option<impl Into<String>>) -> Result<Self> {
        let url_v4 = url_v4.into();
        let url_v6 = url_v6.map(Into::into).unwrap_or_else(|| url_v4.clone());
        Self::build(url_v4, url_v6, RETRY_ATTEMPTS, RETRY_DELAY)
    }

    fn build(url_v4: String, url_v6: String, attempts: usize, retry_delay: Duration) -> Result<Self> {
        Ok(Self {
            url_v4,
            url_v6,
            client_v4: family_bound_client(IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            client_v6: family_bound_client(IpAddr::V6(Ipv6Addr::UNSPECIFIED))?,
            attempts,
            retry_delay,
        })
    }

    /// Fetch the endpoint's answer, retrying transport and status failures.
    ///
    /// The body is only read from the first successful response; whether
    /// it parses is decided by the caller, once, without further retries.
    async fn get_text(&self, client: &reqwest::Client, url: &str) -> Result<String> {
        let mut last_error = String::new();

        for attempt in 1..=self.attempts {
            match client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    return response
                        .text()
                        .await
                        .map_err(|e| Error::public_ip(format!("could not read {url}: {e}")));
                }
                Ok(response) => {
                    last_error = format!("received status code {}", response.status());
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            warn!("request to {url} failed (attempt {attempt}/{}): {last_error}", self.attempts);
            if attempt < self.attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(Error::public_ip(format!(
            "no usable response from {url} after {} attempts: {last_error}",
            self.attempts
        )))
    }
}

#[async_trait]
impl PublicIpResolver for HttpTextResolver {
    async fn public_ipv4(&self) -> Result<Ipv4Addr> {
        let text = self.get_text(&self.client_v4, &self.url_v4).await?;
        let trimmed = text.trim();
        debug!("{} answered '{trimmed}'", self.url_v4);
        trimmed
            .parse()
            .map_err(|_| Error::public_ip(format!("'{trimmed}' is not a valid IPv4 address")))
    }

    async fn public_ipv6(&self) -> Result<Ipv6Addr> {
        let text = self.get_text(&self.client_v6, &self.url_v6).await?;
        let trimmed = text.trim();
        debug!("{} answered '{trimmed}'", self.url_v6);
        trimmed
            .parse()
            .map_err(|_| Error::public_ip(format!("'{trimmed}' is not a valid IPv6 address")))
    }
}

/// HTTP client whose outbound sockets are pinned to one address family
fn family_bound_client(local: IpAddr) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .local_address(local)
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))
}
