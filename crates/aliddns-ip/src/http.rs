//! HTTP GET resolver
//!
//! Fetches a plain-text address from an endpoint such as
//! `https://api.ipify.org`. Every call performs a fresh request.

use aliddns_core::config::{DdnsConfig, IpVersion};
use aliddns_core::traits::{parse_ip_text, IpSource, IpSourceFactory};
use aliddns_core::{Error, Result};
use std::net::IpAddr;
use std::time::Duration;

/// Default HTTP timeout for IP lookups (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP-based IP source
pub struct HttpIpSource {
    /// URL to fetch the address from
    url: String,

    /// Address family the endpoint must return
    version: IpVersion,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL returning the caller's address as plain text
    /// - `version`: address family to accept
    pub fn new(url: impl Into<String>, version: IpVersion) -> Result<Self> {
        Self::with_timeout(url, version, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(
        url: impl Into<String>,
        version: IpVersion,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ip_source(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            version,
            client,
        })
    }

    /// The endpoint queried
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        tracing::debug!("Fetching public IP from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "{} returned HTTP {}",
                self.url,
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))?;

        parse_ip_text(&text, self.version)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Factory for creating HTTP IP sources from `curl_domain`
pub struct HttpFactory;

impl IpSourceFactory for HttpFactory {
    fn create(&self, config: &DdnsConfig) -> Result<Box<dyn IpSource>> {
        if config.curl_domain.trim().is_empty() {
            return Err(Error::config("curl_domain is required for the HTTP resolver"));
        }

        Ok(Box::new(HttpIpSource::new(
            config.curl_domain.clone(),
            config.ip_version(),
        )?))
    }
}
