// # Alibaba Cloud DNS Provider
//
// DnsProvider implementation backed by the Alibaba Cloud DNS OpenAPI
// (product `Alidns`, version 2015-01-09, RPC style).
//
// ## Behavior
//
// - One HTTP request per trait call, no retries, no caching
// - Every request signed with ACS3-HMAC-SHA256 (see `signer`)
// - HTTP timeout of 30 seconds
// - Non-2xx responses classified into authentication, rate-limit and
//   provider errors (see `response::classify_error`)
// - Dry-run mode performs lookups but only logs mutations
//
// ## Security
//
// - The AccessKey secret never appears in logs, errors or `Debug` output
//
// ## API Reference
//
// - DescribeSubDomainRecords: `SubDomain`, `Type`
// - AddDomainRecord: `DomainName`, `RR`, `Type`, `Value`, `TTL`, `Line`
// - UpdateDomainRecord: `RecordId`, `RR`, `Type`, `Value`, `TTL`, `Line`

pub mod response;
pub mod signer;

use aliddns_core::config::DdnsConfig;
use aliddns_core::traits::{DnsProvider, DnsProviderFactory, DnsRecord, RecordType};
use aliddns_core::{Error, Result};
use async_trait::async_trait;
use response::{
    classify_error, AddDomainRecordResponse, DescribeSubDomainRecordsResponse,
    UpdateDomainRecordResponse, PROVIDER,
};
use serde::de::DeserializeOwned;
use signer::{RequestStamp, Signer};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size requested from DescribeSubDomainRecords (API maximum)
const DESCRIBE_PAGE_SIZE: &str = "500";

/// Default API endpoint for a region
pub fn default_endpoint(region_id: &str) -> String {
    format!("https://alidns.{}.aliyuncs.com", region_id)
}

/// Alibaba Cloud DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true the provider still performs lookups, but
/// `create_record` and `update_record` log the request they would send and
/// return without calling the API.
pub struct AlidnsProvider {
    /// AccessKey id
    access_key_id: String,

    /// AccessKey secret
    /// ⚠️ NEVER log this value
    access_secret: String,

    /// Base URL, `scheme://host[:port]`
    endpoint: String,

    /// Host header value signed into every request
    host: String,

    /// TTL sent with create and update
    ttl: u32,

    /// Resolution line sent with create and update
    line: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: lookups run, mutations are only logged
    dry_run: bool,
}

// Custom Debug implementation that hides the AccessKey secret
impl std::fmt::Debug for AlidnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlidnsProvider")
            .field("access_key_id", &self.access_key_id)
            .field("access_secret", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .field("ttl", &self.ttl)
            .field("line", &self.line)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl AlidnsProvider {
    /// Create a provider talking to `endpoint`
    ///
    /// `endpoint` must be an absolute HTTP(S) URL without a path, e.g.
    /// `https://alidns.cn-hangzhou.aliyuncs.com`.
    pub fn new(
        access_key_id: impl Into<String>,
        access_secret: impl Into<String>,
        endpoint: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let access_secret = access_secret.into();

        if access_key_id.is_empty() || access_secret.is_empty() {
            return Err(Error::config("AccessKey id and secret are required"));
        }

        let endpoint: String = endpoint.into();
        let endpoint = endpoint.trim_end_matches('/').to_string();
        let host = host_of(&endpoint)?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            access_key_id,
            access_secret,
            endpoint,
            host,
            ttl: 600,
            line: "default".to_string(),
            client,
            dry_run,
        })
    }

    /// Create a live provider for the default endpoint of `region_id`
    pub fn new_live(
        access_key_id: impl Into<String>,
        access_secret: impl Into<String>,
        region_id: &str,
    ) -> Result<Self> {
        Self::new(access_key_id, access_secret, default_endpoint(region_id), false)
    }

    /// Create a dry-run provider for the default endpoint of `region_id`
    pub fn new_dry_run(
        access_key_id: impl Into<String>,
        access_secret: impl Into<String>,
        region_id: &str,
    ) -> Result<Self> {
        Self::new(access_key_id, access_secret, default_endpoint(region_id), true)
    }

    /// Set the TTL and line sent with create and update requests
    pub fn with_record_defaults(mut self, ttl: u32, line: impl Into<String>) -> Self {
        self.ttl = ttl;
        self.line = line.into();
        self
    }

    /// Base URL requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether mutations are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Call one RPC action and decode its JSON response
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /?{sorted, percent-encoded params}
    /// Host: alidns.{region}.aliyuncs.com
    /// x-acs-action: {action}
    /// x-acs-version: 2015-01-09
    /// Authorization: ACS3-HMAC-SHA256 Credential=...,SignedHeaders=...,Signature=...
    /// ```
    async fn call<T: DeserializeOwned>(
        &self,
        action: &'static str,
        params: BTreeMap<String, String>,
    ) -> Result<T> {
        let query = signer::canonical_query(&params);
        let stamp = RequestStamp::now();
        let headers = Signer::new(&self.access_key_id, &self.access_secret).sign(
            &self.host,
            action,
            &query,
            &stamp,
        )?;

        let url = if query.is_empty() {
            format!("{}/", self.endpoint)
        } else {
            format!("{}/?{}", self.endpoint, query)
        };

        tracing::debug!("Calling {} on {}", action, self.endpoint);

        let mut request = self.client.get(&url);
        for (name, value) in &headers {
            // reqwest derives Host from the URL, which is what was signed
            if name != "host" {
                request = request.header(name.as_str(), value.as_str());
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read {} response: {}", action, e)))?;

        if !status.is_success() {
            let err = classify_error(status.as_u16(), &body);
            tracing::debug!("{} failed with status {}: {}", action, status, err);
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse {} response: {}", action, e))
        })
    }

    fn mutation_params(
        &self,
        rr: &str,
        record_type: RecordType,
        ip: IpAddr,
    ) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("RR".to_string(), rr.to_string());
        params.insert("Type".to_string(), record_type.as_str().to_string());
        params.insert("Value".to_string(), ip.to_string());
        params.insert("TTL".to_string(), self.ttl.to_string());
        params.insert("Line".to_string(), self.line.clone());
        params
    }
}

/// Extract the Host header value (`host[:port]`) from an endpoint URL
fn host_of(endpoint: &str) -> Result<String> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| Error::config(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::config(format!(
            "Endpoint must use HTTP or HTTPS scheme. Got: {}",
            endpoint
        )));
    }

    if url.path() != "/" || url.query().is_some() {
        return Err(Error::config(format!(
            "Endpoint must not contain a path or query. Got: {}",
            endpoint
        )));
    }

    let host = url
        .host_str()
        .ok_or_else(|| Error::config(format!("Endpoint has no host: {}", endpoint)))?;

    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[async_trait]
impl DnsProvider for AlidnsProvider {
    async fn describe_subdomain_records(
        &self,
        subdomain: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Looking up {} records for {}", record_type, subdomain);

        let mut params = BTreeMap::new();
        params.insert("SubDomain".to_string(), subdomain.to_string());
        params.insert("Type".to_string(), record_type.as_str().to_string());
        params.insert("PageSize".to_string(), DESCRIBE_PAGE_SIZE.to_string());

        let response: DescribeSubDomainRecordsResponse =
            self.call("DescribeSubDomainRecords", params).await?;

        let records: Vec<DnsRecord> = response
            .domain_records
            .record
            .into_iter()
            .map(DnsRecord::from)
            .collect();

        tracing::debug!(
            "Found {} record(s) for {} (RequestId: {})",
            records.len(),
            subdomain,
            response.request_id.as_deref().unwrap_or("-")
        );
        Ok(records)
    }

    async fn create_record(
        &self,
        rr: &str,
        zone: &str,
        record_type: RecordType,
        ip: IpAddr,
    ) -> Result<String> {
        let mut params = self.mutation_params(rr, record_type, ip);
        params.insert("DomainName".to_string(), zone.to_string());

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would call AddDomainRecord with {}",
                signer::canonical_query(&params)
            );
            return Ok("dry-run".to_string());
        }

        let response: AddDomainRecordResponse = self.call("AddDomainRecord", params).await?;

        tracing::debug!(
            "AddDomainRecord succeeded (RequestId: {})",
            response.request_id.as_deref().unwrap_or("-")
        );
        Ok(response.record_id)
    }

    async fn update_record(
        &self,
        record_id: &str,
        rr: &str,
        record_type: RecordType,
        ip: IpAddr,
    ) -> Result<()> {
        let mut params = self.mutation_params(rr, record_type, ip);
        params.insert("RecordId".to_string(), record_id.to_string());

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would call UpdateDomainRecord with {}",
                signer::canonical_query(&params)
            );
            return Ok(());
        }

        let response: UpdateDomainRecordResponse =
            self.call("UpdateDomainRecord", params).await?;

        tracing::debug!(
            "UpdateDomainRecord succeeded for {} (RequestId: {})",
            response.record_id.as_deref().unwrap_or(record_id),
            response.request_id.as_deref().unwrap_or("-")
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Alibaba Cloud DNS providers
pub struct AlidnsFactory;

impl DnsProviderFactory for AlidnsFactory {
    fn create(&self, config: &DdnsConfig) -> Result<Box<dyn DnsProvider>> {
        if config.access_key_id.is_empty() || config.access_secret.is_empty() {
            return Err(Error::config("access_key_id and access_secret are required"));
        }

        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| default_endpoint(&config.region_id));

        if config.dry_run {
            tracing::warn!("AliDNS provider running in DRY-RUN mode - no changes will be made");
        }

        let provider = AlidnsProvider::new(
            config.access_key_id.clone(),
            config.access_secret.clone(),
            endpoint,
            config.dry_run,
        )?
        .with_record_defaults(config.ttl, config.line.clone());

        Ok(Box::new(provider))
    }
}

/// Register the AliDNS provider with a registry under the name "alidns"
///
/// # Example
///
/// ```rust
/// use aliddns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// aliddns_alidns::register(&registry);
/// assert!(registry.has_provider("alidns"));
/// ```
pub fn register(registry: &aliddns_core::ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(AlidnsFactory));
}
