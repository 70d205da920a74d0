// # DNS Provider Trait
//
// Defines the interface for reading and upserting DNS records via a provider API.
//
// ## Implementations
//
// - Alibaba Cloud DNS: `aliddns-alidns` crate
//
// ## Usage
//
// ```rust,ignore
// use aliddns_core::{DnsProvider, RecordType};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let records = provider
//         .describe_subdomain_records("www.example.com", RecordType::A)
//         .await?;
//
//     if records.is_empty() {
//         provider
//             .create_record("www", "example.com", RecordType::A, "1.2.3.4".parse()?)
//             .await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// DNS record type managed by aliddns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// The record type matching an address family
    pub fn for_ip(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }

    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Parse a provider-reported type name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("A") {
            Some(RecordType::A)
        } else if s.eq_ignore_ascii_case("AAAA") {
            Some(RecordType::Aaaa)
        } else {
            None
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DNS record as reported by the provider
///
/// aliddns never caches these: every pass looks the record up again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Provider-assigned record id, required for updates
    pub id: String,
    /// Host label (e.g. "www", "@")
    pub rr: String,
    /// Zone the record lives in (e.g. "example.com")
    pub domain_name: String,
    /// Record type, `None` when the provider reports a type aliddns does not manage
    pub record_type: Option<RecordType>,
    /// Record value as stored by the provider
    pub value: String,
    /// Time-to-live, when reported
    pub ttl: Option<u32>,
    /// Resolution line, when reported
    pub line: Option<String>,
}

impl DnsRecord {
    /// Whether the record already points at `ip`
    ///
    /// Values that parse as an address are compared as addresses, so
    /// differently written IPv6 forms are equal. Anything else is compared
    /// as trimmed text.
    pub fn points_to(&self, ip: &IpAddr) -> bool {
        let value = self.value.trim();
        match value.parse::<IpAddr>() {
            Ok(current) => current == *ip,
            Err(_) => value == ip.to_string(),
        }
    }
}

/// Trait for DNS provider implementations
///
/// Providers are thin, stateless API clients: one request per call, no
/// retries, no caching, no decision about whether a change is needed.
/// The [`Reconciler`](crate::Reconciler) owns that decision.
///
/// # Error contract
///
/// - Lookups return an empty list when no record exists. A provider may
///   instead return [`Error::NotFound`](crate::Error::NotFound); the reconciler
///   treats both the same way.
/// - Every other failure is returned as-is and aborts the current pass.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the records of a fully-qualified subdomain
    ///
    /// # Parameters
    ///
    /// - `subdomain`: e.g. "www.example.com" (the zone itself for apex records)
    /// - `record_type`: only records of this type are requested
    async fn describe_subdomain_records(
        &self,
        subdomain: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Create a record and return its provider-assigned id
    async fn create_record(
        &self,
        rr: &str,
        zone: &str,
        record_type: RecordType,
        ip: IpAddr,
    ) -> Result<String, crate::Error>;

    /// Point an existing record at a new address
    async fn update_record(
        &self,
        record_id: &str,
        rr: &str,
        record_type: RecordType,
        ip: IpAddr,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from the loaded configuration
    fn create(
        &self,
        config: &crate::config::DdnsConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
