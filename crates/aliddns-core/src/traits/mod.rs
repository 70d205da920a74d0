//! Core traits for aliddns
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Resolve the current public IP address
//! - [`DnsProvider`]: Read and upsert DNS records via a provider API

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::{IpSource, IpSourceFactory, parse_ip_text};
pub use dns_provider::{DnsProvider, DnsProviderFactory, DnsRecord, RecordType};
