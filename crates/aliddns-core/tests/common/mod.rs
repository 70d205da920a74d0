//! Test doubles and common utilities for reconciliation contract tests
//!
//! The mock provider keeps an in-memory zone so that a create or update
//! is visible to the next lookup, which is what idempotence tests need.

#![allow(dead_code)]

use aliddns_core::error::{Error, Result};
use aliddns_core::traits::{DnsProvider, DnsRecord, IpSource, RecordType};
use aliddns_core::DdnsConfig;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mutating call observed by the mock provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create {
        rr: String,
        zone: String,
        record_type: RecordType,
        ip: String,
    },
    Update {
        record_id: String,
        rr: String,
        record_type: RecordType,
        ip: String,
    },
}

/// How the mock answers lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupBehavior {
    /// Answer from the in-memory zone
    Normal,
    /// Fail with `Error::NotFound`
    NotFoundError,
    /// Fail with a generic provider error
    Fail,
    /// Return every record in the zone, whatever the name or type
    Unfiltered,
}

/// A mock DnsProvider that records calls and keeps an in-memory zone
pub struct MockDnsProvider {
    records: Arc<Mutex<Vec<DnsRecord>>>,
    mutations: Arc<Mutex<Vec<Mutation>>>,
    lookup_count: Arc<AtomicUsize>,
    next_id: Arc<AtomicUsize>,
    lookup: LookupBehavior,
    fail_mutations: bool,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            mutations: Arc::new(Mutex::new(Vec::new())),
            lookup_count: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicUsize::new(1)),
            lookup: LookupBehavior::Normal,
            fail_mutations: false,
            delay: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Seed an existing A record
    pub fn with_a_record(self, id: &str, rr: &str, zone: &str, value: &str) -> Self {
        self.records.lock().unwrap().push(DnsRecord {
            id: id.to_string(),
            rr: rr.to_string(),
            domain_name: zone.to_string(),
            record_type: Some(RecordType::A),
            value: value.to_string(),
            ttl: Some(600),
            line: Some("default".to_string()),
        });
        self
    }

    /// Seed an arbitrary record
    pub fn with_record(self, record: DnsRecord) -> Self {
        self.records.lock().unwrap().push(record);
        self
    }

    pub fn with_lookup(mut self, lookup: LookupBehavior) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn failing_mutations(mut self) -> Self {
        self.fail_mutations = true;
        self
    }

    /// Make every lookup take `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Create a new MockDnsProvider that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            records: Arc::clone(&other.records),
            mutations: Arc::clone(&other.mutations),
            lookup_count: Arc::clone(&other.lookup_count),
            next_id: Arc::clone(&other.next_id),
            lookup: other.lookup,
            fail_mutations: other.fail_mutations,
            delay: other.delay,
            in_flight: Arc::clone(&other.in_flight),
            max_in_flight: Arc::clone(&other.max_in_flight),
        }
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.mutations.lock().unwrap().clone()
    }

    pub fn creates(&self) -> usize {
        self.mutations()
            .iter()
            .filter(|m| matches!(m, Mutation::Create { .. }))
            .count()
    }

    pub fn updates(&self) -> usize {
        self.mutations()
            .iter()
            .filter(|m| matches!(m, Mutation::Update { .. }))
            .count()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn describe_subdomain_records(
        &self,
        subdomain: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>> {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.lookup {
            LookupBehavior::NotFoundError => {
                return Err(Error::not_found(format!("no records for {}", subdomain)));
            }
            LookupBehavior::Fail => {
                return Err(Error::provider("mock", "InternalError: lookup failed"));
            }
            LookupBehavior::Unfiltered => {
                return Ok(self.records.lock().unwrap().clone());
            }
            LookupBehavior::Normal => {}
        }

        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| {
                let name = if r.rr == "@" {
                    r.domain_name.clone()
                } else {
                    format!("{}.{}", r.rr, r.domain_name)
                };
                name == subdomain && r.record_type == Some(record_type)
            })
            .cloned()
            .collect())
    }

    async fn create_record(
        &self,
        rr: &str,
        zone: &str,
        record_type: RecordType,
        ip: IpAddr,
    ) -> Result<String> {
        self.mutations.lock().unwrap().push(Mutation::Create {
            rr: rr.to_string(),
            zone: zone.to_string(),
            record_type,
            ip: ip.to_string(),
        });

        if self.fail_mutations {
            return Err(Error::provider("mock", "QuotaExceeded: too many records"));
        }

        let id = format!("rec{}", 100 + self.next_id.fetch_add(1, Ordering::SeqCst));
        self.records.lock().unwrap().push(DnsRecord {
            id: id.clone(),
            rr: rr.to_string(),
            domain_name: zone.to_string(),
            record_type: Some(record_type),
            value: ip.to_string(),
            ttl: Some(600),
            line: Some("default".to_string()),
        });
        Ok(id)
    }

    async fn update_record(
        &self,
        record_id: &str,
        rr: &str,
        record_type: RecordType,
        ip: IpAddr,
    ) -> Result<()> {
        self.mutations.lock().unwrap().push(Mutation::Update {
            record_id: record_id.to_string(),
            rr: rr.to_string(),
            record_type,
            ip: ip.to_string(),
        });

        if self.fail_mutations {
            return Err(Error::provider("mock", "DomainRecordLocked"));
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| Error::not_found(record_id.to_string()))?;
        record.value = ip.to_string();
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An IP source returning a fixed address, counting calls
pub struct StaticIpSource {
    ip: Arc<Mutex<IpAddr>>,
    calls: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ip: &str) -> Self {
        Self {
            ip: Arc::new(Mutex::new(ip.parse().expect("valid test IP"))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            ip: Arc::clone(&other.ip),
            calls: Arc::clone(&other.calls),
        }
    }

    /// Change the address returned from now on
    pub fn set(&self, ip: &str) {
        *self.ip.lock().unwrap() = ip.parse().expect("valid test IP");
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.ip.lock().unwrap())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// An IP source whose endpoint is unreachable
pub struct UnreachableIpSource;

#[async_trait::async_trait]
impl IpSource for UnreachableIpSource {
    async fn current(&self) -> Result<IpAddr> {
        Err(Error::http("error sending request: connection refused"))
    }

    fn source_name(&self) -> &'static str {
        "unreachable"
    }
}

/// Helper to create a minimal valid config for www.example.com
pub fn minimal_config() -> DdnsConfig {
    DdnsConfig::new("LTAI5tTestKeyId", "test-secret", "www", "example.com")
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid test IP")
}
