//! Record reconciliation
//!
//! The reconciler compares the provider's record for a target against the
//! resolved public IP and performs at most one mutating call.
//!
//! ## State machine (one pass)
//!
//! ```text
//! START ─► LOOKUP ─┬─ NOT_FOUND ───────► CREATE ─┐
//!                  ├─ FOUND_SAME ────────────────┼─► DONE
//!                  ├─ FOUND_DIFFERENT ─► UPDATE ─┘
//!                  └─ ERROR ─────────────────────► ABORT
//! ```
//!
//! No state survives a pass. Running a pass again with the same IP finds
//! the record already in sync and does nothing.

use std::net::IpAddr;

use tracing::{debug, info, warn};

use crate::config::{RecordTarget, RecordTypePolicy};
use crate::error::Result;
use crate::traits::{DnsProvider, DnsRecord, RecordType};

/// What a reconciliation pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No record existed; one was created
    Created {
        /// Id assigned by the provider
        record_id: String,
        /// The address stored
        ip: IpAddr,
    },
    /// The record pointed elsewhere and was updated
    Updated {
        /// Id of the updated record
        record_id: String,
        /// The value the record held before
        previous: String,
        /// The address stored
        ip: IpAddr,
    },
    /// The record already held the address
    Unchanged {
        /// The current address
        ip: IpAddr,
    },
}

impl ReconcileOutcome {
    /// Whether the pass issued a create or update call
    pub fn mutated(&self) -> bool {
        !matches!(self, ReconcileOutcome::Unchanged { .. })
    }
}

/// Decides between create, update and no-op for one record
pub struct Reconciler {
    /// DNS provider for lookups and mutations
    provider: Box<dyn DnsProvider>,

    /// Which record type to manage
    policy: RecordTypePolicy,
}

impl Reconciler {
    /// Create a reconciler over a provider
    pub fn new(provider: Box<dyn DnsProvider>, policy: RecordTypePolicy) -> Self {
        Self { provider, policy }
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Run one reconciliation pass for `target` against `ip`
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileOutcome)`: what was done
    /// - `Err(Error)`: the lookup failed (nothing was mutated) or the
    ///   create/update call failed. Errors are never retried here.
    pub async fn reconcile(&self, target: &RecordTarget, ip: IpAddr) -> Result<ReconcileOutcome> {
        let record_type = self.policy.record_type_for(&ip)?;

        debug!("Looking up {} record for {}", record_type, target);

        match self.lookup(target, record_type).await? {
            None => {
                info!("No {} record for {}, creating it -> {}", record_type, target, ip);
                let record_id = self
                    .provider
                    .create_record(&target.rr, &target.zone, record_type, ip)
                    .await?;
                info!("Created {} -> {} (record id {})", target, ip, record_id);
                Ok(ReconcileOutcome::Created { record_id, ip })
            }
            Some(record) if record.points_to(&ip) => {
                info!("{} already points to {}, nothing to do", target, ip);
                Ok(ReconcileOutcome::Unchanged { ip })
            }
            Some(record) => {
                info!(
                    "{} changed from {} to {}, updating record {}",
                    target, record.value, ip, record.id
                );
                self.provider
                    .update_record(&record.id, &record.rr, record_type, ip)
                    .await?;
                info!("Updated {} -> {}", target, ip);
                Ok(ReconcileOutcome::Updated {
                    record_id: record.id,
                    previous: record.value,
                    ip,
                })
            }
        }
    }

    /// Find the record for `target`, classifying "not found" as `None`
    async fn lookup(&self, target: &RecordTarget, record_type: RecordType) -> Result<Option<DnsRecord>> {
        let records = match self
            .provider
            .describe_subdomain_records(&target.subdomain(), record_type)
            .await
        {
            Ok(records) => records,
            Err(e) if e.is_not_found() => {
                debug!("Provider reports no record for {}: {}", target, e);
                return Ok(None);
            }
            Err(e) => {
                warn!("Lookup of {} failed: {}", target, e);
                return Err(e);
            }
        };

        let mut matching = records
            .into_iter()
            .filter(|r| r.rr.eq_ignore_ascii_case(&target.rr) && r.record_type == Some(record_type));

        let first = matching.next();
        let extra = matching.count();
        if extra > 0 {
            warn!(
                "{} has {} extra {} record(s); only the first is managed",
                target, extra, record_type
            );
        }

        Ok(first)
    }
}
