//! Explicit run context
//!
//! Everything a reconciliation pass needs (the loaded configuration, the IP
//! source and the provider handle) lives in one [`DdnsContext`] that is
//! passed to whoever drives the passes. There is no global state.

use std::net::IpAddr;

use tracing::{debug, error, info};

use crate::config::{DdnsConfig, RecordTarget};
use crate::error::{Error, Result};
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::traits::{DnsProvider, IpSource};

/// Loaded configuration plus the collaborators a pass talks to
pub struct DdnsContext {
    config: DdnsConfig,
    target: RecordTarget,
    ip_source: Box<dyn IpSource>,
    reconciler: Reconciler,
}

impl DdnsContext {
    /// Build a context, validating the configuration first
    pub fn new(
        config: DdnsConfig,
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let target = config.target();
        let reconciler = Reconciler::new(provider, config.record_type);

        Ok(Self {
            config,
            target,
            ip_source,
            reconciler,
        })
    }

    /// The configuration this context was built from
    pub fn config(&self) -> &DdnsConfig {
        &self.config
    }

    /// The managed record
    pub fn target(&self) -> &RecordTarget {
        &self.target
    }

    /// Resolve the public IP address
    ///
    /// Any failure is reported as `Error::IpSource`.
    pub async fn resolve_ip(&self) -> Result<IpAddr> {
        let ip = self.ip_source.current().await.map_err(|e| {
            if e.is_ip_source() {
                e
            } else {
                Error::ip_source(e.to_string())
            }
        })?;

        info!("Public IP ({}): {}", self.ip_source.source_name(), ip);
        Ok(ip)
    }

    /// Run one reconciliation pass
    ///
    /// With `ip_override` set the resolver is not consulted. If resolving
    /// the IP fails no provider call is made.
    pub async fn run_once(&self, ip_override: Option<IpAddr>) -> Result<ReconcileOutcome> {
        let ip = match ip_override {
            Some(ip) => {
                debug!("Using IP override {}", ip);
                ip
            }
            None => self.resolve_ip().await?,
        };

        match self.reconciler.reconcile(&self.target, ip).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(
                    "Reconciliation of {} via {} failed: {}",
                    self.target,
                    self.reconciler.provider_name(),
                    e
                );
                Err(e)
            }
        }
    }
}
