//! Periodic driver
//!
//! Runs one reconciliation pass immediately and then one per interval until
//! shutdown. Each pass is awaited before the next tick is taken, so passes
//! never overlap; a pass that outlasts the interval delays the next one
//! instead of stacking up.
//!
//! Single-shot use (cron, systemd timers) does not need this module: call
//! [`DdnsContext::run_once`] directly.

use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::context::DdnsContext;
use crate::error::Result;

/// Counters describing a scheduler run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Passes started
    pub passes: usize,
    /// Passes that ended with an error
    pub failures: usize,
    /// Passes that created or updated the record
    pub mutations: usize,
}

/// Sequential periodic scheduler
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    /// Create a scheduler with a fixed interval
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Create a scheduler using `interval_secs` from the context's configuration
    pub fn from_context(ctx: &DdnsContext) -> Self {
        Self::new(Duration::from_secs(ctx.config().interval_secs))
    }

    /// The interval between passes
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run passes until `shutdown` completes
    ///
    /// Pass errors are logged and counted; they never stop the loop.
    pub async fn run_until<F>(
        &self,
        ctx: &DdnsContext,
        ip_override: Option<IpAddr>,
        shutdown: F,
    ) -> Result<SchedulerStats>
    where
        F: Future<Output = ()>,
    {
        let mut stats = SchedulerStats::default();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        info!(
            "Scheduler started for {} (interval {:?})",
            ctx.target(),
            self.interval
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }

                _ = ticker.tick() => {
                    stats.passes += 1;
                    debug!("Starting pass {}", stats.passes);

                    match ctx.run_once(ip_override).await {
                        Ok(outcome) => {
                            if outcome.mutated() {
                                stats.mutations += 1;
                            }
                            debug!("Pass {} finished: {:?}", stats.passes, outcome);
                        }
                        Err(e) => {
                            stats.failures += 1;
                            error!("Pass {} failed: {}", stats.passes, e);
                        }
                    }
                }
            }
        }

        info!(
            "Scheduler stopped after {} pass(es), {} failure(s)",
            stats.passes, stats.failures
        );
        Ok(stats)
    }
}

/// Resolve when the process receives SIGINT or SIGTERM
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
    }
}

/// Resolve when the process receives CTRL-C
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for CTRL-C: {}", e);
    }
}
