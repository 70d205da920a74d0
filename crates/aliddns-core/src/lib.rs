// # aliddns-core
//
// Core library for the aliddns dynamic DNS updater.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for resolving the current public IP address
// - **DnsProvider**: Trait for looking up, creating and updating DNS records
// - **Reconciler**: Chooses create / update / no-op for one record and IP
// - **DdnsContext**: Configuration plus collaborators for one pass
// - **Scheduler**: Optional periodic driver running passes sequentially
// - **ProviderRegistry**: Name → factory registry for providers and IP sources
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decision logic is separate from API clients
// 2. **No Global State**: Everything a pass needs is passed in explicitly
// 3. **Plugin-Based**: Providers are registered by name, not hard-coded
// 4. **Idempotency**: A pass that finds the record in sync mutates nothing

pub mod traits;
pub mod config;
pub mod context;
pub mod error;
pub mod reconciler;
pub mod registry;
pub mod scheduler;

// Re-export core types for convenience
pub use traits::{DnsProvider, DnsRecord, IpSource, RecordType};
pub use config::{DdnsConfig, IpResolverKind, IpVersion, RecordTarget, RecordTypePolicy};
pub use context::DdnsContext;
pub use error::{Error, Result};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use registry::ProviderRegistry;
pub use scheduler::{Scheduler, SchedulerStats};
