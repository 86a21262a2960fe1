//! Deep object-graph copier.
//!
//! Copies arbitrary graphs of host objects (records, boxed structs, arrays,
//! maps, sets, tuples, property bags and closures) while preserving shared
//! references and cycles.
//!
//! # Architecture
//!
//! - [`SafetyOracle`]: decides which types are immutable enough to share
//! - `plan`: compiles and caches a per-type copy procedure
//! - [`CopySession`]: tracks source-to-copy identity for one call and
//!   switches to a queue-driven traversal for large graphs
//! - `copier`: executes plans, with adapters for each container shape
//! - [`IgnoreRegistry`]: types whose instances are replaced by defaults
//! - [`Replicator`]: owns the above and exposes the entry points
//!
//! # Debug Environment Variables
//!
//! - `REPLICA_LOG=rep_engine=debug`: log plan compilation, ignore changes
//!   and iterative escalation. Requires a call to [`init_tracing`].
//! - `REPLICA_LOG=rep_engine=trace`: also log entry points and queue drains.

mod config;
mod copier;
mod errors;
mod ignore;
mod oracle;
mod plan;
mod replicator;
mod session;
mod stack;

pub use config::{CopyConfig, DEFAULT_ITERATIVE_THRESHOLD, DEFAULT_MAX_DIRECT_TUPLE_ARITY};
pub use errors::{CloneError, CloneResult};
pub use ignore::IgnoreRegistry;
pub use oracle::SafetyOracle;
pub use replicator::Replicator;
pub use session::{CopySession, INLINE_SLOTS};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `REPLICA_LOG`.
///
/// Does nothing when the variable is unset. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if let Ok(filter) = EnvFilter::try_from_env("REPLICA_LOG") {
            // The host may already have installed a global subscriber.
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
