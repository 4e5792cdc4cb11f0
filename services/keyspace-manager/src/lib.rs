//! Idempotent keyspace reconciliation for Cassandra and ScyllaDB.
//!
//! Given the declared state of one keyspace, the reconciler inspects the live
//! cluster and issues at most one CREATE, ALTER or DROP KEYSPACE statement.

pub mod cli;
pub mod config;
pub mod diff;
pub mod inspect;
pub mod reconciler;
pub mod replication;
pub mod spec;

#[cfg(test)]
mod mock;

pub use diff::{diff_keyspace, keyspace_is_changed, KeyspaceDiff};
pub use reconciler::{KeyspaceReconciler, Plan, ReconcilerState, ReconciliationResult};
pub use replication::LiveKeyspaceConfig;
pub use spec::DesiredKeyspaceSpec;
