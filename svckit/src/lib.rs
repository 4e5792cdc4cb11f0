//! Shared plumbing for the keyspace tooling: connection settings, the error
//! type, and the CQL session layer used against Cassandra and ScyllaDB.

pub mod config;
pub mod database;
pub mod errors;
pub mod types;
