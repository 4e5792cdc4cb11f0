use std::collections::BTreeMap;

use svckit::database::QueryBuilder;
use svckit::errors::KeyspaceError;
use svckit::types::{KeyspaceState, ReplicationClass};

/// Longest unquoted keyspace name Cassandra accepts.
pub const MAX_KEYSPACE_NAME_LEN: usize = 48;

/// Declared state of a single keyspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredKeyspaceSpec {
    pub name: String,
    pub state: KeyspaceState,
    pub replication_factor: u32,
    pub durable_writes: bool,
    /// Datacentre name to replication factor; non-empty means NetworkTopologyStrategy.
    pub data_centres: BTreeMap<String, u32>,
}

impl DesiredKeyspaceSpec {
    pub fn new(name: impl Into<String>, state: KeyspaceState) -> Self {
        Self {
            name: name.into(),
            state,
            replication_factor: 1,
            durable_writes: true,
            data_centres: BTreeMap::new(),
        }
    }

    pub fn with_replication_factor(mut self, replication_factor: u32) -> Self {
        self.replication_factor = replication_factor;
        self
    }

    pub fn with_durable_writes(mut self, durable_writes: bool) -> Self {
        self.durable_writes = durable_writes;
        self
    }

    pub fn with_data_centre(mut self, name: impl Into<String>, replication_factor: u32) -> Self {
        self.data_centres.insert(name.into(), replication_factor);
        self
    }

    pub fn validate(&self) -> Result<(), KeyspaceError> {
        if self.name.is_empty() {
            return Err(KeyspaceError::ConfigError("name is required".to_string()));
        }
        if self.name.len() > MAX_KEYSPACE_NAME_LEN
            || !self.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(KeyspaceError::ConfigError(format!(
                "Invalid keyspace name '{}': expected 1-{} characters of [A-Za-z0-9_]",
                self.name, MAX_KEYSPACE_NAME_LEN
            )));
        }
        if self.data_centres.is_empty() && self.replication_factor < 1 {
            return Err(KeyspaceError::ConfigError(
                "replication_factor must be at least 1".to_string(),
            ));
        }
        if self.data_centres.keys().any(|dc| dc.trim().is_empty()) {
            return Err(KeyspaceError::ConfigError(
                "data_centres must not contain empty datacentre names".to_string(),
            ));
        }
        Ok(())
    }

    /// Strategy implied by the declaration.
    pub fn target_class(&self) -> ReplicationClass {
        if self.data_centres.is_empty() {
            ReplicationClass::SimpleStrategy
        } else {
            ReplicationClass::NetworkTopologyStrategy
        }
    }

    pub fn create_alter_statement(&self, is_alter: bool) -> String {
        QueryBuilder::build_create_alter_keyspace(
            &self.name,
            self.replication_factor,
            self.durable_writes,
            &self.data_centres,
            is_alter,
        )
    }

    pub fn drop_statement(&self) -> String {
        QueryBuilder::build_drop_keyspace(&self.name)
    }
}
