use async_trait::async_trait;

use crate::errors::KeyspaceError;
use super::profile::ConnectionProfile;
use super::schema::{KeyspaceDefinition, SchemaCatalog};

/// The CQL operations keyspace reconciliation needs from an open session.
#[async_trait]
pub trait CqlSession: Send + Sync {
    /// `release_version` of the coordinator node.
    async fn release_version(&self) -> Result<String, KeyspaceError>;

    /// Every keyspace name known to the catalog.
    async fn keyspace_names(&self, catalog: SchemaCatalog) -> Result<Vec<String>, KeyspaceError>;

    /// The stored definition of one keyspace, `None` if it does not exist.
    async fn keyspace_definition(
        &self,
        catalog: SchemaCatalog,
        keyspace: &str,
    ) -> Result<Option<KeyspaceDefinition>, KeyspaceError>;

    /// Executes a statement that returns no rows (DDL).
    async fn execute(&self, cql: &str) -> Result<(), KeyspaceError>;
}

/// Opens sessions for a connection profile.
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    async fn connect(&self, profile: &ConnectionProfile) -> Result<Box<dyn CqlSession>, KeyspaceError>;
}
