use tracing::debug;

use svckit::database::{CqlSession, SchemaCatalog};
use svckit::errors::KeyspaceError;

use crate::replication::LiveKeyspaceConfig;

/// Read-side view of the cluster's schema catalog.
pub struct SchemaInspector<'a> {
    session: &'a dyn CqlSession,
    catalog: SchemaCatalog,
}

impl<'a> SchemaInspector<'a> {
    /// Asks the server for its version to pick the catalog table.
    pub async fn detect(session: &'a dyn CqlSession) -> Result<SchemaInspector<'a>, KeyspaceError> {
        let release_version = session.release_version().await?;
        let catalog = SchemaCatalog::from_release_version(&release_version)?;
        debug!("Server {} uses the {:?} schema catalog", release_version, catalog);
        Ok(Self { session, catalog })
    }

    pub fn catalog(&self) -> SchemaCatalog {
        self.catalog
    }

    /// Case-sensitive membership test against the live catalog.
    pub async fn keyspace_exists(&self, keyspace: &str) -> Result<bool, KeyspaceError> {
        let names = self.session.keyspace_names(self.catalog).await?;
        Ok(names.iter().any(|name| name == keyspace))
    }

    /// Fetches the exported definition of an existing keyspace and parses it.
    pub async fn live_config(&self, keyspace: &str) -> Result<LiveKeyspaceConfig, KeyspaceError> {
        let definition = self
            .session
            .keyspace_definition(self.catalog, keyspace)
            .await?
            .ok_or_else(|| {
                KeyspaceError::DatabaseError(format!("Keyspace {} disappeared while being inspected", keyspace))
            })?;

        let fragment = definition.export_as_cql();
        debug!("Live definition: {}", fragment);
        LiveKeyspaceConfig::parse(&fragment)
    }
}
