//! In-memory cluster used by the reconciler tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use svckit::database::{
    ClusterConnector, ConnectionProfile, CqlSession, KeyspaceDefinition, SchemaCatalog, SessionRole,
};
use svckit::errors::KeyspaceError;

use crate::replication::LiveKeyspaceConfig;

#[derive(Debug, Clone, Copy)]
pub enum ConnectFailure {
    Authentication,
    Refused,
}

#[derive(Debug, Default)]
struct ClusterState {
    release_version: String,
    keyspaces: BTreeMap<String, KeyspaceDefinition>,
    executed: Vec<(SessionRole, String)>,
    profiles: Vec<ConnectionProfile>,
    catalogs: Vec<SchemaCatalog>,
    connect_failure: Option<ConnectFailure>,
    reject_ddl: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl MockCluster {
    pub fn new(release_version: &str) -> Self {
        let cluster = Self::default();
        cluster.state.lock().unwrap().release_version = release_version.to_string();
        cluster
    }

    pub fn with_keyspace(self, definition: KeyspaceDefinition) -> Self {
        self.state
            .lock()
            .unwrap()
            .keyspaces
            .insert(definition.name.clone(), definition);
        self
    }

    pub fn failing_with(self, failure: ConnectFailure) -> Self {
        self.state.lock().unwrap().connect_failure = Some(failure);
        self
    }

    pub fn rejecting_ddl(self) -> Self {
        self.state.lock().unwrap().reject_ddl = true;
        self
    }

    pub fn executed(&self) -> Vec<(SessionRole, String)> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn profiles(&self) -> Vec<ConnectionProfile> {
        self.state.lock().unwrap().profiles.clone()
    }

    pub fn catalogs_queried(&self) -> Vec<SchemaCatalog> {
        self.state.lock().unwrap().catalogs.clone()
    }

    pub fn keyspace(&self, name: &str) -> Option<KeyspaceDefinition> {
        self.state.lock().unwrap().keyspaces.get(name).cloned()
    }
}

pub fn simple_definition(name: &str, replication_factor: u32, durable_writes: bool) -> KeyspaceDefinition {
    let mut replication = BTreeMap::new();
    replication.insert("class".to_string(), "org.apache.cassandra.locator.SimpleStrategy".to_string());
    replication.insert("replication_factor".to_string(), replication_factor.to_string());
    KeyspaceDefinition {
        name: name.to_string(),
        replication,
        durable_writes: Some(durable_writes),
    }
}

pub fn topology_definition(name: &str, dcs: &[(&str, u32)], durable_writes: bool) -> KeyspaceDefinition {
    let mut replication = BTreeMap::new();
    replication.insert("class".to_string(), "org.apache.cassandra.locator.NetworkTopologyStrategy".to_string());
    for (dc, rf) in dcs {
        replication.insert(dc.to_string(), rf.to_string());
    }
    KeyspaceDefinition {
        name: name.to_string(),
        replication,
        durable_writes: Some(durable_writes),
    }
}

/// Resolves a keyspace identifier the way the server does: quoted names keep
/// their case, unquoted ones are folded to lower case.
fn stored_name(identifier: &str) -> String {
    match identifier.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
        Some(quoted) => quoted.replace("\"\"", "\""),
        None => identifier.to_lowercase(),
    }
}

fn definition_from_statement(name: &str, cql: &str) -> Result<KeyspaceDefinition, KeyspaceError> {
    let live = LiveKeyspaceConfig::parse(cql)?;
    let mut replication = BTreeMap::new();
    replication.insert("class".to_string(), live.class);
    if let Some(rf) = live.replication_factor {
        replication.insert("replication_factor".to_string(), rf.to_string());
    }
    for (dc, rf) in live.data_centres {
        replication.insert(dc, rf.to_string());
    }
    Ok(KeyspaceDefinition {
        name: name.to_string(),
        replication,
        durable_writes: Some(live.durable_writes),
    })
}

#[async_trait]
impl ClusterConnector for MockCluster {
    async fn connect(&self, profile: &ConnectionProfile) -> Result<Box<dyn CqlSession>, KeyspaceError> {
        let mut state = self.state.lock().unwrap();
        match state.connect_failure {
            Some(ConnectFailure::Authentication) => Err(KeyspaceError::AuthenticationError(
                "Provided username cassandra and/or password are incorrect".to_string(),
            )),
            Some(ConnectFailure::Refused) => Err(KeyspaceError::ConnectionError(
                "Could not connect to any node: Connection refused".to_string(),
            )),
            None => {
                state.profiles.push(*profile);
                Ok(Box::new(MockSession {
                    cluster: self.clone(),
                    role: profile.role,
                }))
            }
        }
    }
}

struct MockSession {
    cluster: MockCluster,
    role: SessionRole,
}

#[async_trait]
impl CqlSession for MockSession {
    async fn release_version(&self) -> Result<String, KeyspaceError> {
        Ok(self.cluster.state.lock().unwrap().release_version.clone())
    }

    async fn keyspace_names(&self, catalog: SchemaCatalog) -> Result<Vec<String>, KeyspaceError> {
        let mut state = self.cluster.state.lock().unwrap();
        state.catalogs.push(catalog);
        Ok(state.keyspaces.keys().cloned().collect())
    }

    async fn keyspace_definition(
        &self,
        catalog: SchemaCatalog,
        keyspace: &str,
    ) -> Result<Option<KeyspaceDefinition>, KeyspaceError> {
        let mut state = self.cluster.state.lock().unwrap();
        state.catalogs.push(catalog);
        Ok(state.keyspaces.get(keyspace).cloned())
    }

    async fn execute(&self, cql: &str) -> Result<(), KeyspaceError> {
        let mut state = self.cluster.state.lock().unwrap();
        if state.reject_ddl {
            return Err(KeyspaceError::DatabaseError("Unauthorized: no CREATE permission".to_string()));
        }

        let words: Vec<&str> = cql.split_whitespace().collect();
        let name = stored_name(words.get(2).copied().unwrap_or_default());
        match words.first().copied() {
            Some("DROP") => {
                if state.keyspaces.remove(&name).is_none() {
                    return Err(KeyspaceError::DatabaseError(format!(
                        "Cannot drop non existing keyspace '{}'",
                        name
                    )));
                }
            }
            Some("CREATE") => {
                if state.keyspaces.contains_key(&name) {
                    return Err(KeyspaceError::DatabaseError(format!("Keyspace {} already exists", name)));
                }
                let definition = definition_from_statement(&name, cql)?;
                state.keyspaces.insert(name, definition);
            }
            Some("ALTER") => {
                let definition = definition_from_statement(&name, cql)?;
                state.keyspaces.insert(name, definition);
            }
            _ => return Err(KeyspaceError::DatabaseError(format!("Unsupported statement: {}", cql))),
        }

        state.executed.push((self.role, cql.to_string()));
        Ok(())
    }
}
