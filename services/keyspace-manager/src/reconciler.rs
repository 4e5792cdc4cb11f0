use serde::Serialize;
use std::time::Instant;
use tracing::{error, info};

use svckit::database::{profiles_for, ClusterConnector, CqlSession};
use svckit::errors::KeyspaceError;
use svckit::types::{ConsistencyLevel, KeyspaceState};

use crate::diff::diff_keyspace;
use crate::inspect::SchemaInspector;
use crate::spec::DesiredKeyspaceSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    NotConnected,
    Connected,
    Reconciled,
    Failed,
}

/// The single statement (if any) that brings the keyspace to its declared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Unchanged,
    Create(String),
    Alter(String),
    Drop(String),
}

impl Plan {
    pub fn statement(&self) -> Option<&str> {
        match self {
            Plan::Unchanged => None,
            Plan::Create(cql) | Plan::Alter(cql) | Plan::Drop(cql) => Some(cql),
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, Plan::Unchanged)
    }
}

/// Outcome of one invocation, reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cql: Option<String>,
    pub keyspace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

impl ReconciliationResult {
    pub fn success(keyspace: &str, changed: bool, cql: Option<String>) -> Self {
        Self {
            changed,
            cql,
            keyspace: keyspace.to_string(),
            msg: None,
            failed: false,
        }
    }

    pub fn failure(keyspace: &str, msg: impl Into<String>) -> Self {
        Self {
            changed: false,
            cql: None,
            keyspace: keyspace.to_string(),
            msg: Some(msg.into()),
            failed: true,
        }
    }

    pub fn from_error(keyspace: &str, err: &KeyspaceError) -> Self {
        Self::failure(keyspace, err.report())
    }
}

/// Read and write sessions for one invocation; closed when dropped.
struct Sessions {
    read: Box<dyn CqlSession>,
    write: Box<dyn CqlSession>,
}

pub struct KeyspaceReconciler<C: ClusterConnector> {
    connector: C,
    consistency_level: ConsistencyLevel,
    check_mode: bool,
    state: ReconcilerState,
}

impl<C: ClusterConnector> KeyspaceReconciler<C> {
    pub fn new(connector: C, consistency_level: ConsistencyLevel, check_mode: bool) -> Self {
        info!(
            "KeyspaceReconciler initialized (consistency {}, check mode {})",
            consistency_level, check_mode
        );
        Self {
            connector,
            consistency_level,
            check_mode,
            state: ReconcilerState::NotConnected,
        }
    }

    pub fn state(&self) -> ReconcilerState {
        self.state
    }

    /// Runs one reconciliation. Any failure ends the run; nothing is retried.
    pub async fn run(&mut self, spec: &DesiredKeyspaceSpec) -> ReconciliationResult {
        let start = Instant::now();
        self.state = ReconcilerState::NotConnected;

        if let Err(e) = spec.validate() {
            return self.fail(spec, e);
        }

        let sessions = match self.connect().await {
            Ok(sessions) => sessions,
            Err(e) => return self.fail(spec, e),
        };
        self.state = ReconcilerState::Connected;

        let result = match self.reconcile(&sessions, spec).await {
            Ok(result) => result,
            Err(e) => return self.fail(spec, e),
        };
        self.state = ReconcilerState::Reconciled;

        info!(
            "Reconciliation of {} completed in {:?} (changed: {})",
            spec.name,
            start.elapsed(),
            result.changed
        );
        result
    }

    async fn connect(&self) -> Result<Sessions, KeyspaceError> {
        let (read_profile, write_profile) = profiles_for(self.consistency_level);
        let read = self.connector.connect(&read_profile).await?;
        let write = self.connector.connect(&write_profile).await?;
        Ok(Sessions { read, write })
    }

    /// Works out which statement, if any, the declaration calls for.
    pub async fn plan(
        &self,
        session: &dyn CqlSession,
        spec: &DesiredKeyspaceSpec,
    ) -> Result<Plan, KeyspaceError> {
        let inspector = SchemaInspector::detect(session).await?;
        let exists = inspector.keyspace_exists(&spec.name).await?;

        let plan = match (exists, spec.state) {
            (false, KeyspaceState::Present) => Plan::Create(spec.create_alter_statement(false)),
            (false, KeyspaceState::Absent) => Plan::Unchanged,
            (true, KeyspaceState::Absent) => Plan::Drop(spec.drop_statement()),
            (true, KeyspaceState::Present) => {
                let live = inspector.live_config(&spec.name).await?;
                let diff = diff_keyspace(&live, spec)?;
                if diff.is_changed() {
                    info!("Keyspace {} differs from declaration: {}", spec.name, diff);
                    Plan::Alter(spec.create_alter_statement(true))
                } else {
                    Plan::Unchanged
                }
            }
        };

        Ok(plan)
    }

    async fn reconcile(
        &self,
        sessions: &Sessions,
        spec: &DesiredKeyspaceSpec,
    ) -> Result<ReconciliationResult, KeyspaceError> {
        let plan = self.plan(sessions.read.as_ref(), spec).await?;

        let statement = match plan.statement() {
            None => {
                info!("Keyspace {} already matches the declaration", spec.name);
                return Ok(ReconciliationResult::success(&spec.name, false, None));
            }
            Some(statement) => statement,
        };

        if self.check_mode {
            info!("Check mode: would execute {}", statement);
            return Ok(ReconciliationResult::success(&spec.name, true, None));
        }

        sessions.write.execute(statement).await?;
        info!("Executed: {}", statement);

        Ok(ReconciliationResult::success(&spec.name, true, Some(statement.to_string())))
    }

    fn fail(&mut self, spec: &DesiredKeyspaceSpec, err: KeyspaceError) -> ReconciliationResult {
        self.state = ReconcilerState::Failed;
        error!("Reconciliation of {} failed: {}", spec.name, err);
        ReconciliationResult::from_error(&spec.name, &err)
    }
}
