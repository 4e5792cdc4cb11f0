use async_trait::async_trait;
use openssl::ssl::{SslContext, SslContextBuilder, SslMethod, SslVerifyMode};
use scylla::serialize::row::SerializeRow;
use scylla::transport::errors::{DbError, NewSessionError};
use scylla::transport::execution_profile::ExecutionProfile;
use scylla::{QueryResult, Session, SessionBuilder};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::ConnectionConfig;
use crate::errors::KeyspaceError;
use crate::types::CertReqs;
use super::profile::ConnectionProfile;
use super::query_builder::QueryBuilder;
use super::schema::{KeyspaceDefinition, SchemaCatalog};
use super::session::{ClusterConnector, CqlSession};

/// Opens ScyllaDB driver sessions (CQL-compatible with Cassandra 2.1+)
pub struct ScyllaConnector {
    contact_points: Vec<String>,
    username: Option<String>,
    password: Option<String>,
    ssl_context: Option<SslContext>,
    connection_timeout: Duration,
    request_timeout: Duration,
}

impl ScyllaConnector {
    /// Validates the configuration and prepares the TLS context up front, so
    /// that a bad TLS setup fails before any network I/O.
    pub fn new(config: &ConnectionConfig, hosts: &[String]) -> Result<Self, KeyspaceError> {
        config.validate()?;

        let ssl_context = if config.ssl {
            Some(build_ssl_context(config)?)
        } else {
            None
        };

        let contact_points = hosts
            .iter()
            .map(|host| format!("{}:{}", host, config.login_port))
            .collect();

        Ok(Self {
            contact_points,
            username: config.login_user.clone(),
            password: config.login_password.clone(),
            ssl_context,
            connection_timeout: config.connection_timeout(),
            request_timeout: config.request_timeout(),
        })
    }

    pub fn contact_points(&self) -> &[String] {
        &self.contact_points
    }
}

#[async_trait]
impl ClusterConnector for ScyllaConnector {
    async fn connect(&self, profile: &ConnectionProfile) -> Result<Box<dyn CqlSession>, KeyspaceError> {
        info!(
            "Opening {} session to {:?} (consistency {})",
            profile.name(),
            self.contact_points,
            profile.consistency
        );

        let execution_profile = ExecutionProfile::builder()
            .consistency(profile.consistency.into())
            .request_timeout(Some(self.request_timeout))
            .build();

        let mut session_builder = SessionBuilder::new()
            .known_nodes(&self.contact_points)
            .connection_timeout(self.connection_timeout)
            .default_execution_profile_handle(execution_profile.into_handle());

        // Credentials only when a user is configured
        if let Some(ref username) = self.username {
            session_builder = session_builder.user(username, self.password.as_deref().unwrap_or_default());
        }

        if let Some(ref ssl_context) = self.ssl_context {
            session_builder = session_builder.ssl_context(Some(ssl_context.clone()));
        }

        let session = session_builder.build().await.map_err(|e| {
            error!("Failed to open {} session: {}", profile.name(), e);
            classify_session_error(&e)
        })?;

        info!("Successfully opened {} session", profile.name());

        Ok(Box::new(ScyllaConnection {
            session,
            profile: *profile,
        }))
    }
}

fn build_ssl_context(config: &ConnectionConfig) -> Result<SslContext, KeyspaceError> {
    let tls_error = |e: openssl::error::ErrorStack| {
        KeyspaceError::ConfigError(format!("Unable to build TLS context: {}", e))
    };

    let mut builder = SslContextBuilder::new(SslMethod::tls()).map_err(tls_error)?;

    match config.ssl_cert_reqs {
        CertReqs::CertNone => builder.set_verify(SslVerifyMode::NONE),
        // A client always fails the handshake on an unverifiable server
        // certificate, so OPTIONAL behaves like REQUIRED.
        CertReqs::CertOptional | CertReqs::CertRequired => {
            builder.set_verify(SslVerifyMode::PEER);
            builder.set_ca_file(&config.ssl_ca_certs).map_err(tls_error)?;
        }
    }

    info!("TLS enabled (verify mode {:?})", config.ssl_cert_reqs);
    Ok(builder.build())
}

/// Credential rejections are reported apart from other connection failures.
fn classify_session_error(err: &NewSessionError) -> KeyspaceError {
    match err {
        NewSessionError::DbError(DbError::AuthenticationError, _) => {
            KeyspaceError::AuthenticationError(err.to_string())
        }
        // Pool setup failures only carry the server's reply as text
        _ => classify_session_message(err.to_string()),
    }
}

fn classify_session_message(message: String) -> KeyspaceError {
    let lower = message.to_lowercase();
    let rejected = lower.contains("authentication error")
        || lower.contains("authentication failed")
        || lower.contains("bad credentials")
        || lower.contains("and/or password are incorrect");
    if rejected {
        KeyspaceError::AuthenticationError(message)
    } else {
        KeyspaceError::ConnectionError(message)
    }
}

/// One open driver session, bound to a connection profile
pub struct ScyllaConnection {
    session: Session,
    profile: ConnectionProfile,
}

impl ScyllaConnection {
    /// Execute a simple query without values
    pub async fn execute_simple(&self, query: &str) -> Result<QueryResult, KeyspaceError> {
        self.session
            .query_unpaged(query, ())
            .await
            .map_err(|e| KeyspaceError::DatabaseError(format!("Query execution failed: {}", e)))
    }

    /// Execute a query with serializable values
    pub async fn execute_with_values<V: SerializeRow>(
        &self,
        query: &str,
        values: V,
    ) -> Result<QueryResult, KeyspaceError> {
        self.session
            .query_unpaged(query, values)
            .await
            .map_err(|e| KeyspaceError::DatabaseError(format!("Query execution failed: {}", e)))
    }
}

fn row_error(e: impl std::fmt::Display) -> KeyspaceError {
    KeyspaceError::DatabaseError(format!("Unexpected result shape: {}", e))
}

#[async_trait]
impl CqlSession for ScyllaConnection {
    async fn release_version(&self) -> Result<String, KeyspaceError> {
        let result = self.execute_simple(QueryBuilder::RELEASE_VERSION).await?;
        let row = result
            .rows_typed::<(Option<String>,)>()
            .map_err(row_error)?
            .next()
            .transpose()
            .map_err(row_error)?;

        match row {
            Some((Some(version),)) => {
                debug!("Server release_version {}", version);
                Ok(version)
            }
            _ => Err(KeyspaceError::DatabaseError(
                "system.local returned no release_version".to_string(),
            )),
        }
    }

    async fn keyspace_names(&self, catalog: SchemaCatalog) -> Result<Vec<String>, KeyspaceError> {
        let query = QueryBuilder::build_list_keyspaces(catalog);
        debug!("Listing keyspaces: {}", query);

        let result = self.execute_simple(query).await?;
        let mut names = Vec::new();
        for row in result.rows_typed::<(String,)>().map_err(row_error)? {
            let (name,) = row.map_err(row_error)?;
            names.push(name);
        }
        Ok(names)
    }

    async fn keyspace_definition(
        &self,
        catalog: SchemaCatalog,
        keyspace: &str,
    ) -> Result<Option<KeyspaceDefinition>, KeyspaceError> {
        let query = QueryBuilder::build_select_keyspace(catalog);
        debug!("Fetching definition of {}: {}", keyspace, query);

        let result = self.execute_with_values(query, (keyspace,)).await?;

        match catalog {
            SchemaCatalog::Modern => {
                let row = result
                    .rows_typed::<(Option<HashMap<String, String>>, Option<bool>)>()
                    .map_err(row_error)?
                    .next()
                    .transpose()
                    .map_err(row_error)?;

                Ok(row.map(|(replication, durable_writes)| KeyspaceDefinition {
                    name: keyspace.to_string(),
                    replication: replication
                        .unwrap_or_default()
                        .into_iter()
                        .collect::<BTreeMap<_, _>>(),
                    durable_writes,
                }))
            }
            SchemaCatalog::Legacy => {
                let row = result
                    .rows_typed::<(Option<String>, Option<String>, Option<bool>)>()
                    .map_err(row_error)?
                    .next()
                    .transpose()
                    .map_err(row_error)?;

                match row {
                    Some((strategy_class, strategy_options, durable_writes)) => {
                        KeyspaceDefinition::from_legacy(
                            keyspace,
                            strategy_class.as_deref().unwrap_or_default(),
                            strategy_options.as_deref().unwrap_or_default(),
                            durable_writes,
                        )
                        .map(Some)
                    }
                    None => Ok(None),
                }
            }
        }
    }

    async fn execute(&self, cql: &str) -> Result<(), KeyspaceError> {
        debug!("Executing on {} session: {}", self.profile.name(), cql);
        self.execute_simple(cql).await?;
        Ok(())
    }
}
