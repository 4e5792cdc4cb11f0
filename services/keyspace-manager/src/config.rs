use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use svckit::config::{ConnectionConfig, ObservabilityConfig};
use svckit::errors::KeyspaceError;
use svckit::types::KeyspaceState;

use crate::spec::DesiredKeyspaceSpec;

pub const ENV_PREFIX: &str = "KEYSPACE_MANAGER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyspaceManagerConfig {
    pub connection: ConnectionConfig,
    pub keyspace: KeyspaceConfig,
    pub check_mode: bool,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyspaceConfig {
    pub name: String,
    pub state: Option<KeyspaceState>,
    pub replication_factor: u32,
    pub durable_writes: bool,
    #[serde(alias = "data_centers")]
    pub data_centres: Option<BTreeMap<String, u32>>,
}

impl Default for KeyspaceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            state: None,
            replication_factor: 1,
            durable_writes: true,
            data_centres: None,
        }
    }
}

impl KeyspaceConfig {
    pub fn to_spec(&self) -> Result<DesiredKeyspaceSpec, KeyspaceError> {
        let state = self
            .state
            .ok_or_else(|| KeyspaceError::ConfigError("state is required (present or absent)".to_string()))?;

        let spec = DesiredKeyspaceSpec {
            name: self.name.clone(),
            state,
            replication_factor: self.replication_factor,
            durable_writes: self.durable_writes,
            data_centres: self.data_centres.clone().unwrap_or_default(),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// Loads configuration from an optional file, then `KEYSPACE_MANAGER__*`
/// environment variables (e.g. `KEYSPACE_MANAGER__CONNECTION__LOGIN_PORT`).
pub fn load_config(path: Option<&str>) -> Result<KeyspaceManagerConfig> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("connection.login_host")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use svckit::types::{CertReqs, ConsistencyLevel};

    const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/keyspace-manager.yaml");

    #[test]
    fn test_load_sample_config() {
        let config = load_config(Some(SAMPLE)).unwrap();

        assert_eq!(config.connection.login_host, Some(vec!["cassandra-1".to_string(), "cassandra-2".to_string()]));
        assert_eq!(config.connection.login_port, 9042);
        assert_eq!(config.connection.consistency_level, ConsistencyLevel::LocalQuorum);
        assert_eq!(config.connection.ssl_cert_reqs, CertReqs::CertNone);
        assert_eq!(config.keyspace.name, "multidc_keyspace");
        assert_eq!(config.keyspace.state, Some(KeyspaceState::Present));
        assert!(!config.check_mode);

        let spec = config.keyspace.to_spec().unwrap();
        assert_eq!(spec.data_centres.get("london"), Some(&3));
        assert_eq!(spec.data_centres.get("tokyo"), Some(&1));
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = KeyspaceManagerConfig::default();
        assert_eq!(config.keyspace.replication_factor, 1);
        assert!(config.keyspace.durable_writes);
        assert_eq!(config.connection.login_port, 9042);
    }

    #[test]
    fn test_data_centers_alias() {
        let keyspace: KeyspaceConfig = serde_json::from_str(
            r#"{"name": "ks", "state": "present", "data_centers": {"dc1": 2}}"#,
        )
        .unwrap();
        assert_eq!(keyspace.data_centres.unwrap().get("dc1"), Some(&2));
    }

    #[test]
    fn test_state_is_required() {
        let keyspace = KeyspaceConfig {
            name: "ks".to_string(),
            ..Default::default()
        };
        assert!(matches!(keyspace.to_spec(), Err(KeyspaceError::ConfigError(_))));
    }

    #[test]
    fn test_empty_data_centres_mean_simple_strategy() {
        let keyspace = KeyspaceConfig {
            name: "ks".to_string(),
            state: Some(KeyspaceState::Present),
            data_centres: Some(BTreeMap::new()),
            ..Default::default()
        };
        let spec = keyspace.to_spec().unwrap();
        assert_eq!(spec.target_class(), svckit::types::ReplicationClass::SimpleStrategy);
    }
}
