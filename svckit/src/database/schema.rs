use std::collections::BTreeMap;

use crate::errors::KeyspaceError;
use crate::types::ReplicationClass;

/// Which system table holds keyspace metadata on the connected server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaCatalog {
    /// `system_schema.keyspaces`, Cassandra 3.0 and later (and ScyllaDB).
    Modern,
    /// `system.schema_keyspaces`, Cassandra 2.x.
    Legacy,
}

impl SchemaCatalog {
    pub fn from_release_version(release_version: &str) -> Result<Self, KeyspaceError> {
        let major = release_version
            .trim()
            .split('.')
            .next()
            .and_then(|m| m.parse::<u32>().ok())
            .ok_or_else(|| {
                KeyspaceError::DatabaseError(format!(
                    "Unable to determine server version from release_version '{}'",
                    release_version
                ))
            })?;

        Ok(if major >= 3 { SchemaCatalog::Modern } else { SchemaCatalog::Legacy })
    }
}

/// A keyspace row as read from the schema catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyspaceDefinition {
    pub name: String,
    pub replication: BTreeMap<String, String>,
    pub durable_writes: Option<bool>,
}

impl KeyspaceDefinition {
    /// Builds a definition from a 2.x row, where options are a JSON object.
    pub fn from_legacy(
        name: &str,
        strategy_class: &str,
        strategy_options: &str,
        durable_writes: Option<bool>,
    ) -> Result<Self, KeyspaceError> {
        let options: BTreeMap<String, serde_json::Value> = if strategy_options.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(strategy_options).map_err(|e| {
                KeyspaceError::ParseError(format!(
                    "Invalid strategy_options for keyspace {}: {}",
                    name, e
                ))
            })?
        };

        let mut replication = BTreeMap::new();
        replication.insert(
            "class".to_string(),
            ReplicationClass::short_name(strategy_class).to_string(),
        );
        for (key, value) in options {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            replication.insert(key, value);
        }

        Ok(Self {
            name: name.to_string(),
            replication,
            durable_writes,
        })
    }

    /// Renders the keyspace the way the driver exports schema:
    /// `CREATE KEYSPACE ks WITH replication = {'class': '…', …} AND durable_writes = true;`
    pub fn export_as_cql(&self) -> String {
        let mut entries = Vec::with_capacity(self.replication.len());
        if let Some(class) = self.replication.get("class") {
            entries.push(format!("'class': {}", quote_literal(ReplicationClass::short_name(class))));
        }
        for (key, value) in self.replication.iter().filter(|(k, _)| k.as_str() != "class") {
            entries.push(format!("{}: {}", quote_literal(key), quote_literal(value)));
        }

        let mut cql = format!(
            "CREATE KEYSPACE {} WITH replication = {{{}}}",
            quote_identifier(&self.name),
            entries.join(", ")
        );
        if let Some(durable_writes) = self.durable_writes {
            cql.push_str(&format!(" AND durable_writes = {}", durable_writes));
        }
        cql.push(';');
        cql
    }
}

/// Single-quotes a CQL string literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Renders a keyspace name so the server stores it exactly as given.
///
/// Unquoted identifiers are folded to lower case, so anything other than a
/// lower-case name starting with a letter is double-quoted.
pub fn quote_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_from_release_version() {
        assert_eq!(SchemaCatalog::from_release_version("4.1.3").unwrap(), SchemaCatalog::Modern);
        assert_eq!(SchemaCatalog::from_release_version("3.0.8").unwrap(), SchemaCatalog::Modern);
        assert_eq!(SchemaCatalog::from_release_version("2.2.19").unwrap(), SchemaCatalog::Legacy);
        assert_eq!(SchemaCatalog::from_release_version("10.0.1").unwrap(), SchemaCatalog::Modern);
        assert!(SchemaCatalog::from_release_version("unknown").is_err());
    }

    #[test]
    fn test_export_simple_strategy() {
        let mut replication = BTreeMap::new();
        replication.insert("class".to_string(), "org.apache.cassandra.locator.SimpleStrategy".to_string());
        replication.insert("replication_factor".to_string(), "3".to_string());
        let definition = KeyspaceDefinition {
            name: "orders".to_string(),
            replication,
            durable_writes: Some(false),
        };

        assert_eq!(
            definition.export_as_cql(),
            "CREATE KEYSPACE orders WITH replication = {'class': 'SimpleStrategy', \
             'replication_factor': '3'} AND durable_writes = false;"
        );
    }

    #[test]
    fn test_export_without_durable_writes() {
        let mut replication = BTreeMap::new();
        replication.insert("class".to_string(), "NetworkTopologyStrategy".to_string());
        replication.insert("paris".to_string(), "3".to_string());
        replication.insert("london".to_string(), "2".to_string());
        let definition = KeyspaceDefinition {
            name: "multidc".to_string(),
            replication,
            durable_writes: None,
        };

        assert_eq!(
            definition.export_as_cql(),
            "CREATE KEYSPACE multidc WITH replication = {'class': 'NetworkTopologyStrategy', \
             'london': '2', 'paris': '3'};"
        );
    }

    #[test]
    fn test_from_legacy_row() {
        let definition = KeyspaceDefinition::from_legacy(
            "legacy_ks",
            "org.apache.cassandra.locator.NetworkTopologyStrategy",
            r#"{"dc1":"3","dc2":1}"#,
            Some(true),
        )
        .unwrap();

        assert_eq!(definition.replication.get("class").unwrap(), "NetworkTopologyStrategy");
        assert_eq!(definition.replication.get("dc1").unwrap(), "3");
        assert_eq!(definition.replication.get("dc2").unwrap(), "1");
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("mykeyspace"), "mykeyspace");
        assert_eq!(quote_identifier("ks_2"), "ks_2");
        assert_eq!(quote_identifier("MyKeyspace"), "\"MyKeyspace\"");
        assert_eq!(quote_identifier("2020_events"), "\"2020_events\"");
        assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn test_from_legacy_rejects_bad_json() {
        let result = KeyspaceDefinition::from_legacy("ks", "SimpleStrategy", "{not json", None);
        assert!(matches!(result, Err(KeyspaceError::ParseError(_))));
    }
}
