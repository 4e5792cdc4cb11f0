use std::collections::BTreeMap;

use super::schema::{quote_identifier, quote_literal, SchemaCatalog};

pub struct QueryBuilder;

impl QueryBuilder {
    pub const RELEASE_VERSION: &'static str =
        "SELECT release_version FROM system.local WHERE key='local'";

    /// Lists all keyspace names in the given catalog
    pub fn build_list_keyspaces(catalog: SchemaCatalog) -> &'static str {
        match catalog {
            SchemaCatalog::Modern => "SELECT keyspace_name FROM system_schema.keyspaces",
            SchemaCatalog::Legacy => "SELECT keyspace_name FROM system.schema_keyspaces",
        }
    }

    /// Selects one keyspace row, bound on `keyspace_name`
    pub fn build_select_keyspace(catalog: SchemaCatalog) -> &'static str {
        match catalog {
            SchemaCatalog::Modern => {
                "SELECT replication, durable_writes FROM system_schema.keyspaces WHERE keyspace_name = ?"
            }
            SchemaCatalog::Legacy => {
                "SELECT strategy_class, strategy_options, durable_writes \
                 FROM system.schema_keyspaces WHERE keyspace_name = ?"
            }
        }
    }

    /// Build a CREATE or ALTER KEYSPACE statement.
    ///
    /// A non-empty `data_centres` map selects NetworkTopologyStrategy and
    /// `replication_factor` is ignored; datacentres are emitted in name order.
    pub fn build_create_alter_keyspace(
        keyspace: &str,
        replication_factor: u32,
        durable_writes: bool,
        data_centres: &BTreeMap<String, u32>,
        is_alter: bool,
    ) -> String {
        let verb = if is_alter { "ALTER" } else { "CREATE" };

        let replication = if data_centres.is_empty() {
            format!(
                "{{ 'class' : 'SimpleStrategy', 'replication_factor': {} }}",
                replication_factor
            )
        } else {
            let dcs: Vec<String> = data_centres
                .iter()
                .map(|(dc, factor)| format!("{} : {}", quote_literal(dc), factor))
                .collect();
            format!("{{ 'class' : 'NetworkTopologyStrategy', {} }}", dcs.join(", "))
        };

        format!(
            "{} KEYSPACE {} WITH REPLICATION = {} AND DURABLE_WRITES = {}",
            verb,
            quote_identifier(keyspace),
            replication,
            durable_writes
        )
    }

    /// Build a DROP KEYSPACE statement
    pub fn build_drop_keyspace(keyspace: &str) -> String {
        format!("DROP KEYSPACE {}", quote_identifier(keyspace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_create_simple_strategy() {
        let query = QueryBuilder::build_create_alter_keyspace("mykeyspace", 3, true, &BTreeMap::new(), false);
        assert_eq!(
            query,
            "CREATE KEYSPACE mykeyspace WITH REPLICATION = { 'class' : 'SimpleStrategy', \
             'replication_factor': 3 } AND DURABLE_WRITES = true"
        );
    }

    #[test]
    fn test_build_alter_network_topology() {
        let mut dcs = BTreeMap::new();
        dcs.insert("zurich".to_string(), 3);
        dcs.insert("new_york".to_string(), 2);
        dcs.insert("tokyo".to_string(), 1);

        let query = QueryBuilder::build_create_alter_keyspace("multidc_keyspace", 1, false, &dcs, true);
        assert_eq!(
            query,
            "ALTER KEYSPACE multidc_keyspace WITH REPLICATION = { 'class' : 'NetworkTopologyStrategy', \
             'new_york' : 2, 'tokyo' : 1, 'zurich' : 3 } AND DURABLE_WRITES = false"
        );
    }

    #[test]
    fn test_network_topology_has_one_pair_per_dc() {
        let mut dcs = BTreeMap::new();
        dcs.insert("london".to_string(), 3);
        dcs.insert("paris".to_string(), 3);

        let query = QueryBuilder::build_create_alter_keyspace("ks", 5, true, &dcs, false);
        assert_eq!(query.matches(" : ").count(), 3); // class + two datacentres
        assert!(query.contains("'london' : 3"));
        assert!(query.contains("'paris' : 3"));
        assert!(!query.contains("replication_factor"));
    }

    #[test]
    fn test_datacentre_names_are_escaped() {
        let mut dcs = BTreeMap::new();
        dcs.insert("o'hare".to_string(), 1);
        let query = QueryBuilder::build_create_alter_keyspace("ks", 1, true, &dcs, false);
        assert!(query.contains("'o''hare' : 1"));
    }

    #[test]
    fn test_build_drop_keyspace() {
        assert_eq!(QueryBuilder::build_drop_keyspace("old_ks"), "DROP KEYSPACE old_ks");
    }

    #[test]
    fn test_mixed_case_names_are_quoted() {
        assert_eq!(QueryBuilder::build_drop_keyspace("MyKeyspace"), "DROP KEYSPACE \"MyKeyspace\"");
        let query = QueryBuilder::build_create_alter_keyspace("MyKeyspace", 1, true, &BTreeMap::new(), false);
        assert!(query.starts_with("CREATE KEYSPACE \"MyKeyspace\" WITH REPLICATION"));
    }

    #[test]
    fn test_catalog_queries() {
        assert!(QueryBuilder::build_list_keyspaces(SchemaCatalog::Modern).contains("system_schema.keyspaces"));
        assert!(QueryBuilder::build_list_keyspaces(SchemaCatalog::Legacy).contains("system.schema_keyspaces"));
        assert!(QueryBuilder::build_select_keyspace(SchemaCatalog::Legacy).contains("strategy_options"));
    }
}
