pub mod profile;
pub mod query_builder;
pub mod schema;
pub mod scylla;
pub mod session;

pub use profile::{profiles_for, ConnectionProfile, SessionRole, CLUSTER_DEFAULT_CONSISTENCY};
pub use query_builder::QueryBuilder;
pub use schema::{KeyspaceDefinition, SchemaCatalog};
pub use self::scylla::{ScyllaConnection, ScyllaConnector};
pub use session::{ClusterConnector, CqlSession};
