use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::KeyspaceError;

/// CQL consistency levels accepted for the read and write sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    #[default]
    LocalOne,
}

impl ConsistencyLevel {
    pub const ALL_LEVELS: [ConsistencyLevel; 11] = [
        ConsistencyLevel::Any,
        ConsistencyLevel::One,
        ConsistencyLevel::Two,
        ConsistencyLevel::Three,
        ConsistencyLevel::Quorum,
        ConsistencyLevel::All,
        ConsistencyLevel::LocalQuorum,
        ConsistencyLevel::EachQuorum,
        ConsistencyLevel::Serial,
        ConsistencyLevel::LocalSerial,
        ConsistencyLevel::LocalOne,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsistencyLevel::Any => "ANY",
            ConsistencyLevel::One => "ONE",
            ConsistencyLevel::Two => "TWO",
            ConsistencyLevel::Three => "THREE",
            ConsistencyLevel::Quorum => "QUORUM",
            ConsistencyLevel::All => "ALL",
            ConsistencyLevel::LocalQuorum => "LOCAL_QUORUM",
            ConsistencyLevel::EachQuorum => "EACH_QUORUM",
            ConsistencyLevel::Serial => "SERIAL",
            ConsistencyLevel::LocalSerial => "LOCAL_SERIAL",
            ConsistencyLevel::LocalOne => "LOCAL_ONE",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsistencyLevel {
    type Err = KeyspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Self::ALL_LEVELS
            .iter()
            .copied()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| KeyspaceError::ConfigError(format!("Unknown consistency level: {}", s)))
    }
}

impl From<ConsistencyLevel> for scylla::statement::Consistency {
    fn from(level: ConsistencyLevel) -> Self {
        use scylla::statement::Consistency;

        match level {
            ConsistencyLevel::Any => Consistency::Any,
            ConsistencyLevel::One => Consistency::One,
            ConsistencyLevel::Two => Consistency::Two,
            ConsistencyLevel::Three => Consistency::Three,
            ConsistencyLevel::Quorum => Consistency::Quorum,
            ConsistencyLevel::All => Consistency::All,
            ConsistencyLevel::LocalQuorum => Consistency::LocalQuorum,
            ConsistencyLevel::EachQuorum => Consistency::EachQuorum,
            ConsistencyLevel::Serial => Consistency::Serial,
            ConsistencyLevel::LocalSerial => Consistency::LocalSerial,
            ConsistencyLevel::LocalOne => Consistency::LocalOne,
        }
    }
}

/// Desired presence of a keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyspaceState {
    Present,
    Absent,
}

impl FromStr for KeyspaceState {
    type Err = KeyspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "present" => Ok(KeyspaceState::Present),
            "absent" => Ok(KeyspaceState::Absent),
            other => Err(KeyspaceError::ConfigError(format!(
                "state must be one of present, absent (got {})",
                other
            ))),
        }
    }
}

const CASSANDRA_LOCATOR_PREFIX: &str = "org.apache.cassandra.locator.";

/// Replication strategies the reconciler knows how to manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicationClass {
    SimpleStrategy,
    NetworkTopologyStrategy,
}

impl ReplicationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicationClass::SimpleStrategy => "SimpleStrategy",
            ReplicationClass::NetworkTopologyStrategy => "NetworkTopologyStrategy",
        }
    }

    /// Strips the `org.apache.cassandra.locator.` prefix some catalogs store.
    pub fn short_name(class: &str) -> &str {
        class.strip_prefix(CASSANDRA_LOCATOR_PREFIX).unwrap_or(class)
    }

    pub fn from_class_name(class: &str) -> Option<Self> {
        match Self::short_name(class.trim()) {
            "SimpleStrategy" => Some(ReplicationClass::SimpleStrategy),
            "NetworkTopologyStrategy" => Some(ReplicationClass::NetworkTopologyStrategy),
            _ => None,
        }
    }
}

impl fmt::Display for ReplicationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TLS peer verification mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertReqs {
    #[default]
    CertNone,
    CertOptional,
    CertRequired,
}

impl CertReqs {
    pub fn requires_ca_bundle(&self) -> bool {
        matches!(self, CertReqs::CertOptional | CertReqs::CertRequired)
    }
}

impl FromStr for CertReqs {
    type Err = KeyspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CERT_NONE" => Ok(CertReqs::CertNone),
            "CERT_OPTIONAL" => Ok(CertReqs::CertOptional),
            "CERT_REQUIRED" => Ok(CertReqs::CertRequired),
            other => Err(KeyspaceError::ConfigError(format!(
                "ssl_cert_reqs must be one of CERT_NONE, CERT_OPTIONAL, CERT_REQUIRED (got {})",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistency_level_from_str() {
        assert_eq!("LOCAL_ONE".parse::<ConsistencyLevel>().unwrap(), ConsistencyLevel::LocalOne);
        assert_eq!("each_quorum".parse::<ConsistencyLevel>().unwrap(), ConsistencyLevel::EachQuorum);
        assert!("FIVE".parse::<ConsistencyLevel>().is_err());
    }

    #[test]
    fn test_consistency_level_serde_names() {
        let json = serde_json::to_string(&ConsistencyLevel::LocalSerial).unwrap();
        assert_eq!(json, "\"LOCAL_SERIAL\"");
        let level: ConsistencyLevel = serde_json::from_str("\"EACH_QUORUM\"").unwrap();
        assert_eq!(level, ConsistencyLevel::EachQuorum);
    }

    #[test]
    fn test_every_level_round_trips_through_display() {
        for level in ConsistencyLevel::ALL_LEVELS {
            assert_eq!(level.to_string().parse::<ConsistencyLevel>().unwrap(), level);
        }
    }

    #[test]
    fn test_replication_class_normalises_qualified_names() {
        assert_eq!(
            ReplicationClass::from_class_name("org.apache.cassandra.locator.SimpleStrategy"),
            Some(ReplicationClass::SimpleStrategy)
        );
        assert_eq!(
            ReplicationClass::from_class_name("NetworkTopologyStrategy"),
            Some(ReplicationClass::NetworkTopologyStrategy)
        );
        assert_eq!(ReplicationClass::from_class_name("LocalStrategy"), None);
    }

    #[test]
    fn test_cert_reqs() {
        assert_eq!("cert_required".parse::<CertReqs>().unwrap(), CertReqs::CertRequired);
        assert!(CertReqs::CertOptional.requires_ca_bundle());
        assert!(!CertReqs::CertNone.requires_ca_bundle());
        assert!("CERT_MAYBE".parse::<CertReqs>().is_err());
    }
}
