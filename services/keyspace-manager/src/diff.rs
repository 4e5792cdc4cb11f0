use std::fmt;
use tracing::debug;

use svckit::errors::KeyspaceError;
use svckit::types::ReplicationClass;

use crate::replication::LiveKeyspaceConfig;
use crate::spec::DesiredKeyspaceSpec;

/// Differences between the live keyspace and its declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyspaceDiff {
    /// (live, desired)
    pub durable_writes: Option<(bool, bool)>,
    /// (live, desired), SimpleStrategy only
    pub replication_factor: Option<(Option<u32>, u32)>,
    pub added_data_centres: Vec<String>,
    pub removed_data_centres: Vec<String>,
    /// (name, live, desired)
    pub modified_data_centres: Vec<(String, u32, u32)>,
}

impl KeyspaceDiff {
    pub fn is_changed(&self) -> bool {
        self.durable_writes.is_some()
            || self.replication_factor.is_some()
            || !self.added_data_centres.is_empty()
            || !self.removed_data_centres.is_empty()
            || !self.modified_data_centres.is_empty()
    }
}

impl fmt::Display for KeyspaceDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_changed() {
            return f.write_str("no changes");
        }

        let mut parts = Vec::new();
        if let Some((live, desired)) = self.durable_writes {
            parts.push(format!("durable_writes {} -> {}", live, desired));
        }
        if let Some((live, desired)) = self.replication_factor {
            let live = live.map(|rf| rf.to_string()).unwrap_or_else(|| "unset".to_string());
            parts.push(format!("replication_factor {} -> {}", live, desired));
        }
        for dc in &self.added_data_centres {
            parts.push(format!("+{}", dc));
        }
        for dc in &self.removed_data_centres {
            parts.push(format!("-{}", dc));
        }
        for (dc, live, desired) in &self.modified_data_centres {
            parts.push(format!("{} {} -> {}", dc, live, desired));
        }
        f.write_str(&parts.join(", "))
    }
}

/// Compares a live keyspace against its declaration.
///
/// Fails on replication classes other than SimpleStrategy and
/// NetworkTopologyStrategy, and when the declaration implies the other class:
/// migrating between strategies is not supported.
pub fn diff_keyspace(
    live: &LiveKeyspaceConfig,
    desired: &DesiredKeyspaceSpec,
) -> Result<KeyspaceDiff, KeyspaceError> {
    let live_class = live
        .replication_class()
        .ok_or_else(|| KeyspaceError::UnknownStrategy(live.class.clone()))?;

    let target_class = desired.target_class();
    if live_class != target_class {
        return Err(KeyspaceError::StrategyMismatch {
            live: live_class.to_string(),
            desired: target_class.to_string(),
        });
    }

    let mut diff = KeyspaceDiff::default();

    if live.durable_writes != desired.durable_writes {
        diff.durable_writes = Some((live.durable_writes, desired.durable_writes));
    }

    match live_class {
        ReplicationClass::SimpleStrategy => {
            if live.replication_factor != Some(desired.replication_factor) {
                diff.replication_factor = Some((live.replication_factor, desired.replication_factor));
            }
        }
        ReplicationClass::NetworkTopologyStrategy => {
            for (dc, &wanted) in &desired.data_centres {
                match live.data_centres.get(dc) {
                    None => diff.added_data_centres.push(dc.clone()),
                    Some(&current) if current != wanted => {
                        diff.modified_data_centres.push((dc.clone(), current, wanted))
                    }
                    Some(_) => {}
                }
            }
            for dc in live.data_centres.keys() {
                if !desired.data_centres.contains_key(dc) {
                    diff.removed_data_centres.push(dc.clone());
                }
            }
        }
    }

    debug!("Keyspace {} diff: {}", desired.name, diff);
    Ok(diff)
}

/// Whether applying the declaration would change the keyspace.
pub fn keyspace_is_changed(
    live: &LiveKeyspaceConfig,
    desired: &DesiredKeyspaceSpec,
) -> Result<bool, KeyspaceError> {
    Ok(diff_keyspace(live, desired)?.is_changed())
}
