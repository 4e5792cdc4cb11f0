use crate::types::ConsistencyLevel;

/// Level used for any operation the requested level cannot serve.
pub const CLUSTER_DEFAULT_CONSISTENCY: ConsistencyLevel = ConsistencyLevel::LocalOne;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelUse {
    AsRequested,
    ClusterDefault,
}

/// How each requested level is applied to the (read, write) session pair.
///
/// ANY and EACH_QUORUM are write-only levels; SERIAL and LOCAL_SERIAL only
/// apply to reads of lightweight-transaction state.
pub const CONSISTENCY_FALLBACKS: [(ConsistencyLevel, LevelUse, LevelUse); 11] = [
    (ConsistencyLevel::Any, LevelUse::ClusterDefault, LevelUse::AsRequested),
    (ConsistencyLevel::One, LevelUse::AsRequested, LevelUse::AsRequested),
    (ConsistencyLevel::Two, LevelUse::AsRequested, LevelUse::AsRequested),
    (ConsistencyLevel::Three, LevelUse::AsRequested, LevelUse::AsRequested),
    (ConsistencyLevel::Quorum, LevelUse::AsRequested, LevelUse::AsRequested),
    (ConsistencyLevel::All, LevelUse::AsRequested, LevelUse::AsRequested),
    (ConsistencyLevel::LocalQuorum, LevelUse::AsRequested, LevelUse::AsRequested),
    (ConsistencyLevel::EachQuorum, LevelUse::ClusterDefault, LevelUse::AsRequested),
    (ConsistencyLevel::Serial, LevelUse::AsRequested, LevelUse::ClusterDefault),
    (ConsistencyLevel::LocalSerial, LevelUse::AsRequested, LevelUse::ClusterDefault),
    (ConsistencyLevel::LocalOne, LevelUse::AsRequested, LevelUse::AsRequested),
];

fn level_use(requested: ConsistencyLevel, role: SessionRole) -> LevelUse {
    CONSISTENCY_FALLBACKS
        .iter()
        .find(|(level, _, _)| *level == requested)
        .map(|(_, read, write)| match role {
            SessionRole::Read => *read,
            SessionRole::Write => *write,
        })
        .unwrap_or(LevelUse::ClusterDefault)
}

/// Named connection profile: which session it is and the level it runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub role: SessionRole,
    pub consistency: ConsistencyLevel,
}

impl ConnectionProfile {
    pub fn for_role(requested: ConsistencyLevel, role: SessionRole) -> Self {
        let consistency = match level_use(requested, role) {
            LevelUse::AsRequested => requested,
            LevelUse::ClusterDefault => CLUSTER_DEFAULT_CONSISTENCY,
        };
        Self { role, consistency }
    }

    pub fn name(&self) -> &'static str {
        match self.role {
            SessionRole::Read => "read",
            SessionRole::Write => "write",
        }
    }
}

/// The (read, write) profile pair for a requested level.
pub fn profiles_for(requested: ConsistencyLevel) -> (ConnectionProfile, ConnectionProfile) {
    (
        ConnectionProfile::for_role(requested, SessionRole::Read),
        ConnectionProfile::for_role(requested, SessionRole::Write),
    )
}
