use std::{collections::HashMap, sync::Arc};

use crate::{
    error::{ConfigError, duplicate_candidate},
    types::{CandidateId, Task},
};

/// Fire-and-forget dispatch target. `dispatch` must not block, must not
/// return a value, and must not fail on overload: overload is the
/// admission engine's concern, not the destination's.
pub trait SubRoutine: Send + Sync {
    fn id(&self) -> &str;
    fn dispatch(&self, task: &Task);
}

pub type SubRoutineFactory = Arc<dyn Fn() -> Arc<dyn SubRoutine> + Send + Sync>;

/// Inventory entry for one destination. Capabilities are informational
/// only; nothing on the selection path branches on them.
#[derive(Clone)]
pub struct CandidateProfile {
    pub id: CandidateId,
    pub capabilities: Vec<String>,
    factory: SubRoutineFactory,
}

impl CandidateProfile {
    pub fn new(
        id: impl Into<CandidateId>,
        capabilities: Vec<String>,
        factory: SubRoutineFactory,
    ) -> Self {
        Self {
            id: id.into(),
            capabilities,
            factory,
        }
    }

    pub fn instantiate(&self) -> Arc<dyn SubRoutine> {
        (self.factory)()
    }
}

/// Read-only destination inventory, fixed at configuration time. Only
/// `count` is consulted on the hot selection path (narrowing telemetry);
/// `get` and `list` serve configuration and diagnostics.
pub struct CandidateRegistry {
    profiles: HashMap<CandidateId, CandidateProfile>,
    order: Vec<CandidateId>,
}

impl CandidateRegistry {
    pub fn new(profiles: Vec<CandidateProfile>) -> Result<Self, ConfigError> {
        let mut by_id = HashMap::new();
        let mut order = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let id = profile.id.clone();
            if by_id.insert(id.clone(), profile).is_some() {
                return Err(duplicate_candidate(&id));
            }
            order.push(id);
        }
        Ok(Self {
            profiles: by_id,
            order,
        })
    }

    pub fn get(&self, id: &str) -> Option<&CandidateProfile> {
        self.profiles.get(id)
    }

    pub fn list(&self) -> &[CandidateId] {
        &self.order
    }

    pub fn count(&self) -> usize {
        self.order.len()
    }
}
