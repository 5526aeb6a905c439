use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{HandleId, ModuleIdentity, WorkerState};
use crate::registry::ModuleRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleStatus {
    pub identity: ModuleIdentity,
    pub handle_id: HandleId,
    pub state: WorkerState,
    pub admitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub admitted: usize,
    pub running: usize,
    pub finished: usize,
    pub failed: usize,
    pub panicked: usize,
}

impl StateCounts {
    fn record(&mut self, state: WorkerState) {
        match state {
            WorkerState::Admitted => self.admitted += 1,
            WorkerState::Running => self.running += 1,
            WorkerState::Finished => self.finished += 1,
            WorkerState::Failed => self.failed += 1,
            WorkerState::Panicked => self.panicked += 1,
        }
    }
}

/// Point-in-time view of every admitted module, sorted by identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleStatus {
    pub modules: Vec<ModuleStatus>,
    pub counts: StateCounts,
}

impl LifecycleStatus {
    pub(crate) fn collect(registry: &ModuleRegistry) -> Self {
        let mut status = LifecycleStatus::default();
        for handle in registry.handles() {
            let state = handle.state();
            status.counts.record(state);
            status.modules.push(ModuleStatus {
                identity: handle.identity().clone(),
                handle_id: handle.handle_id(),
                state,
                admitted_at: handle.admitted_at(),
            });
        }
        status.modules.sort_by(|a, b| a.identity.cmp(&b.identity));
        status
    }

    pub fn get(&self, identity: &ModuleIdentity) -> Option<&ModuleStatus> {
        self.modules.iter().find(|m| &m.identity == identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_state() {
        let mut counts = StateCounts::default();
        counts.record(WorkerState::Running);
        counts.record(WorkerState::Running);
        counts.record(WorkerState::Panicked);
        assert_eq!(counts.running, 2);
        assert_eq!(counts.panicked, 1);
        assert_eq!(counts.finished, 0);
    }

    #[test]
    fn empty_registry_gives_empty_status() {
        let status = LifecycleStatus::collect(&ModuleRegistry::new());
        assert!(status.modules.is_empty());
        assert_eq!(status.counts, StateCounts::default());

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["modules"], serde_json::json!([]));
        assert_eq!(json["counts"]["running"], 0);
    }
}
