use serde::{Deserialize, Serialize};

/// Where a module's worker is in its life.
///
/// `Admitted` is the state between registry insertion and the worker
/// picking up its start signal. The last three are terminal; the registry
/// entry stays in place either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerState {
    Admitted,
    Running,
    Finished,
    Failed,
    Panicked,
}

impl WorkerState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkerState::Finished | WorkerState::Failed | WorkerState::Panicked
        )
    }
}
