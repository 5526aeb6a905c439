//! Domain model: module identities, handle ids and worker states.

pub mod identity;
pub mod state;

pub use identity::{HandleId, ModuleIdentity};
pub use state::WorkerState;
