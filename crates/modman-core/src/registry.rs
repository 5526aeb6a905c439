//! Registry of admitted modules (identity -> execution handle).
//!
//! Not thread-safe: the lifecycle owns it and serialises every access.
//! Entries are never removed while the registry lives; dropping the
//! registry drops all handles and detaches their workers.

use std::collections::HashMap;
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;

use crate::domain::{HandleId, ModuleIdentity, WorkerState};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("module {0} is already admitted")]
    AlreadyAdmitted(ModuleIdentity),
}

/// Record binding one admitted module to its worker thread.
///
/// The module itself is owned by the worker; the handle keeps the join
/// handle and a view of the worker's state.
#[derive(Debug)]
pub struct ExecutionHandle {
    handle_id: HandleId,
    identity: ModuleIdentity,
    admitted_at: DateTime<Utc>,
    worker: JoinHandle<()>,
    state: watch::Receiver<WorkerState>,
}

impl ExecutionHandle {
    pub(crate) fn new(
        handle_id: HandleId,
        identity: ModuleIdentity,
        worker: JoinHandle<()>,
        state: watch::Receiver<WorkerState>,
    ) -> Self {
        Self {
            handle_id,
            identity,
            admitted_at: Utc::now(),
            worker,
            state,
        }
    }

    pub fn handle_id(&self) -> HandleId {
        self.handle_id
    }

    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    pub fn admitted_at(&self) -> DateTime<Utc> {
        self.admitted_at
    }

    /// Latest state published by the worker.
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Whether the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.worker.thread().name()
    }
}

#[derive(Debug, Default)]
pub struct ModuleRegistry {
    handles: HashMap<ModuleIdentity, ExecutionHandle>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    pub fn contains(&self, identity: &ModuleIdentity) -> bool {
        self.handles.contains_key(identity)
    }

    /// Admits a handle. Inserting an identity twice is a caller bug and is
    /// reported instead of overwriting the running entry.
    pub fn insert(
        &mut self,
        identity: ModuleIdentity,
        handle: ExecutionHandle,
    ) -> Result<(), RegistryError> {
        if self.handles.contains_key(&identity) {
            return Err(RegistryError::AlreadyAdmitted(identity));
        }
        self.handles.insert(identity, handle);
        Ok(())
    }

    pub fn get(&self, identity: &ModuleIdentity) -> Option<&ExecutionHandle> {
        self.handles.get(identity)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Admitted identities, sorted.
    pub fn identities(&self) -> Vec<ModuleIdentity> {
        let mut identities: Vec<ModuleIdentity> = self.handles.keys().cloned().collect();
        identities.sort();
        identities
    }

    pub fn handles(&self) -> impl Iterator<Item = &ExecutionHandle> {
        self.handles.values()
    }
}
