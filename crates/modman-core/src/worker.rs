//! Worker - one dedicated thread per admitted module.
//!
//! The thread is created before admission but parks on a start gate until
//! the lifecycle has inserted its handle, so `run()` never begins for an
//! identity the registry does not hold. Dropping the gate instead of
//! opening it lets the thread exit without touching the module.

use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread;

use tokio::sync::{oneshot, watch};
use tracing::{debug, error};

use crate::config::LifecycleConfig;
use crate::domain::{HandleId, ModuleIdentity, WorkerState};
use crate::error::ModuleError;
use crate::module::Module;
use crate::registry::ExecutionHandle;

/// A spawned worker that has not been allowed to start yet.
pub(crate) struct PendingWorker {
    handle_id: HandleId,
    join: thread::JoinHandle<()>,
    state: watch::Receiver<WorkerState>,
    gate: oneshot::Sender<()>,
}

/// Start signal for a pending worker.
pub(crate) struct StartGate(oneshot::Sender<()>);

impl StartGate {
    pub(crate) fn open(self) {
        // the worker only goes away before this point if its thread died
        let _ = self.0.send(());
    }
}

impl PendingWorker {
    pub(crate) fn into_handle(self, identity: ModuleIdentity) -> (ExecutionHandle, StartGate) {
        let handle = ExecutionHandle::new(self.handle_id, identity, self.join, self.state);
        (handle, StartGate(self.gate))
    }
}

/// Spawns the worker thread for `module`, taking ownership of it.
pub(crate) fn spawn(
    identity: &ModuleIdentity,
    handle_id: HandleId,
    module: Box<dyn Module>,
    config: &LifecycleConfig,
) -> io::Result<PendingWorker> {
    let (gate, gate_rx) = oneshot::channel();
    let (state_tx, state) = watch::channel(WorkerState::Admitted);

    let mut builder = thread::Builder::new().name(config.thread_name(identity));
    if let Some(stack_size) = config.stack_size {
        builder = builder.stack_size(stack_size);
    }

    let worker_identity = identity.clone();
    let join = builder.spawn(move || {
        worker_main(worker_identity, handle_id, module, gate_rx, state_tx);
    })?;

    Ok(PendingWorker {
        handle_id,
        join,
        state,
        gate,
    })
}

fn worker_main(
    identity: ModuleIdentity,
    handle_id: HandleId,
    mut module: Box<dyn Module>,
    gate: oneshot::Receiver<()>,
    state: watch::Sender<WorkerState>,
) {
    if gate.blocking_recv().is_err() {
        debug!(identity = %identity, handle_id = %handle_id, "worker released without admission");
        return;
    }

    state.send_replace(WorkerState::Running);
    debug!(identity = %identity, handle_id = %handle_id, "module run started");

    let final_state = match catch_unwind(AssertUnwindSafe(|| module.run())) {
        Ok(Ok(())) => {
            debug!(identity = %identity, handle_id = %handle_id, "module run returned");
            WorkerState::Finished
        }
        Ok(Err(err)) => {
            report_run_failure(&identity, handle_id, &err);
            WorkerState::Failed
        }
        Err(payload) => {
            report_run_failure(&identity, handle_id, &ModuleError::from_panic(payload));
            WorkerState::Panicked
        }
    };

    state.send_replace(final_state);
}

fn report_run_failure(identity: &ModuleIdentity, handle_id: HandleId, err: &ModuleError) {
    error!(identity = %identity, handle_id = %handle_id, "Uncaught exception in module.run(). Aborting.");
    error!(identity = %identity, handle_id = %handle_id, "{err}");
}
