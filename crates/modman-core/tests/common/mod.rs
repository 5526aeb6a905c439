#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use modman_core::{
    FactoryResolver, Lifecycle, Module, ModuleError, ModuleIdentity, Resolver, WorkerState,
};

/// Counters shared between a test and the modules it spawns.
#[derive(Debug, Default)]
pub struct Probe {
    pub inits: AtomicUsize,
    pub runs: AtomicUsize,
    pub run_before_init: AtomicBool,
}

impl Probe {
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

/// Lets several `run()` bodies observe each other while executing.
#[derive(Debug)]
pub struct Overlap {
    active: Mutex<usize>,
    peak: AtomicUsize,
    expected: usize,
}

impl Overlap {
    pub fn new(expected: usize) -> Arc<Self> {
        Arc::new(Self {
            active: Mutex::new(0),
            peak: AtomicUsize::new(0),
            expected,
        })
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter_and_wait(&self) {
        {
            let mut active = self.active.lock().unwrap();
            *active += 1;
            self.peak.fetch_max(*active, Ordering::SeqCst);
        }
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if *self.active.lock().unwrap() >= self.expected {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        *self.active.lock().unwrap() -= 1;
    }
}

#[derive(Debug, Clone)]
pub enum RunBehavior {
    Return,
    Sleep(Duration),
    Fail,
    Panic,
    Overlap(Arc<Overlap>),
}

pub struct ProbeModule {
    probe: Arc<Probe>,
    fail_init: bool,
    initialized: bool,
    behavior: RunBehavior,
}

impl ProbeModule {
    pub fn new(probe: Arc<Probe>, fail_init: bool, behavior: RunBehavior) -> Self {
        Self {
            probe,
            fail_init,
            initialized: false,
            behavior,
        }
    }
}

impl Module for ProbeModule {
    fn initialize(&mut self) -> Result<(), ModuleError> {
        self.probe.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(ModuleError::new("probe refused to initialize"));
        }
        self.initialized = true;
        Ok(())
    }

    fn run(&mut self) -> Result<(), ModuleError> {
        if !self.initialized {
            self.probe.run_before_init.store(true, Ordering::SeqCst);
        }
        self.probe.runs.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            RunBehavior::Return => Ok(()),
            RunBehavior::Sleep(duration) => {
                thread::sleep(*duration);
                Ok(())
            }
            RunBehavior::Fail => Err(ModuleError::new("probe run failed")),
            RunBehavior::Panic => panic!("probe run panicked"),
            RunBehavior::Overlap(overlap) => {
                overlap.enter_and_wait();
                Ok(())
            }
        }
    }
}

/// Registers a probe module under `id` with an explicit identity.
pub fn register_probe(
    resolver: &mut FactoryResolver,
    id: &str,
    identity: &str,
    probe: &Arc<Probe>,
    behavior: RunBehavior,
) {
    let probe = Arc::clone(probe);
    resolver
        .register_with(id, ModuleIdentity::new(identity), move || {
            Ok(Box::new(ProbeModule::new(
                Arc::clone(&probe),
                false,
                behavior.clone(),
            )) as Box<dyn Module>)
        })
        .unwrap();
}

/// Polls until the worker for `identity` reaches a terminal state.
pub fn wait_terminal<R: Resolver>(lifecycle: &Lifecycle<R>, identity: &ModuleIdentity) -> WorkerState {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let handle = lifecycle
            .registry()
            .get(identity)
            .unwrap_or_else(|| panic!("{identity} is not registered"));
        let state = handle.state();
        if state.is_terminal() {
            return state;
        }
        assert!(Instant::now() < deadline, "{identity} stuck in {state:?}");
        thread::sleep(Duration::from_millis(5));
    }
}
