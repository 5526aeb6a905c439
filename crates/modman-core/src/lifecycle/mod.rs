//! Lifecycle - resolve, check uniqueness, initialize, admit, spawn.
//!
//! `Lifecycle` is the single entry point a host talks to. It owns the
//! resolver and the registry, and takes `&mut self` on `execute` so calls
//! are serialised by construction.

mod builder;

pub use self::builder::{BuildError, LifecycleBuilder};

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, error, info, warn};

use crate::config::LifecycleConfig;
use crate::domain::{HandleId, ModuleIdentity};
use crate::error::{ExecuteError, ModuleError};
use crate::observability::LifecycleStatus;
use crate::registry::ModuleRegistry;
use crate::resolver::Resolver;
use crate::worker;

pub struct Lifecycle<R> {
    resolver: R,
    registry: ModuleRegistry,
    config: LifecycleConfig,
}

impl<R: Resolver> Lifecycle<R> {
    pub fn new(resolver: R) -> Self {
        Self::with_config(resolver, LifecycleConfig::default())
    }

    pub fn with_config(resolver: R, config: LifecycleConfig) -> Self {
        Self {
            resolver,
            registry: ModuleRegistry::new(),
            config,
        }
    }

    pub fn builder(resolver: R) -> LifecycleBuilder<R> {
        LifecycleBuilder::new(resolver)
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn status(&self) -> LifecycleStatus {
        LifecycleStatus::collect(&self.registry)
    }

    /// Loads and starts the module behind `id`, reporting the outcome as a
    /// plain boolean. Every failure is logged here and never propagates.
    pub fn execute(&mut self, id: &str) -> bool {
        match self.try_execute(id) {
            Ok(_) => true,
            Err(ExecuteError::DuplicateIdentity(identity)) => {
                warn!(module_id = id, identity = %identity, "Already executed module of class: {identity}");
                false
            }
            Err(err) => {
                error!(module_id = id, "{err}");
                false
            }
        }
    }

    /// Same protocol as [`Lifecycle::execute`], returning the admitted
    /// identity or the stage that failed.
    ///
    /// Stages, in order: resolve, uniqueness check, `initialize()`, spawn,
    /// admit, release the worker. A duplicate module is dropped before
    /// `initialize()` is called on it.
    pub fn try_execute(&mut self, id: &str) -> Result<ModuleIdentity, ExecuteError> {
        info!(module_id = id, "Executing module: {id}");

        let (identity, mut module) = self.resolver.resolve(id)?.into_parts();

        if self.registry.contains(&identity) {
            return Err(ExecuteError::DuplicateIdentity(identity));
        }

        let initialized = match catch_unwind(AssertUnwindSafe(|| module.initialize())) {
            Ok(result) => result,
            Err(payload) => Err(ModuleError::from_panic(payload)),
        };
        if let Err(source) = initialized {
            return Err(ExecuteError::Init { identity, source });
        }
        debug!(module_id = id, identity = %identity, "module initialized");

        let handle_id = HandleId::new();
        let pending = worker::spawn(&identity, handle_id, module, &self.config).map_err(
            |source| ExecuteError::Spawn {
                identity: identity.clone(),
                source,
            },
        )?;

        let (handle, gate) = pending.into_handle(identity.clone());
        // an error here drops the gate, and the parked worker exits unrun
        self.registry.insert(identity.clone(), handle)?;
        gate.open();

        info!(module_id = id, identity = %identity, handle_id = %handle_id, "module admitted");
        Ok(identity)
    }
}

impl<R: Resolver + Send + 'static> Lifecycle<R> {
    /// Erases the resolver type so the lifecycle can live in a global slot.
    pub fn into_dyn(self) -> Lifecycle<Box<dyn Resolver + Send>> {
        Lifecycle {
            resolver: Box::new(self.resolver),
            registry: self.registry,
            config: self.config,
        }
    }
}
