//! Resolver - identifier string to freshly constructed module.
//!
//! The resolver is the seam where an embedding application decides which
//! modules are loadable. `FactoryResolver` is the stock implementation: an
//! explicit table of construction closures filled in at startup.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use thiserror::Error;
use tracing::{debug, trace};

use crate::domain::ModuleIdentity;
use crate::error::{ModuleError, ResolveError};
use crate::module::Module;

/// A module that has been constructed but not yet initialized.
pub struct ResolvedModule {
    identity: ModuleIdentity,
    module: Box<dyn Module>,
}

impl ResolvedModule {
    pub fn new(identity: ModuleIdentity, module: Box<dyn Module>) -> Self {
        Self { identity, module }
    }

    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    pub fn into_parts(self) -> (ModuleIdentity, Box<dyn Module>) {
        (self.identity, self.module)
    }
}

impl fmt::Debug for ResolvedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedModule")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Maps identifier strings to new module instances.
///
/// Implementations must be deterministic in which module type an identifier
/// maps to, and must return a distinct instance on every call.
pub trait Resolver {
    fn resolve(&self, id: &str) -> Result<ResolvedModule, ResolveError>;

    /// Whether `resolve(id)` could find a module for this identifier.
    fn knows(&self, id: &str) -> bool;
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn resolve(&self, id: &str) -> Result<ResolvedModule, ResolveError> {
        (**self).resolve(id)
    }

    fn knows(&self, id: &str) -> bool {
        (**self).knows(id)
    }
}

/// Construction closure stored per identifier.
pub type ModuleFactoryFn = Box<dyn Fn() -> Result<Box<dyn Module>, ModuleError> + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    #[error("module identifier '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("module identifier must not be empty")]
    EmptyIdentifier,
}

struct FactoryEntry {
    identity: ModuleIdentity,
    factory: ModuleFactoryFn,
}

/// Resolver backed by a table of factories.
///
/// Built during startup (mutable), then handed to the lifecycle which only
/// reads from it.
#[derive(Default)]
pub struct FactoryResolver {
    factories: HashMap<String, FactoryEntry>,
}

impl FactoryResolver {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers `M` under `id`; the identity is `M`'s type name.
    pub fn register<M: Module + Default>(
        &mut self,
        id: impl Into<String>,
    ) -> Result<(), RegisterError> {
        self.register_with(id, ModuleIdentity::of::<M>(), || {
            Ok(Box::new(M::default()) as Box<dyn Module>)
        })
    }

    /// Registers an explicit factory under `id` with a caller-chosen identity.
    ///
    /// Several identifiers may share one identity; they then count as the
    /// same module for duplicate suppression.
    pub fn register_with<F>(
        &mut self,
        id: impl Into<String>,
        identity: ModuleIdentity,
        factory: F,
    ) -> Result<(), RegisterError>
    where
        F: Fn() -> Result<Box<dyn Module>, ModuleError> + Send + Sync + 'static,
    {
        let id = id.into();
        if id.is_empty() {
            return Err(RegisterError::EmptyIdentifier);
        }
        if self.factories.contains_key(&id) {
            return Err(RegisterError::AlreadyRegistered(id));
        }
        debug!(module_id = %id, identity = %identity, "registering module factory");
        self.factories.insert(
            id,
            FactoryEntry {
                identity,
                factory: Box::new(factory),
            },
        );
        Ok(())
    }

    /// Registered identifiers, sorted.
    pub fn registered_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.factories.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Resolver for FactoryResolver {
    fn resolve(&self, id: &str) -> Result<ResolvedModule, ResolveError> {
        let entry = self
            .factories
            .get(id)
            .ok_or_else(|| ResolveError::NotFound(id.to_string()))?;

        trace!(module_id = id, identity = %entry.identity, "constructing module");
        let constructed = match catch_unwind(AssertUnwindSafe(|| (entry.factory)())) {
            Ok(result) => result,
            Err(payload) => Err(ModuleError::from_panic(payload)),
        };

        constructed
            .map(|module| ResolvedModule::new(entry.identity.clone(), module))
            .map_err(|source| ResolveError::ConstructFailed {
                id: id.to_string(),
                source,
            })
    }

    fn knows(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }
}

impl fmt::Debug for FactoryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryResolver")
            .field("ids", &self.registered_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModuleErrorKind;
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Noop;

    impl Module for Noop {
        fn initialize(&mut self) -> Result<(), ModuleError> {
            Ok(())
        }

        fn run(&mut self) -> Result<(), ModuleError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Other;

    impl Module for Other {
        fn initialize(&mut self) -> Result<(), ModuleError> {
            Ok(())
        }

        fn run(&mut self) -> Result<(), ModuleError> {
            Ok(())
        }
    }

    #[test]
    fn resolves_registered_type_with_type_identity() {
        let mut resolver = FactoryResolver::new();
        resolver.register::<Noop>("mod.noop").unwrap();

        let resolved = resolver.resolve("mod.noop").unwrap();
        assert_eq!(resolved.identity(), &ModuleIdentity::of::<Noop>());
        assert!(resolver.knows("mod.noop"));
    }

    #[test]
    fn every_resolve_constructs_a_fresh_instance() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructed);
        let mut resolver = FactoryResolver::new();
        resolver
            .register_with("mod.counted", ModuleIdentity::new("Counted"), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(Noop) as Box<dyn Module>)
            })
            .unwrap();

        let first = resolver.resolve("mod.counted").unwrap();
        let second = resolver.resolve("mod.counted").unwrap();
        assert_eq!(first.identity(), second.identity());
        assert_eq!(constructed.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    #[case("")]
    #[case("nope")]
    #[case("mod.noop ")]
    #[case("MOD.NOOP")]
    fn unknown_identifiers_are_not_found(#[case] id: &str) {
        let mut resolver = FactoryResolver::new();
        resolver.register::<Noop>("mod.noop").unwrap();

        let err = resolver.resolve(id).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(ref missing) if missing == id));
        assert!(!resolver.knows(id));
    }

    #[test]
    fn failing_factory_is_construct_failed() {
        let mut resolver = FactoryResolver::new();
        resolver
            .register_with("mod.broken", ModuleIdentity::new("Broken"), || {
                Err(ModuleError::new("missing resource"))
            })
            .unwrap();

        let err = resolver.resolve("mod.broken").unwrap_err();
        match err {
            ResolveError::ConstructFailed { id, source } => {
                assert_eq!(id, "mod.broken");
                assert_eq!(source.kind(), ModuleErrorKind::Failed);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn panicking_factory_is_construct_failed() {
        let mut resolver = FactoryResolver::new();
        resolver
            .register_with("mod.panics", ModuleIdentity::new("Panics"), || {
                panic!("constructor exploded")
            })
            .unwrap();

        let err = resolver.resolve("mod.panics").unwrap_err();
        match err {
            ResolveError::ConstructFailed { source, .. } => {
                assert_eq!(source.kind(), ModuleErrorKind::Panicked);
                assert_eq!(source.message(), "constructor exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn double_registration_is_rejected() {
        let mut resolver = FactoryResolver::new();
        resolver.register::<Noop>("mod.noop").unwrap();
        let result = resolver.register::<Other>("mod.noop");
        assert_eq!(
            result,
            Err(RegisterError::AlreadyRegistered("mod.noop".to_string()))
        );
    }

    #[test]
    fn empty_identifier_cannot_be_registered() {
        let mut resolver = FactoryResolver::new();
        assert_eq!(
            resolver.register::<Noop>(""),
            Err(RegisterError::EmptyIdentifier)
        );
        assert!(resolver.is_empty());
    }

    #[test]
    fn registered_ids_are_sorted() {
        let mut resolver = FactoryResolver::new();
        resolver.register::<Other>("b.other").unwrap();
        resolver.register::<Noop>("a.noop").unwrap();
        assert_eq!(resolver.registered_ids(), vec!["a.noop", "b.other"]);
        assert_eq!(resolver.len(), 2);
    }
}
