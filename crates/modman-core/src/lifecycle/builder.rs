//! LifecycleBuilder - wiring and fail-fast startup checks.

use crate::config::LifecycleConfig;
use crate::resolver::Resolver;

use super::Lifecycle;

/// Builds a [`Lifecycle`].
///
/// # Example
/// ```ignore
/// let lifecycle = Lifecycle::builder(resolver)
///     .thread_name_prefix("host-module")
///     .expect_modules(&["mod.demo"])
///     .build()?;
/// ```
///
/// `build()` checks that every identifier passed to `expect_modules` is
/// known to the resolver, so a mis-wired host fails at startup instead of
/// on its first `execute`.
pub struct LifecycleBuilder<R> {
    resolver: R,
    config: LifecycleConfig,
    expected_modules: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Missing modules: {0:?}. These modules were expected but the resolver does not know them.")]
    MissingModules(Vec<String>),
}

impl<R: Resolver> LifecycleBuilder<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            config: LifecycleConfig::default(),
            expected_modules: None,
        }
    }

    pub fn config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.config.stack_size = Some(bytes);
        self
    }

    pub fn expect_modules(mut self, ids: &[&str]) -> Self {
        self.expected_modules = Some(ids.iter().map(|id| id.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<Lifecycle<R>, BuildError> {
        if let Some(expected) = &self.expected_modules {
            let missing: Vec<String> = expected
                .iter()
                .filter(|id| !self.resolver.knows(id))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingModules(missing));
            }
        }
        Ok(Lifecycle::with_config(self.resolver, self.config))
    }
}
