use std::any::Any;
use std::fmt;

use thiserror::Error;

use crate::domain::ModuleIdentity;

/// How a module operation went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleErrorKind {
    /// The operation returned an error.
    Failed,
    /// The operation panicked and the panic was caught.
    Panicked,
}

impl fmt::Display for ModuleErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleErrorKind::Failed => f.write_str("failed"),
            ModuleErrorKind::Panicked => f.write_str("panicked"),
        }
    }
}

/// Failure raised by a module's construction, `initialize()` or `run()`.
#[derive(Debug, Error)]
#[error("module {kind}: {message}")]
pub struct ModuleError {
    kind: ModuleErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ModuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: ModuleErrorKind::Failed,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            kind: ModuleErrorKind::Failed,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Converts a payload caught by `catch_unwind` into an error.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self {
            kind: ModuleErrorKind::Panicked,
            message: panic_message(payload),
            source: None,
        }
    }

    pub fn kind(&self) -> ModuleErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Extract a human-readable message from a panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return (*msg).to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}

/// Errors produced while turning an identifier into a module.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no module registered for identifier '{0}'")]
    NotFound(String),

    #[error("failed to construct module '{id}': {source}")]
    ConstructFailed {
        id: String,
        #[source]
        source: ModuleError,
    },
}

/// Why `Lifecycle::try_execute` refused or failed to start a module.
///
/// Every variant maps to a `false` returned to the host.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Already executed module of class: {0}")]
    DuplicateIdentity(ModuleIdentity),

    #[error("failed to initialize module {identity}: {source}")]
    Init {
        identity: ModuleIdentity,
        #[source]
        source: ModuleError,
    },

    #[error("failed to spawn worker for module {identity}: {source}")]
    Spawn {
        identity: ModuleIdentity,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Admit(#[from] crate::registry::RegistryError),
}
