//! Identities used to key the registry and correlate log lines.

use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Canonical key under which a running module is tracked.
///
/// Two resolves of the same identifier must yield equal identities, so the
/// identity is tied to what gets constructed (by default the concrete type
/// name) rather than to the string the host passed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleIdentity(String);

impl ModuleIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Identity derived from a concrete module type.
    pub fn of<M: ?Sized + 'static>() -> Self {
        Self::new(std::any::type_name::<M>())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ModuleIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unique id of one execution handle, used to correlate worker log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleId(Ulid);

impl HandleId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle-{}", self.0)
    }
}
