use serde::{Deserialize, Serialize};

use crate::domain::ModuleIdentity;

pub const DEFAULT_THREAD_NAME_PREFIX: &str = "modman-worker";

/// Lifecycle settings.
///
/// Nothing here is read from files or the environment; the embedding host
/// builds it in code or hands over its own JSON via [`LifecycleConfig::from_json`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Worker threads are named `<prefix>-<identity>`.
    pub thread_name_prefix: String,

    /// Stack size for worker threads, in bytes. `None` keeps the platform default.
    pub stack_size: Option<usize>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            stack_size: None,
        }
    }
}

impl LifecycleConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub(crate) fn thread_name(&self, identity: &ModuleIdentity) -> String {
        format!("{}-{}", self.thread_name_prefix, identity)
    }
}
