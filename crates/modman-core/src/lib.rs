//! modman-core
//!
//! A minimal module lifecycle manager: a host asks for a module by name,
//! the lifecycle resolves it, initializes it on the calling thread and runs
//! it on a dedicated worker thread, allowing at most one instance per
//! module identity.
//!
//! # Modules
//! - **domain**: identities, handle ids, worker states
//! - **module**: the `Module` contract (`initialize` + `run`)
//! - **resolver**: identifier -> fresh module (`Resolver`, `FactoryResolver`)
//! - **registry**: identity -> execution handle, uniqueness
//! - **lifecycle**: the resolve/initialize/admit/spawn protocol
//! - **observability**: serializable status snapshots
//! - **ffi**: `extern "C"` entry points for native hosts

pub mod config;
pub mod domain;
pub mod error;
pub mod ffi;
pub mod lifecycle;
pub mod logging;
pub mod module;
pub mod observability;
pub mod registry;
pub mod resolver;

mod worker;

pub use config::LifecycleConfig;
pub use domain::{HandleId, ModuleIdentity, WorkerState};
pub use error::{ExecuteError, ModuleError, ModuleErrorKind, ResolveError};
pub use lifecycle::{BuildError, Lifecycle, LifecycleBuilder};
pub use module::Module;
pub use observability::{LifecycleStatus, ModuleStatus, StateCounts};
pub use registry::{ExecutionHandle, ModuleRegistry, RegistryError};
pub use resolver::{FactoryResolver, RegisterError, ResolvedModule, Resolver};
