//! The contract every loadable module implements.

use crate::error::ModuleError;

/// A pluggable unit of work with an `initialize`/`run` lifecycle.
///
/// `initialize()` runs on the caller's thread and must succeed before
/// `run()` is called on the module's own worker thread. `run()` may block
/// for as long as it likes; nothing cancels it.
///
/// # Example
/// ```ignore
/// #[derive(Default)]
/// struct Heartbeat;
///
/// impl Module for Heartbeat {
///     fn initialize(&mut self) -> Result<(), ModuleError> {
///         Ok(())
///     }
///
///     fn run(&mut self) -> Result<(), ModuleError> {
///         loop {
///             std::thread::sleep(std::time::Duration::from_secs(1));
///         }
///     }
/// }
/// ```
pub trait Module: Send + 'static {
    fn initialize(&mut self) -> Result<(), ModuleError>;

    fn run(&mut self) -> Result<(), ModuleError>;
}
