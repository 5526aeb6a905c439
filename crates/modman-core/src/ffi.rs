//! Foreign-function boundary.
//!
//! A host process installs one lifecycle at startup with [`install`] and
//! then calls the exported `extern "C"` functions. Every exported function
//! catches panics and turns every failure into `false`; nothing unwinds
//! into the caller.

use std::ffi::{CStr, c_char};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, OnceLock};

use thiserror::Error;
use tracing::error;

use crate::error::panic_message;
use crate::lifecycle::Lifecycle;
use crate::logging::init_tracing;
use crate::resolver::Resolver;

type SharedLifecycle = Mutex<Lifecycle<Box<dyn Resolver + Send>>>;

static LIFECYCLE: OnceLock<SharedLifecycle> = OnceLock::new();

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallError {
    #[error("a module lifecycle is already installed")]
    AlreadyInstalled,
}

/// Installs the process-global lifecycle used by the exported functions.
///
/// The lifecycle sits behind a mutex, so a host that breaks the
/// one-caller-at-a-time contract is serialised rather than racing the
/// uniqueness check.
pub fn install<R: Resolver + Send + 'static>(lifecycle: Lifecycle<R>) -> Result<(), InstallError> {
    LIFECYCLE
        .set(Mutex::new(lifecycle.into_dyn()))
        .map_err(|_| InstallError::AlreadyInstalled)
}

pub fn is_installed() -> bool {
    LIFECYCLE.get().is_some()
}

/// Runs `execute` on the installed lifecycle.
pub fn execute_installed(id: &str) -> bool {
    let Some(shared) = LIFECYCLE.get() else {
        error!(module_id = id, "no module lifecycle installed");
        return false;
    };
    let mut lifecycle = match shared.lock() {
        Ok(guard) => guard,
        Err(_) => {
            error!(module_id = id, "module lifecycle lock poisoned");
            return false;
        }
    };
    lifecycle.execute(id)
}

fn execute_at_boundary(id: &str) -> bool {
    let executed = execute_installed(id);
    if !executed {
        error!(module_id = id, "Could not execute module {id}");
    }
    executed
}

/// Catch panics in exported functions, logging them and returning `default`.
fn guard_with_default<T>(op: &'static str, default: T, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(val) => val,
        Err(payload) => {
            let msg = panic_message(payload);
            error!("panic in ffi `{op}`: {msg}");
            default
        }
    }
}

/// Installs the tracing subscriber for hosts that do not bring their own.
#[unsafe(no_mangle)]
pub extern "C" fn modman_init_logging() {
    guard_with_default("modman_init_logging", (), init_tracing);
}

/// Executes the module named by a NUL-terminated UTF-8 string.
///
/// # Safety
/// `id` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn modman_execute_module(id: *const c_char) -> bool {
    guard_with_default("modman_execute_module", false, || {
        if id.is_null() {
            error!("module identifier is null");
            return false;
        }
        let raw = unsafe { CStr::from_ptr(id) };
        match raw.to_str() {
            Ok(id) => execute_at_boundary(id),
            Err(err) => {
                error!("module identifier is not valid UTF-8: {err}");
                false
            }
        }
    })
}

/// Executes the module named by a length-prefixed UTF-8 string.
///
/// # Safety
/// `ptr` must point to `len` readable bytes for the duration of the call.
/// A null `ptr` is only accepted together with `len == 0`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn modman_execute_module_len(ptr: *const u8, len: usize) -> bool {
    guard_with_default("modman_execute_module_len", false, || {
        let bytes: &[u8] = if ptr.is_null() {
            if len != 0 {
                error!(len, "module identifier is null");
                return false;
            }
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(ptr, len) }
        };
        match std::str::from_utf8(bytes) {
            Ok(id) => execute_at_boundary(id),
            Err(err) => {
                error!("module identifier is not valid UTF-8: {err}");
                false
            }
        }
    })
}
