use core::ffi::{c_char, c_int};
use std::ffi::CStr;

use simrun_abi::{
    SIMRUN_REGISTER_MESSAGE_SYMBOL, SIMRUN_REGISTER_PROGRESS_SYMBOL, SimrunRegisterMessageFn,
    SimrunRegisterProgressFn,
};
use tracing::{debug, info};

use crate::loader::{LoadedModule, LoaderError};

/// Which optional callbacks a backend accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallbackRegistration {
    pub progress: bool,
    pub message: bool,
}

extern "C" fn host_progress(percent: c_int) {
    debug!(target: "simrun_host::backend", percent, "backend progress");
}

extern "C" fn host_message(message: *const c_char) {
    if message.is_null() {
        return;
    }
    // SAFETY: the backend passes a NUL-terminated string valid for this call.
    let text = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    info!(target: "simrun_host::backend", "{}", text.trim_end());
}

/// Registers host callbacks for the optional symbols the module exports.
pub(crate) fn register_host_callbacks(module: &dyn LoadedModule) -> CallbackRegistration {
    let mut registration = CallbackRegistration::default();

    match module.resolve_symbol(SIMRUN_REGISTER_PROGRESS_SYMBOL) {
        Ok(symbol) => {
            // SAFETY: symbol type matches the ABI contract for this name.
            let register: SimrunRegisterProgressFn = unsafe { symbol.cast() };
            unsafe { register(host_progress) };
            registration.progress = true;
        }
        Err(e) => log_skipped(SIMRUN_REGISTER_PROGRESS_SYMBOL, &e),
    }

    match module.resolve_symbol(SIMRUN_REGISTER_MESSAGE_SYMBOL) {
        Ok(symbol) => {
            // SAFETY: symbol type matches the ABI contract for this name.
            let register: SimrunRegisterMessageFn = unsafe { symbol.cast() };
            unsafe { register(host_message) };
            registration.message = true;
        }
        Err(e) => log_skipped(SIMRUN_REGISTER_MESSAGE_SYMBOL, &e),
    }

    registration
}

fn log_skipped(symbol: &str, error: &LoaderError) {
    debug!(
        target: "simrun_host::load",
        symbol,
        error = %error,
        "optional callback symbol not exported"
    );
}
