use core::ffi::{c_char, c_int};

/// Default exported entry point that runs a whole simulation.
pub const SIMRUN_RUN_ENTRY_SYMBOL: &str = "run_energyplus_fully";

/// Optional: `fn(SimrunProgressCallback)`. Registered before the run starts.
pub const SIMRUN_REGISTER_PROGRESS_SYMBOL: &str = "simrun_register_progress_callback";
/// Optional: `fn(SimrunMessageCallback)`. Registered before the run starts.
pub const SIMRUN_REGISTER_MESSAGE_SYMBOL: &str = "simrun_register_message_callback";

// Status codes (non-exhaustive). Backends may return any other non-zero code.
pub const SIMRUN_STATUS_OK: c_int = 0;
pub const SIMRUN_STATUS_INVALID_ARG: c_int = 1;
pub const SIMRUN_STATUS_IO: c_int = 2;
pub const SIMRUN_STATUS_INTERNAL: c_int = 3;

/// Runs the backend to completion.
///
/// The argument is a NUL-terminated, platform-encoded filesystem path owned by the
/// caller for the duration of the call.
pub type SimrunRunFullyFn = unsafe extern "C" fn(path: *const c_char) -> c_int;

/// Progress in percent, 0..=100.
pub type SimrunProgressCallback = extern "C" fn(percent: c_int);

/// NUL-terminated UTF-8 message, valid only for the duration of the callback.
pub type SimrunMessageCallback = extern "C" fn(message: *const c_char);

pub type SimrunRegisterProgressFn = unsafe extern "C" fn(callback: SimrunProgressCallback);
pub type SimrunRegisterMessageFn = unsafe extern "C" fn(callback: SimrunMessageCallback);

/// Platform file name for a logical library name: `libfoo.so`, `libfoo.dylib`, `foo.dll`.
pub fn dynamic_library_file_name(name: &str) -> String {
    use std::env::consts::{DLL_EXTENSION, DLL_PREFIX};
    format!("{DLL_PREFIX}{name}.{DLL_EXTENSION}")
}
