//! Minimal backend for smoke-testing the host.
//!
//! Build it as a `cdylib` and point the CLI at the resulting library. It "simulates"
//! by checking that the input path exists, reporting progress along the way.

use core::any::Any;
use core::ffi::{c_char, c_int};
use core::sync::atomic::{AtomicPtr, Ordering};
use std::backtrace::Backtrace;
use std::ffi::{CStr, CString};
use std::path::Path;

use simrun_abi::{
    SIMRUN_STATUS_INTERNAL, SIMRUN_STATUS_INVALID_ARG, SIMRUN_STATUS_IO, SIMRUN_STATUS_OK,
    SimrunMessageCallback, SimrunProgressCallback,
};

const PROGRESS_STEPS: c_int = 4;

static PROGRESS_CALLBACK: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());
static MESSAGE_CALLBACK: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

fn report_progress(percent: c_int) {
    let ptr = PROGRESS_CALLBACK.load(Ordering::Acquire);
    if ptr.is_null() {
        return;
    }
    // SAFETY: only ever stored from a `SimrunProgressCallback`.
    let callback: SimrunProgressCallback = unsafe { core::mem::transmute(ptr) };
    callback(percent);
}

fn report_message(text: &str) {
    let ptr = MESSAGE_CALLBACK.load(Ordering::Acquire);
    if ptr.is_null() {
        return;
    }
    let Ok(text) = CString::new(text) else {
        return;
    };
    // SAFETY: only ever stored from a `SimrunMessageCallback`.
    let callback: SimrunMessageCallback = unsafe { core::mem::transmute(ptr) };
    callback(text.as_ptr());
}

fn panic_text(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Turns a panic inside an export into `SIMRUN_STATUS_INTERNAL`, reporting the payload and
/// a backtrace through the message callback.
fn guard_status(op: &'static str, f: impl FnOnce() -> c_int) -> c_int {
    let payload = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(status) => return status,
        Err(payload) => payload,
    };
    let backtrace = Backtrace::force_capture();
    report_message(&format!(
        "`{op}` aborted: {}\nbacktrace:\n{backtrace}",
        panic_text(&*payload)
    ));
    SIMRUN_STATUS_INTERNAL
}

fn run_fully(input: &Path) -> c_int {
    report_message(&format!("Processing input {}", input.display()));
    for step in 0..PROGRESS_STEPS {
        report_progress(step * 100 / PROGRESS_STEPS);
    }
    if !input.exists() {
        report_message(&format!("Input not found: {}", input.display()));
        return SIMRUN_STATUS_IO;
    }
    report_progress(100);
    report_message("Simulation completed successfully");
    SIMRUN_STATUS_OK
}

/// # Safety
/// `path` must be null or a NUL-terminated string valid for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn run_energyplus_fully(path: *const c_char) -> c_int {
    guard_status("run_energyplus_fully", || {
        if path.is_null() {
            return SIMRUN_STATUS_INVALID_ARG;
        }
        // SAFETY: caller contract above.
        let raw = unsafe { CStr::from_ptr(path) };
        if raw.is_empty() {
            return SIMRUN_STATUS_INVALID_ARG;
        }
        run_fully(Path::new(&*raw.to_string_lossy()))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn simrun_register_progress_callback(callback: SimrunProgressCallback) {
    PROGRESS_CALLBACK.store(callback as *mut (), Ordering::Release);
}

#[unsafe(no_mangle)]
pub extern "C" fn simrun_register_message_callback(callback: SimrunMessageCallback) {
    MESSAGE_CALLBACK.store(callback as *mut (), Ordering::Release);
}
