//! Dynamic loading behind a small platform-neutral interface.
//!
//! The invoker only talks to [`ModuleLoader`] and [`LoadedModule`]; [`NativeLoader`]
//! is the `libloading` implementation used outside of tests.

use core::ffi::c_void;
use core::ptr::NonNull;

use libloading::{Library, Symbol};
use thiserror::Error;

use crate::resolve::BackendLocation;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("platform loader could not locate module: {0}")]
    NotFound(String),
    #[error("{0}")]
    Open(String),
    #[error("missing symbol `{symbol}`: {details}")]
    MissingSymbol { symbol: String, details: String },
    #[error("unload failed: {0}")]
    Unload(String),
}

/// Address of an exported function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSymbol(NonNull<c_void>);

impl RawSymbol {
    pub fn new(ptr: *const c_void) -> Option<Self> {
        NonNull::new(ptr as *mut c_void).map(Self)
    }

    /// Reinterprets the address as a function pointer.
    ///
    /// # Safety
    /// `F` must be a function pointer type matching the exported function's real signature.
    pub unsafe fn cast<F: Copy>(self) -> F {
        debug_assert_eq!(
            core::mem::size_of::<F>(),
            core::mem::size_of::<*const c_void>()
        );
        let ptr = self.0.as_ptr() as *const c_void;
        // SAFETY: caller guarantees F is a pointer-sized fn type for this symbol.
        unsafe { core::mem::transmute_copy::<*const c_void, F>(&ptr) }
    }
}

pub trait ModuleLoader: Send + Sync {
    fn load(&self, location: &BackendLocation) -> Result<Box<dyn LoadedModule>, LoaderError>;
}

pub trait LoadedModule: Send + Sync {
    fn resolve_symbol(&self, name: &str) -> Result<RawSymbol, LoaderError>;

    /// Best effort. Some platforms never truly release a module's code.
    fn unload(self: Box<Self>) -> Result<(), LoaderError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLoader;

impl ModuleLoader for NativeLoader {
    fn load(&self, location: &BackendLocation) -> Result<Box<dyn LoadedModule>, LoaderError> {
        // SAFETY: opening a foreign library runs its initializers; the backend is trusted.
        let lib = unsafe { Library::new(location.as_path()) };
        match (lib, location) {
            (Ok(lib), _) => Ok(Box::new(NativeModule { lib })),
            (Err(e), BackendLocation::SystemName(name)) => {
                Err(classify_open_failure(name, &error_chain(&e)))
            }
            (Err(e), BackendLocation::File(_)) => Err(LoaderError::Open(error_chain(&e))),
        }
    }
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// A system-search miss is `NotFound` only when the loader says the requested module
/// itself is absent; a broken module, or one whose dependency is missing, is `Open`.
pub(crate) fn classify_open_failure(name: &str, message: &str) -> LoaderError {
    // glibc: "<name>: cannot open shared object file: No such file or directory".
    // musl: "Error loading shared library <name>: No such file or directory".
    let dl_missing = message.contains(&format!(
        "{name}: cannot open shared object file: No such file or directory"
    )) || message.contains(&format!(
        "Error loading shared library {name}: No such file or directory"
    ));
    // macOS dyld lists every path it tried, each with a reason in parentheses.
    let dyld_missing = message.starts_with(&format!("dlopen({name},")) && {
        let reasons: Vec<&str> = message
            .split("' (")
            .skip(1)
            .filter_map(|rest| rest.split(')').next())
            .collect();
        message.contains("image not found")
            || (!reasons.is_empty() && reasons.iter().all(|r| r.starts_with("no such file")))
    };
    // Windows: ERROR_MOD_NOT_FOUND.
    let win_missing = message.contains("(os error 126)");

    if dl_missing || dyld_missing || win_missing {
        LoaderError::NotFound(message.to_string())
    } else {
        LoaderError::Open(message.to_string())
    }
}

struct NativeModule {
    lib: Library,
}

impl LoadedModule for NativeModule {
    fn resolve_symbol(&self, name: &str) -> Result<RawSymbol, LoaderError> {
        let missing = |details: String| LoaderError::MissingSymbol {
            symbol: name.to_string(),
            details,
        };
        // SAFETY: only the address is read here; callers cast it to the ABI signature.
        let symbol: Symbol<unsafe extern "C" fn()> =
            unsafe { self.lib.get(name.as_bytes()) }.map_err(|e| missing(e.to_string()))?;
        RawSymbol::new(*symbol as *const c_void)
            .ok_or_else(|| missing("symbol resolved to null".to_string()))
    }

    fn unload(self: Box<Self>) -> Result<(), LoaderError> {
        self.lib
            .close()
            .map_err(|e| LoaderError::Unload(e.to_string()))
    }
}
