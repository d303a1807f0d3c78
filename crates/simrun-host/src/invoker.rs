use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Instant;

use simrun_abi::SimrunRunFullyFn;
use tracing::{debug, info, warn};

use crate::args::RunArgs;
use crate::callbacks::{CallbackRegistration, register_host_callbacks};
use crate::config::InvokerConfig;
use crate::error::{Error, Result};
use crate::handle::{BackendHandle, ModuleSlot};
use crate::loader::{LoaderError, ModuleLoader, NativeLoader};
use crate::resolve::{BackendLocation, resolve_backend};
use crate::status::BackendStatus;

/// Loads native simulation backends and runs them to completion.
///
/// Modules are loaded once per resolved path and stay resident until the invoker is
/// dropped or an explicit [`unload`](Self::unload) is allowed by configuration.
pub struct BackendInvoker<L: ModuleLoader = NativeLoader> {
    config: InvokerConfig,
    loader: L,
    modules: Mutex<HashMap<PathBuf, Arc<ModuleSlot>>>,
    run_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl BackendInvoker<NativeLoader> {
    pub fn new(config: InvokerConfig) -> Self {
        Self::with_loader(config, NativeLoader)
    }
}

impl Default for BackendInvoker<NativeLoader> {
    fn default() -> Self {
        Self::new(InvokerConfig::default())
    }
}

impl<L: ModuleLoader> BackendInvoker<L> {
    pub fn with_loader(config: InvokerConfig, loader: L) -> Self {
        Self {
            config,
            loader,
            modules: Mutex::new(HashMap::new()),
            run_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    fn modules(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<ModuleSlot>>> {
        self.modules.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn run_lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.run_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }

    /// Resolves and loads the backend at `path`, or returns the already resident module.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<BackendHandle> {
        let requested = path.as_ref();
        let location = resolve_backend(requested, &self.config.search_dirs)?;
        let key = location.as_path().to_path_buf();

        let mut modules = self.modules();
        if let Some(slot) = modules.get(&key) {
            debug!(
                target: "simrun_host::load",
                path = %key.display(),
                "backend already resident"
            );
            return Ok(BackendHandle::new(key, Arc::downgrade(slot)));
        }

        let slot = Arc::new(self.open_slot(requested, &location)?);
        let handle = BackendHandle::new(key.clone(), Arc::downgrade(&slot));
        info!(
            target: "simrun_host::load",
            path = %key.display(),
            entry_symbol = %slot.entry_symbol,
            progress_callback = slot.callbacks.progress,
            message_callback = slot.callbacks.message,
            "backend loaded"
        );
        modules.insert(key, slot);
        Ok(handle)
    }

    fn open_slot(&self, requested: &Path, location: &BackendLocation) -> Result<ModuleSlot> {
        let path = location.as_path().to_path_buf();
        let module = self.loader.load(location).map_err(|e| match e {
            LoaderError::NotFound(details) => {
                debug!(
                    target: "simrun_host::load",
                    path = %requested.display(),
                    %details,
                    "system loader miss"
                );
                Error::not_found(requested)
            }
            other => Error::load(&path, other.to_string()),
        })?;

        let entry_symbol = self.config.entry_symbol.clone();
        let entry = module
            .resolve_symbol(&entry_symbol)
            .map_err(|e| Error::load(&path, e.to_string()))?;
        // SAFETY: the run entry has the `SimrunRunFullyFn` signature by ABI contract.
        let run_fully: SimrunRunFullyFn = unsafe { entry.cast() };

        let callbacks = if self.config.register_callbacks {
            register_host_callbacks(module.as_ref())
        } else {
            CallbackRegistration::default()
        };

        let run_lock = self.run_lock_for(&path);
        Ok(ModuleSlot {
            path,
            entry_symbol,
            run_fully,
            callbacks,
            run_lock,
            retired: AtomicBool::new(false),
            module,
        })
    }

    /// Runs the backend's entry point and blocks until it returns.
    ///
    /// A non-zero status is a backend outcome, not an error. Errors mean no native call
    /// was made.
    pub fn run_to_completion(
        &self,
        handle: &BackendHandle,
        args: &RunArgs,
    ) -> Result<BackendStatus> {
        let slot = match handle.slot.upgrade() {
            Some(slot) if !slot.is_retired() => slot,
            _ => {
                return Err(Error::invocation(
                    handle.path(),
                    "backend handle is not loaded",
                ));
            }
        };
        let arg = args.to_c_string().map_err(|e| {
            Error::invocation(&slot.path, format!("argument cannot be encoded: {e}"))
        })?;

        let _running = slot.run_lock.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_retired() {
            return Err(Error::invocation(&slot.path, "backend was unloaded"));
        }

        info!(
            target: "simrun_host::run",
            path = %slot.path.display(),
            entry_symbol = %slot.entry_symbol,
            args = %args,
            "running backend to completion"
        );
        let started = Instant::now();
        // SAFETY: the library stays loaded while `slot` is alive; `arg` outlives the call.
        let code = unsafe { (slot.run_fully)(arg.as_ptr()) };
        let status = BackendStatus::from(code);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if status.is_success() {
            info!(
                target: "simrun_host::run",
                path = %slot.path.display(),
                elapsed_ms,
                "backend run completed"
            );
        } else {
            warn!(
                target: "simrun_host::run",
                path = %slot.path.display(),
                status = status.code(),
                elapsed_ms,
                "backend run reported failure"
            );
        }
        Ok(status)
    }

    /// Convenience for the common case of one load followed by one run.
    pub fn load_and_run(&self, path: impl AsRef<Path>, args: &RunArgs) -> Result<BackendStatus> {
        let handle = self.load(path)?;
        self.run_to_completion(&handle, args)
    }

    /// Best-effort unload. Returns whether the module left the registry.
    ///
    /// With `allow_unload` off the module stays resident for the life of the process.
    /// A handle from an earlier load of the same path never unloads a later one.
    pub fn unload(&self, handle: &BackendHandle) -> Result<bool> {
        if !self.config.allow_unload {
            debug!(
                target: "simrun_host::load",
                path = %handle.path().display(),
                "unload disabled; backend stays resident"
            );
            return Ok(false);
        }

        let removed = {
            let mut modules = self.modules();
            match modules.get(handle.path()) {
                Some(entry) if Weak::ptr_eq(&handle.slot, &Arc::downgrade(entry)) => {
                    modules.remove(handle.path())
                }
                _ => None,
            }
        };
        let Some(slot) = removed else {
            debug!(
                target: "simrun_host::load",
                path = %handle.path().display(),
                "handle does not own a resident backend"
            );
            return Ok(false);
        };
        slot.retire();

        match Arc::try_unwrap(slot) {
            Ok(slot) => {
                let path = slot.path.clone();
                slot.module
                    .unload()
                    .map_err(|e| Error::invocation(&path, e.to_string()))?;
                info!(target: "simrun_host::load", path = %path.display(), "backend unloaded");
            }
            Err(slot) => {
                warn!(
                    target: "simrun_host::load",
                    path = %slot.path.display(),
                    "backend busy; library closes when the current run returns"
                );
            }
        }
        Ok(true)
    }

    pub fn is_loaded(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let modules = self.modules();
        if modules.contains_key(path) {
            return true;
        }
        std::fs::canonicalize(path).is_ok_and(|canonical| modules.contains_key(&canonical))
    }

    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.modules().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[cfg(test)]
#[path = "tests/invoker_tests.rs"]
mod tests;
