use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use simrun_abi::SimrunRunFullyFn;

use crate::callbacks::CallbackRegistration;
use crate::loader::LoadedModule;

/// Registry entry for one resident backend module.
pub(crate) struct ModuleSlot {
    pub(crate) path: PathBuf,
    pub(crate) entry_symbol: String,
    pub(crate) run_fully: SimrunRunFullyFn,
    pub(crate) callbacks: CallbackRegistration,
    // Shared by every slot opened for `path`, so a reload waits for a retired run.
    pub(crate) run_lock: Arc<Mutex<()>>,
    pub(crate) retired: AtomicBool,
    // Declared last so the entry pointer above never outlives the library.
    pub(crate) module: Box<dyn LoadedModule>,
}

impl ModuleSlot {
    pub(crate) fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }
}

/// Opaque reference to a loaded backend.
///
/// A handle does not keep the module alive; it observes the invoker's registry entry.
#[derive(Clone)]
pub struct BackendHandle {
    path: PathBuf,
    pub(crate) slot: Weak<ModuleSlot>,
}

impl BackendHandle {
    pub(crate) fn new(path: PathBuf, slot: Weak<ModuleSlot>) -> Self {
        Self { path, slot }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.slot
            .upgrade()
            .is_some_and(|slot| !slot.is_retired())
    }

    pub fn entry_symbol(&self) -> Option<String> {
        self.slot.upgrade().map(|slot| slot.entry_symbol.clone())
    }

    pub fn callbacks(&self) -> CallbackRegistration {
        self.slot
            .upgrade()
            .map(|slot| slot.callbacks)
            .unwrap_or_default()
    }
}

impl fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendHandle")
            .field("path", &self.path)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
