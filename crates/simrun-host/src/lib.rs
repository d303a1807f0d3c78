//! Host side of the simrun backend ABI.
//!
//! Locates a native simulation backend, loads it once per path, and runs its
//! "run fully" entry point to completion on the calling thread. Everything the
//! simulation does happens inside the backend; the host only sees the final status
//! and, when the backend exports the hooks, progress and message callbacks.

mod args;
mod callbacks;
mod config;
mod error;
mod handle;
mod invoker;
pub mod loader;
mod resolve;
mod status;

pub use args::RunArgs;
pub use callbacks::CallbackRegistration;
pub use config::{CONFIG_FILE_NAME, InvokerConfig};
pub use error::{Error, Result};
pub use handle::BackendHandle;
pub use invoker::BackendInvoker;
pub use resolve::{BackendLocation, resolve_backend};
pub use status::BackendStatus;
