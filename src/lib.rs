//! vjail - FreeBSD vnet jail handles
//!
//! A handle-based abstraction over the jail(2) isolation primitive, so
//! orchestration code can create, attach to, identify, enumerate and tear
//! down vnet jails without talking to raw syscalls:
//!
//! - [`VjHandle`]: jail identity, display, liveness and removal
//! - [`vnet`]: lifecycle operations (`new`, `set`, `get`) and resolution
//!   by pid or bookkeeping path
//! - [`JailParams`]: typed parameters encoded into the kernel's iovec
//!   parameter format
//! - [`MarkerStore`]: on-disk bookkeeping that maps jail ids back to the
//!   processes attached to them
//!
//! # Thread pinning
//!
//! Jail membership belongs to the operating-system thread. Callers that
//! need membership changes to stay thread-local must pin the calling
//! thread for the duration of `new`/`set`/`get`/`close` (in async code:
//! run them on a dedicated blocking thread, never across an await point).
//! The crate documents this precondition; it does not enforce it.
//!
//! # Platform support
//!
//! The syscall-backed operations exist only on FreeBSD. On other targets
//! they compile and return [`Error::NotImplemented`], while parameter
//! encoding, path parsing and the marker store remain fully usable.

pub mod error;
#[cfg(target_os = "freebsd")]
pub mod ffi;
pub mod handle;
pub mod marker;
pub mod options;
pub mod params;
pub mod vnet;

// Re-exports
pub use error::{Error, Result};
pub use handle::VjHandle;
pub use marker::{MarkerStore, RUN_DIR};
pub use options::JailOptions;
pub use params::{EncodedParam, JailParams, ParamValue};
#[cfg(target_os = "freebsd")]
pub use vnet::RunningJails;
pub use vnet::{
    delete_named, get, get_from_name, get_from_path, get_from_pid, get_from_thread, new,
    new_named, new_with, set,
};
