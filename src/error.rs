//! Unified error types for vjail

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::handle::VjHandle;

/// Main error type for vjail operations
#[derive(Error, Debug)]
pub enum Error {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // FFI errors
    #[error("jail_set syscall failed: {0}")]
    JailSet(String),

    #[error("jail_get syscall failed: {0}")]
    JailGet(String),

    #[error("jail_attach failed for jid {jid}: {source}")]
    JailAttach { jid: i32, source: io::Error },

    #[error("jail_remove failed for jid {jid}: {source}")]
    JailRemove { jid: i32, source: io::Error },

    #[error("failed to create C string: {0}")]
    CString(#[from] std::ffi::NulError),

    // Parameter errors
    #[error("unsupported value for jail parameter '{0}'")]
    UnsupportedParam(String),

    // Bookkeeping errors
    #[error("jail marker operation failed for '{path}': {source}")]
    Bookkeeping { path: PathBuf, source: io::Error },

    #[error("jail {jid} created but marker '{path}' could not be written: {source}")]
    MarkerWrite {
        jid: i32,
        path: PathBuf,
        source: io::Error,
    },

    // Resolution errors
    #[error("no jail binding found for pid {0}")]
    NotFound(i32),

    #[error("no trailing jail id in path '{0}'")]
    MalformedPath(String),

    // Platform errors
    #[error("not implemented on this platform")]
    NotImplemented,
}

impl Error {
    /// The handle of a jail that was created in the kernel before the
    /// operation failed.
    ///
    /// `vnet::new` writes a bookkeeping marker after `jail_set(2)` succeeds.
    /// If the marker write fails the jail is not rolled back; the error
    /// carries the live handle so the caller can attach to it or destroy it.
    pub fn created_handle(&self) -> Option<VjHandle> {
        match self {
            Error::MarkerWrite { jid, .. } => Some(VjHandle::from_raw(*jid)),
            _ => None,
        }
    }
}

/// Result type alias for vjail operations
pub type Result<T> = std::result::Result<T, Error>;
