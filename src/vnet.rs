//! Vnet jail lifecycle and resolution
//!
//! Creation, attachment and resolution of vnet jails. Jail membership is a
//! property of the operating-system thread, not the logical process:
//! callers must keep [`new`], [`set`], [`get`] and
//! [`VjHandle::close`](crate::VjHandle::close) on one pinned OS thread for
//! the duration of the membership change. Nothing here enforces that.
//!
//! All operations are synchronous, blocking syscalls or bounded filesystem
//! scans. No internal locking is provided; concurrent marker writes for
//! overlapping jail ids must be serialized by the caller.
//!
//! Name- and thread-scoped operations are not supported on this platform
//! family and fail with a distinguishable error instead of silently
//! succeeding.

use crate::error::{Error, Result};
use crate::handle::VjHandle;
use crate::marker;
use crate::options::JailOptions;
use std::path::Path;

#[cfg(target_os = "freebsd")]
use crate::ffi::{self, JailFlags};
#[cfg(target_os = "freebsd")]
use crate::marker::MarkerStore;
#[cfg(target_os = "freebsd")]
use nix::unistd::getpid;

/// Create a new vnet jail, attach the calling process to it and return a
/// handle.
///
/// Uses the default [`JailOptions`]: rooted at `/`, own network stack, a
/// child-jail limit and `persist`, so the jail survives process exit until
/// [`VjHandle::close`](crate::VjHandle::close) is called.
#[cfg(target_os = "freebsd")]
pub fn new() -> Result<VjHandle> {
    new_with(&JailOptions::default())
}

/// Create a new vnet jail from explicit options.
///
/// Creation and attachment happen in one jail_set(2) call, then the
/// bookkeeping marker for the new jid is written. If the marker write
/// fails the jail is not rolled back; the error carries the live handle
/// (see [`Error::created_handle`]) so the caller can decide to destroy it.
#[cfg(target_os = "freebsd")]
pub fn new_with(opts: &JailOptions) -> Result<VjHandle> {
    let params = opts.params()?;
    let jid = ffi::jail_set(&params, JailFlags::CREATE | JailFlags::ATTACH)?;
    let vj = VjHandle::from_raw(jid);

    if let Err(e) = MarkerStore::default().write(vj, getpid().as_raw()) {
        return Err(match e {
            Error::Bookkeeping { path, source } => Error::MarkerWrite { jid, path, source },
            other => other,
        });
    }

    tracing::debug!(jid, "created and attached vnet jail");
    Ok(vj)
}

/// Attach the calling process to an existing vnet jail.
///
/// On success the caller's pid is appended to the jail's bookkeeping
/// marker (created if absent), so pid resolution keeps working for every
/// attached process.
#[cfg(target_os = "freebsd")]
pub fn set(vj: VjHandle) -> Result<()> {
    ffi::jail_attach(vj.as_raw())?;
    MarkerStore::default().append(vj, getpid().as_raw())?;
    tracing::debug!(jid = vj.as_raw(), "attached to vnet jail");
    Ok(())
}

/// Get a handle to the calling process's current vnet jail.
#[cfg(target_os = "freebsd")]
pub fn get() -> Result<VjHandle> {
    get_from_pid(getpid().as_raw())
}

/// Get a handle to the vnet jail a given pid is attached to.
///
/// Scans the bookkeeping markers for one bound to `pid`. A process with no
/// binding resolves to [`Error::NotFound`]; markers created out-of-band
/// are never fabricated.
#[cfg(target_os = "freebsd")]
pub fn get_from_pid(pid: i32) -> Result<VjHandle> {
    let path = MarkerStore::default().find_by_pid(pid)?;
    marker::jid_from_path(&path)
}

/// Parse a bookkeeping path into a jail handle.
///
/// The jid is the trailing decimal run of the path, e.g.
/// `/var/run/netns/netns42` resolves to jid 42.
pub fn get_from_path(path: impl AsRef<Path>) -> Result<VjHandle> {
    marker::jid_from_path(path.as_ref())
}

/// Named jails are not supported on this platform family.
pub fn new_named(_name: &str) -> Result<VjHandle> {
    Err(Error::NotImplemented)
}

/// Named jails are not supported on this platform family.
pub fn get_from_name(_name: &str) -> Result<VjHandle> {
    Err(Error::NotImplemented)
}

/// Named jails are not supported on this platform family.
pub fn delete_named(_name: &str) -> Result<()> {
    Err(Error::NotImplemented)
}

/// Per-thread jail membership cannot be queried on this platform family.
pub fn get_from_thread(_pid: i32, _tid: i32) -> Result<VjHandle> {
    Err(Error::NotImplemented)
}

#[cfg(not(target_os = "freebsd"))]
pub fn new() -> Result<VjHandle> {
    Err(Error::NotImplemented)
}

#[cfg(not(target_os = "freebsd"))]
pub fn new_with(_opts: &JailOptions) -> Result<VjHandle> {
    Err(Error::NotImplemented)
}

#[cfg(not(target_os = "freebsd"))]
pub fn set(_vj: VjHandle) -> Result<()> {
    Err(Error::NotImplemented)
}

#[cfg(not(target_os = "freebsd"))]
pub fn get() -> Result<VjHandle> {
    Err(Error::NotImplemented)
}

#[cfg(not(target_os = "freebsd"))]
pub fn get_from_pid(_pid: i32) -> Result<VjHandle> {
    Err(Error::NotImplemented)
}

/// Iterator over all running jails, in jid order.
#[cfg(target_os = "freebsd")]
pub struct RunningJails {
    lastjid: i32,
}

#[cfg(target_os = "freebsd")]
impl RunningJails {
    pub fn new() -> Self {
        Self { lastjid: 0 }
    }
}

#[cfg(target_os = "freebsd")]
impl Default for RunningJails {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "freebsd")]
impl Iterator for RunningJails {
    type Item = VjHandle;

    fn next(&mut self) -> Option<Self::Item> {
        match ffi::jail_nextjid(self.lastjid) {
            Ok(jid) => {
                self.lastjid = jid;
                Some(VjHandle::from_raw(jid))
            }
            Err(_) => None,
        }
    }
}
