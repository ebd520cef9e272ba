//! Vnet jail handle type
//!
//! A [`VjHandle`] is the identity token for a vnet jail. It wraps the
//! kernel jail id and owns no kernel resource itself; the jail lives until
//! explicitly removed. Identity and display operations degrade to safe
//! defaults instead of failing, since they run in logging and comparison
//! contexts that must not abort the caller.

use crate::error::Result;
use crate::marker::{self, MarkerStore};
use std::fmt;

const NONE_JID: i32 = -1;

/// Handle to a vnet jail.
///
/// The empty handle carries jid `-1` and means "no jail / host".
#[derive(Debug, Clone, Copy)]
pub struct VjHandle(i32);

impl VjHandle {
    /// The canonical empty handle.
    pub const fn none() -> Self {
        VjHandle(NONE_JID)
    }

    /// Wrap an existing jail id.
    pub const fn from_raw(jid: i32) -> Self {
        VjHandle(jid)
    }

    /// The raw jail id, usable with the jail syscalls directly.
    pub const fn as_raw(self) -> i32 {
        self.0
    }

    /// True if this is not the empty handle.
    ///
    /// This is a static id check only; it does not verify that the kernel
    /// jail still exists.
    pub fn is_open(self) -> bool {
        self.0 != NONE_JID
    }

    /// A string uniquely identifying the jail via its bookkeeping marker,
    /// `"NS(none)"` when the marker cannot be stat'ed.
    pub fn unique_id(self) -> String {
        if !self.is_open() {
            return "NS(none)".to_string();
        }
        match marker::stat_marker(&MarkerStore::default().path_for(self)) {
            Some((dev, ino)) => format!("NS({dev}:{ino})"),
            None => "NS(none)".to_string(),
        }
    }

    /// Destroy the jail and its bookkeeping marker.
    ///
    /// Removes the kernel jail first; if that call fails nothing is
    /// touched, so the marker still resolves to the live jail. Marker
    /// removal failure is reported after the jail is already gone. Only
    /// when both steps succeed does the handle rebind to [`VjHandle::none`].
    ///
    /// Closing the empty handle is a no-op.
    ///
    /// Jail membership is a property of the OS thread; callers mixing
    /// `close` with [`crate::vnet::new`] or [`crate::vnet::set`] must stay
    /// on one pinned thread.
    pub fn close(&mut self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        self.remove_jail()?;
        MarkerStore::default().remove(*self)?;
        tracing::debug!(jid = self.0, "removed vnet jail");
        *self = VjHandle::none();
        Ok(())
    }

    #[cfg(target_os = "freebsd")]
    fn remove_jail(self) -> Result<()> {
        crate::ffi::jail_remove(self.0)
    }

    #[cfg(not(target_os = "freebsd"))]
    fn remove_jail(self) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }
}

impl Default for VjHandle {
    fn default() -> Self {
        VjHandle::none()
    }
}

/// Two handles are equal when they carry the same jid, or when their
/// bookkeeping markers resolve to the same storage object. The second leg
/// covers differently-valued handles aliasing one jail. Any stat failure
/// means equality cannot be proven and compares unequal.
impl PartialEq for VjHandle {
    fn eq(&self, other: &Self) -> bool {
        if self.0 == other.0 {
            return true;
        }
        let store = MarkerStore::default();
        marker::same_storage_object(&store.path_for(*self), &store.path_for(*other))
    }
}

impl fmt::Display for VjHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_open() {
            return write!(f, "NS(none)");
        }
        match marker::stat_marker(&MarkerStore::default().path_for(*self)) {
            Some((dev, ino)) => write!(f, "NS(jid {}: dev {}, ino {})", self.0, dev, ino),
            None => write!(f, "NS(jid {})", self.0),
        }
    }
}
