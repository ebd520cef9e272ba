//! On-disk bookkeeping for jail membership
//!
//! Every live vnet jail owns one marker file under a well-known directory,
//! named `netns<jid>` and holding the attached process ids, one per line.
//! Resolution by pid scans marker contents; resolution by path parses the
//! trailing jail id out of the marker name. A missing marker means the
//! jail either does not exist or was created out-of-band; resolution then
//! fails instead of fabricating a handle.

use crate::error::{Error, Result};
use crate::handle::VjHandle;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Conventional marker directory for vnet jails
pub const RUN_DIR: &str = "/var/run/netns";

/// Marker store rooted at a bookkeeping directory.
///
/// [`MarkerStore::default`] uses [`RUN_DIR`]; a custom root is mainly for
/// tests.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    root: PathBuf,
}

impl Default for MarkerStore {
    fn default() -> Self {
        Self::new(RUN_DIR)
    }
}

impl MarkerStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Marker path for a jail, e.g. `/var/run/netns/netns42`.
    pub fn path_for(&self, vj: VjHandle) -> PathBuf {
        self.root.join(format!("netns{}", vj.as_raw()))
    }

    /// Write a fresh marker binding `vj` to `pid`.
    ///
    /// The marker is created exclusively; a second create for the same jid
    /// fails, which keeps the one-marker-per-live-jail invariant.
    pub fn write(&self, vj: VjHandle, pid: i32) -> Result<()> {
        let path = self.path_for(vj);
        fs::create_dir_all(&self.root).map_err(|e| Error::Bookkeeping {
            path: self.root.clone(),
            source: e,
        })?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| Error::Bookkeeping {
                path: path.clone(),
                source: e,
            })?;
        writeln!(file, "{pid}").map_err(|e| Error::Bookkeeping { path, source: e })?;
        Ok(())
    }

    /// Append `pid` to the marker for `vj`, creating the marker if absent.
    ///
    /// Used when an existing jail gains another attached process.
    pub fn append(&self, vj: VjHandle, pid: i32) -> Result<()> {
        let path = self.path_for(vj);
        fs::create_dir_all(&self.root).map_err(|e| Error::Bookkeeping {
            path: self.root.clone(),
            source: e,
        })?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::Bookkeeping {
                path: path.clone(),
                source: e,
            })?;
        writeln!(file, "{pid}").map_err(|e| Error::Bookkeeping { path, source: e })?;
        Ok(())
    }

    /// Remove the marker for `vj`.
    pub fn remove(&self, vj: VjHandle) -> Result<()> {
        let path = self.path_for(vj);
        fs::remove_file(&path).map_err(|e| Error::Bookkeeping { path, source: e })
    }

    /// Find the marker bound to `pid`.
    ///
    /// Scans the bookkeeping directory one level deep; subdirectories are
    /// skipped, never entered. Read errors propagate as scan failures
    /// rather than being treated as "no match". If more than one marker
    /// claims the same pid, whichever the directory yields first wins;
    /// entry order is unspecified.
    pub fn find_by_pid(&self, pid: i32) -> Result<PathBuf> {
        let entries = fs::read_dir(&self.root).map_err(|e| Error::Bookkeeping {
            path: self.root.clone(),
            source: e,
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| Error::Bookkeeping {
                path: self.root.clone(),
                source: e,
            })?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| Error::Bookkeeping {
                path: path.clone(),
                source: e,
            })?;
            if file_type.is_dir() {
                continue;
            }
            if marker_binds_pid(&path, pid)? {
                return Ok(path);
            }
        }

        Err(Error::NotFound(pid))
    }
}

/// Check whether any line of a marker file is exactly `pid`.
fn marker_binds_pid(path: &Path, pid: i32) -> Result<bool> {
    let file = File::open(path).map_err(|e| Error::Bookkeeping {
        path: path.to_path_buf(),
        source: e,
    })?;
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::Bookkeeping {
            path: path.to_path_buf(),
            source: e,
        })?;
        if let Ok(bound) = line.trim().parse::<i32>() {
            if bound == pid {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Parse the trailing decimal run of a path into a jail handle.
///
/// `/var/run/netns/netns42` resolves to jid 42. A path with no trailing
/// integer, or one whose digits overflow an `i32`, is malformed.
pub(crate) fn jid_from_path(path: &Path) -> Result<VjHandle> {
    let text = path.as_os_str().to_string_lossy().into_owned();
    let prefix = text.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let digits = &text[prefix..];
    if digits.is_empty() {
        return Err(Error::MalformedPath(text));
    }
    let jid = digits
        .parse::<i32>()
        .map_err(|_| Error::MalformedPath(text.clone()))?;
    Ok(VjHandle::from_raw(jid))
}

/// Stat a marker and return its (device, inode) pair.
pub(crate) fn stat_marker(path: &Path) -> Option<(u64, u64)> {
    let st = nix::sys::stat::stat(path).ok()?;
    Some((st.st_dev as u64, st.st_ino as u64))
}

/// Whether two paths resolve to the same underlying storage object.
///
/// Compares (device, inode); any stat failure means the identity cannot
/// be proven and yields `false`.
pub(crate) fn same_storage_object(a: &Path, b: &Path) -> bool {
    match (stat_marker(a), stat_marker(b)) {
        (Some(sa), Some(sb)) => sa == sb,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, MarkerStore) {
        let dir = TempDir::new().unwrap();
        let store = MarkerStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_write_and_find_by_pid() {
        let (_dir, store) = store();
        store.write(VjHandle::from_raw(42), 100).unwrap();

        let path = store.find_by_pid(100).unwrap();
        assert!(path.ends_with("netns42"));
        assert_eq!(jid_from_path(&path).unwrap(), VjHandle::from_raw(42));
    }

    #[test]
    fn test_find_by_pid_without_binding() {
        let (_dir, store) = store();
        store.write(VjHandle::from_raw(42), 100).unwrap();

        assert!(matches!(store.find_by_pid(999), Err(Error::NotFound(999))));
    }

    #[test]
    fn test_write_is_exclusive() {
        let (_dir, store) = store();
        store.write(VjHandle::from_raw(7), 100).unwrap();
        assert!(store.write(VjHandle::from_raw(7), 200).is_err());
    }

    #[test]
    fn test_append_records_second_pid() {
        let (_dir, store) = store();
        store.write(VjHandle::from_raw(7), 100).unwrap();
        store.append(VjHandle::from_raw(7), 200).unwrap();

        assert!(store.find_by_pid(100).unwrap().ends_with("netns7"));
        assert!(store.find_by_pid(200).unwrap().ends_with("netns7"));
    }

    #[test]
    fn test_remove_unbinds() {
        let (_dir, store) = store();
        let vj = VjHandle::from_raw(42);
        store.write(vj, 100).unwrap();
        store.remove(vj).unwrap();

        assert!(matches!(store.find_by_pid(100), Err(Error::NotFound(100))));
    }

    #[test]
    fn test_scan_skips_subdirectories() {
        let (dir, store) = store();
        let sub = dir.path().join("stale");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("netns9"), "100\n").unwrap();

        assert!(matches!(store.find_by_pid(100), Err(Error::NotFound(100))));
    }

    #[test]
    fn test_scan_failure_propagates() {
        let store = MarkerStore::new("/nonexistent/vjail-test");
        assert!(matches!(
            store.find_by_pid(100),
            Err(Error::Bookkeeping { .. })
        ));
    }

    #[test]
    fn test_jid_from_path() {
        let jid = |s: &str| jid_from_path(Path::new(s));

        assert_eq!(jid("netns42").unwrap(), VjHandle::from_raw(42));
        assert_eq!(jid("/var/run/netns/netns7").unwrap(), VjHandle::from_raw(7));
        assert!(matches!(
            jid("/proc/7/status"),
            Err(Error::MalformedPath(_))
        ));
        assert!(matches!(jid("netns"), Err(Error::MalformedPath(_))));
        assert!(matches!(
            jid("netns99999999999999"),
            Err(Error::MalformedPath(_))
        ));
    }

    #[test]
    fn test_same_storage_object() {
        let (dir, store) = store();
        store.write(VjHandle::from_raw(1), 100).unwrap();
        store.write(VjHandle::from_raw(2), 200).unwrap();

        let one = store.path_for(VjHandle::from_raw(1));
        let two = store.path_for(VjHandle::from_raw(2));
        assert!(same_storage_object(&one, &one));
        assert!(!same_storage_object(&one, &two));

        // A hard link aliases the same inode under a different jid.
        let alias = dir.path().join("netns3");
        fs::hard_link(&one, &alias).unwrap();
        assert!(same_storage_object(&one, &alias));

        assert!(!same_storage_object(&one, Path::new("/nonexistent")));
    }
}
