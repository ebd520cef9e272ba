//! Jail creation options
//!
//! [`JailOptions`] is the typed configuration behind [`crate::vnet::new`].
//! The defaults match what a vnet jail needs: rooted at `/`, its own
//! network stack, room for child jails, and `persist` so the jail outlives
//! the creating process until explicitly destroyed.

use crate::error::{Error, Result};
use crate::params::JailParams;
use serde::Deserialize;
use std::path::PathBuf;

/// Configuration for a new vnet jail
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JailOptions {
    /// Root path of the jail filesystem
    pub path: PathBuf,
    /// Give the jail its own virtualized network stack
    pub vnet: bool,
    /// Maximum number of child jails
    pub children_max: i32,
    /// Keep the jail alive with no attached processes
    pub persist: bool,
}

impl Default for JailOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/"),
            vnet: true,
            children_max: 99,
            persist: true,
        }
    }
}

impl JailOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn vnet(mut self, vnet: bool) -> Self {
        self.vnet = vnet;
        self
    }

    pub fn children_max(mut self, max: i32) -> Self {
        self.children_max = max;
        self
    }

    pub fn persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Build the ordered parameter list for jail_set(2).
    ///
    /// `vnet` maps to the jailsys value 1 ("new instance"); `persist` is a
    /// presence-only flag and is omitted entirely when disabled.
    pub fn params(&self) -> Result<JailParams> {
        let path = self
            .path
            .to_str()
            .ok_or_else(|| Error::UnsupportedParam("path".to_string()))?;

        let mut params = JailParams::new();
        params.push("path", path);
        if self.vnet {
            params.push("vnet", 1);
        }
        params.push("children.max", self.children_max);
        if self.persist {
            params.push_flag("persist");
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn test_default_baseline_params() {
        let params = JailOptions::default().params().unwrap();
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["path", "vnet", "children.max", "persist"]);

        let values: Vec<&ParamValue> = params.iter().map(|(_, v)| v).collect();
        assert_eq!(*values[0], ParamValue::String("/".into()));
        assert_eq!(*values[1], ParamValue::Int(1));
        assert_eq!(*values[2], ParamValue::Int(99));
        assert_eq!(*values[3], ParamValue::Flag);
    }

    #[test]
    fn test_disabled_flags_are_omitted() {
        let opts = JailOptions::new().vnet(false).persist(false);
        let params = opts.params().unwrap();
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["path", "children.max"]);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let opts: JailOptions = toml::from_str(
            r#"
            path = "/jails/web"
            children_max = 10
            "#,
        )
        .unwrap();
        assert_eq!(opts.path, PathBuf::from("/jails/web"));
        assert_eq!(opts.children_max, 10);
        assert!(opts.vnet);
        assert!(opts.persist);
    }

    #[test]
    fn test_non_utf8_path_is_rejected() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let opts = JailOptions::new().path(PathBuf::from(OsString::from_vec(vec![0x2f, 0xff])));
        assert!(matches!(
            opts.params(),
            Err(Error::UnsupportedParam(_))
        ));
    }
}
