//! Jail parameter types and kernel-buffer encoding
//!
//! `jail_set(2)` takes its configuration as a flat iovec array: for each
//! parameter one segment holds the NUL-terminated key and the next holds
//! the value bytes. The kernel matches keys by name, but within a pair the
//! protocol is positional, so encoding must keep key and value adjacent
//! and must not reorder the list.

use crate::error::{Error, Result};
use byteorder::{NativeEndian, WriteBytesExt};
use std::ffi::CString;

/// Jail parameter value types
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Integer value (maps to C int, native endianness)
    Int(i32),
    /// Boolean value (stored as int: 0 or 1)
    Bool(bool),
    /// String value (NUL-terminated on encoding)
    String(String),
    /// Presence-only parameter such as `persist` (zero-length value)
    Flag,
}

impl ParamValue {
    /// Convert the parameter value to bytes for FFI.
    ///
    /// Returns `None` for [`ParamValue::Flag`], which is encoded as a
    /// zero-length iovec with a null base pointer.
    pub fn as_bytes(&self) -> Result<Option<Vec<u8>>> {
        match self {
            ParamValue::Int(v) => {
                let mut buf = Vec::with_capacity(4);
                buf.write_i32::<NativeEndian>(*v).map_err(Error::Io)?;
                Ok(Some(buf))
            }
            ParamValue::Bool(b) => {
                let v = if *b { 1i32 } else { 0i32 };
                let mut buf = Vec::with_capacity(4);
                buf.write_i32::<NativeEndian>(v).map_err(Error::Io)?;
                Ok(Some(buf))
            }
            ParamValue::String(s) => {
                let cstring = CString::new(s.clone())?;
                Ok(Some(cstring.into_bytes_with_nul()))
            }
            ParamValue::Flag => Ok(None),
        }
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

/// One encoded parameter: the NUL-terminated key bytes and the value bytes.
///
/// `value` is `None` for presence-only parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedParam {
    pub key: Vec<u8>,
    pub value: Option<Vec<u8>>,
}

/// Ordered list of jail parameters.
///
/// Insertion order is preserved through encoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JailParams(Vec<(String, ParamValue)>);

impl JailParams {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a parameter to the list.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.push((key.into(), value.into()));
    }

    /// Append a presence-only parameter such as `persist`.
    pub fn push_flag(&mut self, key: impl Into<String>) {
        self.0.push((key.into(), ParamValue::Flag));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ParamValue)> {
        self.0.iter()
    }

    /// Encode every parameter into kernel-ready byte segments.
    ///
    /// All-or-nothing: the first failing parameter aborts the encoding and
    /// no partial buffer is returned.
    pub fn encode(&self) -> Result<Vec<EncodedParam>> {
        self.0
            .iter()
            .map(|(key, value)| {
                Ok(EncodedParam {
                    key: CString::new(key.clone())?.into_bytes_with_nul(),
                    value: value.as_bytes()?,
                })
            })
            .collect()
    }

    /// Build a parameter list from a TOML table.
    ///
    /// Integers, booleans and strings map onto [`ParamValue`]; any other
    /// TOML type (float, datetime, array, table) has no jail parameter
    /// encoding and fails naming the offending key.
    pub fn from_toml(table: &toml::Table) -> Result<Self> {
        let mut params = JailParams::new();
        for (key, value) in table.iter() {
            let value = match value {
                toml::Value::Integer(i) => {
                    let v = i32::try_from(*i)
                        .map_err(|_| Error::UnsupportedParam(key.clone()))?;
                    ParamValue::Int(v)
                }
                toml::Value::Boolean(b) => ParamValue::Bool(*b),
                toml::Value::String(s) => ParamValue::String(s.clone()),
                _ => return Err(Error::UnsupportedParam(key.clone())),
            };
            params.push(key.clone(), value);
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_preserves_order() {
        let mut params = JailParams::new();
        params.push("path", "/");
        params.push("vnet", 1);
        params.push("children.max", 99);
        params.push_flag("persist");

        let encoded = params.encode().unwrap();
        assert_eq!(encoded.len(), 4);
        assert_eq!(encoded[0].key, b"path\0");
        assert_eq!(encoded[1].key, b"vnet\0");
        assert_eq!(encoded[2].key, b"children.max\0");
        assert_eq!(encoded[3].key, b"persist\0");
    }

    #[test]
    fn test_encode_string_nul_terminated() {
        let mut params = JailParams::new();
        params.push("path", "/");
        let encoded = params.encode().unwrap();
        assert_eq!(encoded[0].value.as_deref(), Some(&b"/\0"[..]));
    }

    #[test]
    fn test_encode_int_native_endian() {
        let mut params = JailParams::new();
        params.push("children.max", 99);
        let encoded = params.encode().unwrap();
        assert_eq!(encoded[0].value.as_deref(), Some(&99i32.to_ne_bytes()[..]));
    }

    #[test]
    fn test_encode_bool_as_int() {
        assert_eq!(
            ParamValue::Bool(true).as_bytes().unwrap().as_deref(),
            Some(&1i32.to_ne_bytes()[..])
        );
        assert_eq!(
            ParamValue::Bool(false).as_bytes().unwrap().as_deref(),
            Some(&0i32.to_ne_bytes()[..])
        );
    }

    #[test]
    fn test_encode_flag_has_no_value() {
        let mut params = JailParams::new();
        params.push_flag("persist");
        let encoded = params.encode().unwrap();
        assert_eq!(encoded[0].value, None);
    }

    #[test]
    fn test_encode_interior_nul_fails() {
        let mut params = JailParams::new();
        params.push("host.hostname", "bad\0name");
        assert!(params.encode().is_err());
    }

    #[test]
    fn test_from_toml_maps_supported_kinds() {
        let table: toml::Table = toml::from_str(
            r#"
            path = "/"
            vnet = 1
            persist = true
            "#,
        )
        .unwrap();
        let params = JailParams::from_toml(&table).unwrap();
        assert_eq!(params.len(), 3);
        for (key, value) in params.iter() {
            match key.as_str() {
                "path" => assert_eq!(*value, ParamValue::String("/".into())),
                "vnet" => assert_eq!(*value, ParamValue::Int(1)),
                "persist" => assert_eq!(*value, ParamValue::Bool(true)),
                other => panic!("unexpected key {other}"),
            }
        }
    }

    #[test]
    fn test_from_toml_rejects_float_naming_key() {
        let table: toml::Table = toml::from_str(
            r#"
            path = "/"
            "children.max" = 1.5
            "#,
        )
        .unwrap();
        let err = JailParams::from_toml(&table).unwrap_err();
        match err {
            Error::UnsupportedParam(key) => assert_eq!(key, "children.max"),
            other => panic!("expected UnsupportedParam, got {other}"),
        }
    }

    #[test]
    fn test_from_toml_rejects_out_of_range_int() {
        let table: toml::Table = toml::from_str(r#""children.max" = 4294967296"#).unwrap();
        assert!(matches!(
            JailParams::from_toml(&table),
            Err(Error::UnsupportedParam(_))
        ));
    }
}
