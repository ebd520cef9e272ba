//! FFI bindings for FreeBSD jail syscalls
//!
//! This code is adapted from libjail-rs (https://github.com/fubarnetes/libjail-rs)
//! Original authors: Fabian Freyer <fabian.freyer@physik.tu-berlin.de>
//! License: BSD-3-Clause
//!
//! Copyright (c) 2018, Fabian Freyer <fabian.freyer@physik.tu-berlin.de>
//! All rights reserved.
//!
//! Redistribution and use in source and binary forms, with or without
//! modification, are permitted provided that the following conditions are met:
//!
//! 1. Redistributions of source code must retain the above copyright notice, this
//!    list of conditions and the following disclaimer.
//!
//! 2. Redistributions in binary form must reproduce the above copyright notice,
//!    this list of conditions and the following disclaimer in the documentation
//!    and/or other materials provided with the distribution.
//!
//! 3. Neither the name of the copyright holder nor the names of its
//!    contributors may be used to endorse or promote products derived from
//!    this software without specific prior written permission.

use crate::error::{Error, Result};
use crate::params::JailParams;
use bitflags::bitflags;
use std::ffi::CStr;
use std::io;
use std::mem;
use std::ptr;

/// Macro to construct iovec structures for jail syscalls
macro_rules! iovec {
    ($key:expr => ($value:expr, $size:expr)) => {
        vec![iovec!($key), iovec!($value, $size)]
    };
    ($key:expr => mut $value:expr) => {
        vec![iovec!($key), iovec!(mut $value)]
    };
    ($value:expr, $size:expr) => {
        libc::iovec {
            iov_base: $value as *mut libc::c_void,
            iov_len: $size,
        }
    };
    ($name:expr) => {
        iovec!($name.as_ptr(), $name.len())
    };
    (mut $name:expr) => {
        iovec!($name.as_mut_ptr(), $name.len())
    };
    () => {
        iovec!(ptr::null::<libc::c_void>(), 0)
    };
}

bitflags! {
    /// Flags for the jail_set and jail_get syscalls
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct JailFlags: i32 {
        /// Create the jail if it doesn't exist
        const CREATE = 0x01;
        /// Update parameters of existing jail
        const UPDATE = 0x02;
        /// Attach to jail upon creation
        const ATTACH = 0x04;
        /// Allow getting a dying jail
        const DYING = 0x08;
    }
}

/// Invoke jail_set(2) with an encoded parameter list.
///
/// The parameter pairs keep their list order in the iovec array; an
/// `errmsg` pair is appended so the kernel can report named failures.
/// Returns the jail ID (jid) on success.
pub fn jail_set(params: &JailParams, flags: JailFlags) -> Result<i32> {
    let encoded = params.encode()?;

    let mut errmsg = [0u8; 256];
    let mut jiov: Vec<libc::iovec> = Vec::with_capacity(encoded.len() * 2 + 2);
    for param in &encoded {
        jiov.push(iovec!(param.key));
        match &param.value {
            Some(value) => jiov.push(iovec!(value)),
            None => jiov.push(iovec!()),
        }
    }
    jiov.append(&mut iovec!(b"errmsg\0" => mut errmsg));

    let jid = unsafe { libc::jail_set(jiov[..].as_mut_ptr(), jiov.len() as u32, flags.bits()) };

    let err = unsafe { CStr::from_ptr(errmsg.as_ptr() as *const libc::c_char) }
        .to_string_lossy()
        .to_string();

    match jid {
        e if e < 0 => match errmsg[0] {
            0 => Err(Error::Io(io::Error::last_os_error())),
            _ => Err(Error::JailSet(err)),
        },
        _ => Ok(jid),
    }
}

/// Get the next jail ID after the given one.
///
/// Used to iterate through all running jails; start from `lastjid` 0.
pub fn jail_nextjid(lastjid: i32) -> Result<i32> {
    let mut errmsg = [0u8; 256];

    let mut jiov: Vec<libc::iovec> = vec![
        iovec!(b"lastjid\0" => (&lastjid as *const _, mem::size_of::<i32>())),
        iovec!(b"errmsg\0" => mut errmsg),
    ]
    .into_iter()
    .flatten()
    .collect();

    let jid = unsafe {
        libc::jail_get(
            jiov[..].as_mut_ptr(),
            jiov.len() as u32,
            JailFlags::empty().bits(),
        )
    };

    let err = unsafe { CStr::from_ptr(errmsg.as_ptr() as *const libc::c_char) }
        .to_string_lossy()
        .to_string();

    match jid {
        e if e < 0 => match errmsg[0] {
            0 => Err(Error::Io(io::Error::last_os_error())),
            _ => Err(Error::JailGet(err)),
        },
        _ => Ok(jid),
    }
}

/// Attach the current process to a jail.
///
/// After this call the calling OS thread's process runs inside the jail
/// context.
pub fn jail_attach(jid: i32) -> Result<()> {
    let ret = unsafe { libc::jail_attach(jid) };
    match ret {
        0 => Ok(()),
        _ => Err(Error::JailAttach {
            jid,
            source: io::Error::last_os_error(),
        }),
    }
}

/// Remove a jail by its ID.
///
/// This kills all processes in the jail and frees the jid.
pub fn jail_remove(jid: i32) -> Result<()> {
    let ret = unsafe { libc::jail_remove(jid) };
    match ret {
        0 => Ok(()),
        _ => Err(Error::JailRemove {
            jid,
            source: io::Error::last_os_error(),
        }),
    }
}
