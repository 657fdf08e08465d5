//! Numeric uid/gid to name resolution.

use crate::errors::AuditError;
use anyhow::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::CStr;

/// Upper bound for the lookup buffer; glibc asks for more via `ERANGE`
const MAX_BUFFER: usize = 1 << 20;

/// Resolves numeric ids to user and group names
pub trait NameLookup {
    /// User name for `uid`, `None` if it has no passwd entry
    fn user_name(&self, uid: u32) -> Option<String>;

    /// Group name for `gid`, `None` if it has no group entry
    fn group_name(&self, gid: u32) -> Option<String>;

    /// User name for `uid`, failing if unresolvable
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::UnresolvableIdentity`] if there is no entry.
    fn require_user(&self, uid: u32) -> Result<String> {
        self.user_name(uid).ok_or_else(|| {
            AuditError::UnresolvableIdentity {
                kind: "user",
                id: uid,
            }
            .into()
        })
    }

    /// Group name for `gid`, failing if unresolvable
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::UnresolvableIdentity`] if there is no entry.
    fn require_group(&self, gid: u32) -> Result<String> {
        self.group_name(gid).ok_or_else(|| {
            AuditError::UnresolvableIdentity {
                kind: "group",
                id: gid,
            }
            .into()
        })
    }
}

/// Lookup through the C library's passwd and group databases (NSS aware)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLookup;

impl NameLookup for SystemLookup {
    fn user_name(&self, uid: u32) -> Option<String> {
        let mut buf = vec![0 as libc::c_char; 1024];
        loop {
            // SAFETY: passwd is plain data; all pointers refer to live locals
            let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
            let mut result: *mut libc::passwd = std::ptr::null_mut();
            let rc = unsafe {
                libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result)
            };

            if rc == libc::ERANGE && buf.len() < MAX_BUFFER {
                buf.resize(buf.len() * 2, 0);
                continue;
            }
            if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
                return None;
            }
            // SAFETY: on success pw_name points into `buf` and is NUL terminated
            let name = unsafe { CStr::from_ptr(pwd.pw_name) };
            return Some(name.to_string_lossy().into_owned());
        }
    }

    fn group_name(&self, gid: u32) -> Option<String> {
        let mut buf = vec![0 as libc::c_char; 1024];
        loop {
            // SAFETY: group is plain data; all pointers refer to live locals
            let mut grp: libc::group = unsafe { std::mem::zeroed() };
            let mut result: *mut libc::group = std::ptr::null_mut();
            let rc = unsafe {
                libc::getgrgid_r(gid, &mut grp, buf.as_mut_ptr(), buf.len(), &mut result)
            };

            if rc == libc::ERANGE && buf.len() < MAX_BUFFER {
                buf.resize(buf.len() * 2, 0);
                continue;
            }
            if rc != 0 || result.is_null() || grp.gr_name.is_null() {
                return None;
            }
            // SAFETY: on success gr_name points into `buf` and is NUL terminated
            let name = unsafe { CStr::from_ptr(grp.gr_name) };
            return Some(name.to_string_lossy().into_owned());
        }
    }
}

/// Memoizes another lookup; most files share a handful of owners
#[derive(Debug, Default)]
pub struct CachedLookup<N: NameLookup> {
    inner: N,
    users: RefCell<HashMap<u32, Option<String>>>,
    groups: RefCell<HashMap<u32, Option<String>>>,
}

impl<N: NameLookup> CachedLookup<N> {
    /// Wrap `inner`
    pub fn new(inner: N) -> Self {
        Self {
            inner,
            users: RefCell::new(HashMap::new()),
            groups: RefCell::new(HashMap::new()),
        }
    }
}

impl<N: NameLookup> NameLookup for CachedLookup<N> {
    fn user_name(&self, uid: u32) -> Option<String> {
        self.users
            .borrow_mut()
            .entry(uid)
            .or_insert_with(|| self.inner.user_name(uid))
            .clone()
    }

    fn group_name(&self, gid: u32) -> Option<String> {
        self.groups
            .borrow_mut()
            .entry(gid)
            .or_insert_with(|| self.inner.group_name(gid))
            .clone()
    }
}
