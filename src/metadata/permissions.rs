/// Setuid bit in a raw `st_mode`
const S_ISUID: u32 = 0o4000;
/// Setgid bit in a raw `st_mode`
const S_ISGID: u32 = 0o2000;
/// Sticky bit in a raw `st_mode`
const S_ISVTX: u32 = 0o1000;

/// Permission bits of a path as reported in the audit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePermissions {
    mode: u32,
}

impl FilePermissions {
    /// Create permissions from a raw `st_mode` value
    #[must_use]
    pub const fn from_mode(mode: u32) -> Self {
        Self { mode }
    }

    /// Whether the sticky bit is set
    #[must_use]
    pub const fn is_sticky(&self) -> bool {
        self.mode & S_ISVTX != 0
    }

    /// Whether the setuid bit is set
    #[must_use]
    pub const fn is_setuid(&self) -> bool {
        self.mode & S_ISUID != 0
    }

    /// Whether the setgid bit is set
    #[must_use]
    pub const fn is_setgid(&self) -> bool {
        self.mode & S_ISGID != 0
    }

    /// Permission value in report layout.
    ///
    /// The low nine bits are copied as is. Sticky is reported as `01000`,
    /// setuid as `02000` and setgid as `04000`, so `0o4222` (setuid) reads
    /// `"2222"` and sticky plus setgid on `0o555` reads `"5555"`.
    #[must_use]
    pub const fn report_bits(&self) -> u32 {
        let mut bits = self.mode & 0o777;
        if self.is_sticky() {
            bits |= 0o1000;
        }
        if self.is_setuid() {
            bits |= 0o2000;
        }
        if self.is_setgid() {
            bits |= 0o4000;
        }
        bits
    }

    /// Octal string of [`Self::report_bits`], zero-padded to three digits
    #[must_use]
    pub fn to_report_string(&self) -> String {
        format!("{:03o}", self.report_bits())
    }
}
