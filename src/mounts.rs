//! Mount table classification.
//!
//! Reads a `/proc/mounts` style table and splits mount points into remote,
//! special and local sets according to their filesystem type.

use crate::config::MountConfig;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Mount points grouped by filesystem kind, each list sorted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountTable {
    /// Network filesystems (nfs, cifs, autofs)
    pub remote: Vec<String>,
    /// Pseudo filesystems (proc, sysfs, tmpfs)
    pub special: Vec<String>,
    /// Disk-backed filesystems
    pub local: Vec<String>,
}

impl MountTable {
    /// Read and classify the mount table named in `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the table file cannot be read.
    pub fn load(config: &MountConfig) -> Result<Self> {
        let content = std::fs::read_to_string(&config.table)
            .with_context(|| format!("Failed to read mount table: {}", config.table.display()))?;
        let table = Self::classify(&parse_mounts(&content), config);
        debug!(
            remote = table.remote.len(),
            special = table.special.len(),
            local = table.local.len(),
            "Mount table classified"
        );
        Ok(table)
    }

    /// Split parsed mounts by the filesystem type lists in `config`
    #[must_use]
    pub fn classify(mounts: &BTreeMap<String, String>, config: &MountConfig) -> Self {
        Self {
            remote: select(mounts, &config.remote_fs),
            special: select(mounts, &config.special_fs),
            local: select(mounts, &config.local_fs),
        }
    }

    /// Mount points that must not be walked (remote and special)
    pub fn ignored(&self) -> impl Iterator<Item = &str> {
        self.remote
            .iter()
            .chain(self.special.iter())
            .map(String::as_str)
    }
}

/// Map mount point to filesystem type.
///
/// Lines with fewer than three space-separated fields are skipped. A mount
/// point listed twice keeps its last type, matching what is visible.
#[must_use]
pub fn parse_mounts(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split(' ');
            let _device = fields.next()?;
            let mount_point = fields.next()?;
            let fs_type = fields.next()?;
            Some((unescape(mount_point), fs_type.to_string()))
        })
        .collect()
}

/// Decode the octal escapes the kernel uses for blanks in mount points
fn unescape(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_string();
    }

    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let octal = bytes.get(i + 1..i + 4);
        if bytes[i] == b'\\'
            && let Some(digits) = octal
            && digits.iter().all(|d| (b'0'..=b'7').contains(d))
        {
            let code = digits.iter().fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
            out.push(u8::try_from(code).unwrap_or(b'?'));
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Sorted mount points whose type is in `types`
fn select(mounts: &BTreeMap<String, String>, types: &[String]) -> Vec<String> {
    mounts
        .iter()
        .filter(|(_, fs)| types.iter().any(|t| t == *fs))
        .map(|(path, _)| path.clone())
        .collect()
}
