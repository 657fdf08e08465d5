use crate::config::Config;
use crate::mounts::MountTable;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Absolute paths the walk never enters or reports.
///
/// Built once before the scan and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    /// Paths without trailing slash
    paths: HashSet<String>,
}

impl IgnoreSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble the ignore set for a scan: the running binary, remote and
    /// special mount points, and configured extra paths
    #[must_use]
    pub fn for_scan(config: &Config, mounts: &MountTable, own_binary: Option<&Path>) -> Self {
        let mut set = Self::new();

        if let Some(binary) = own_binary {
            set.insert_path(binary);
        }
        for mount in mounts.ignored() {
            set.insert(mount);
        }
        for path in &config.scan.ignore {
            set.insert_path(path);
        }

        set
    }

    /// Add a path; a trailing slash is dropped so lookups match walk names
    pub fn insert(&mut self, path: &str) {
        let trimmed = path.trim_end_matches('/');
        let key = if trimmed.is_empty() { "/" } else { trimmed };
        self.paths.insert(key.to_string());
    }

    /// Add a filesystem path, skipping ones that are not valid UTF-8
    pub fn insert_path(&mut self, path: &Path) {
        match path.to_str() {
            Some(path) => self.insert(path),
            None => warn!(path = %path.display(), "Ignore path is not valid UTF-8, dropping"),
        }
    }

    /// Whether `path` is ignored
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

impl<S: AsRef<str>> FromIterator<S> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for path in iter {
            set.insert(path.as_ref());
        }
        set
    }
}
