use crate::manifest::ManagedSet;
use crate::output::FileType;
use crate::scanner::ignore::IgnoreSet;
use crate::scanner::lister::{DirLister, NodeKind};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Walks the live tree and classifies every entry against the managed set
pub struct UnmanagedScanner<'a, L: DirLister> {
    /// Directory reader
    lister: &'a L,
    /// Files and directories owned by packages
    managed: &'a ManagedSet,
    /// Paths never entered or reported
    ignore: &'a IgnoreSet,
}

impl<'a, L: DirLister> UnmanagedScanner<'a, L> {
    /// Create a scanner over the given collaborators
    #[must_use]
    pub const fn new(lister: &'a L, managed: &'a ManagedSet, ignore: &'a IgnoreSet) -> Self {
        Self {
            lister,
            managed,
            ignore,
        }
    }

    /// Classify everything below `root`.
    ///
    /// Returns unmanaged paths mapped to their type; directory names carry a
    /// trailing `/`. Managed directories are descended into, unmanaged ones
    /// are reported once as a whole and not entered.
    #[must_use]
    pub fn scan(&self, root: &str) -> BTreeMap<String, FileType> {
        let mut unmanaged = BTreeMap::new();
        let root = if root.ends_with('/') {
            root.to_string()
        } else {
            format!("{root}/")
        };
        self.scan_dir(&root, &mut unmanaged);
        unmanaged
    }

    /// One activation per directory; `dir` ends with `/`
    fn scan_dir(&self, dir: &str, unmanaged: &mut BTreeMap<String, FileType>) {
        let entries = match self.lister.list(Path::new(dir)) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir, error = %e, "Cannot list directory, treating as empty");
                return;
            }
        };

        for entry in entries {
            let Some(name) = entry.name.to_str() else {
                warn!(
                    path = %format!("{dir}{}", entry.name.to_string_lossy()),
                    "Path contains invalid UTF-8 characters. Skipping."
                );
                continue;
            };
            let file_name = format!("{dir}{name}");

            if self.ignore.contains(&file_name) {
                debug!(path = %file_name, "Ignored");
                continue;
            }

            match entry.kind {
                NodeKind::Dir => {
                    if self.managed.is_managed_dir(&file_name) {
                        self.scan_dir(&format!("{file_name}/"), unmanaged);
                    } else if !self.managed.has_managed_descendant(&file_name) {
                        unmanaged.insert(format!("{file_name}/"), FileType::Dir);
                    }
                    // Otherwise a managed directory lives below: neither
                    // report nor descend
                }
                _ if self.managed.is_managed_file(&file_name) => {}
                NodeKind::Special => {}
                NodeKind::Symlink => {
                    unmanaged.insert(file_name, FileType::Link);
                }
                NodeKind::File => {
                    unmanaged.insert(file_name, FileType::File);
                }
            }
        }
    }
}

/// Convenience wrapper: classify everything below `root`
#[must_use]
pub fn find_unmanaged_files<L: DirLister>(
    root: &str,
    lister: &L,
    managed: &ManagedSet,
    ignore: &IgnoreSet,
) -> BTreeMap<String, FileType> {
    UnmanagedScanner::new(lister, managed, ignore).scan(root)
}
