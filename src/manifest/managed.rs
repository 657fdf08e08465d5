//! Managed file and directory sets built from a package listing.

use crate::manifest::dir_trie::DirTrie;
use crate::manifest::entry::{EntryKind, ManifestEntry, parse_listing};
use anyhow::Result;
use std::collections::HashMap;
use tracing::debug;

/// Managed file path to symlink target (empty for regular files)
pub type ManagedFiles = HashMap<String, String>;

/// Managed directory path to "declared by a package" flag
pub type ManagedDirs = HashMap<String, bool>;

/// Everything the package manager accounts for, ready for lookups
#[derive(Debug, Clone, Default)]
pub struct ManagedSet {
    /// Managed files and symlinks
    files: ManagedFiles,
    /// Managed directories, explicit and implicit
    dirs: ManagedDirs,
    /// Component trie over `dirs` for descendant queries
    trie: DirTrie,
}

impl ManagedSet {
    /// Build the set from parsed entries and derive implicit directories
    #[must_use]
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ManifestEntry>,
    {
        let mut files = ManagedFiles::new();
        let mut dirs = ManagedDirs::new();

        for entry in entries {
            match entry.kind {
                EntryKind::File => {
                    files.insert(entry.path, String::new());
                }
                EntryKind::Dir => {
                    dirs.insert(entry.path, true);
                }
                EntryKind::Link => {
                    files.insert(entry.path, entry.link_target.unwrap_or_default());
                }
                EntryKind::Other(_) => {}
            }
        }

        Self::from_maps(files, dirs)
    }

    /// Parse a raw listing and build the set
    ///
    /// # Errors
    ///
    /// Returns an error if any listing line is malformed.
    pub fn from_listing<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::from_entries(parse_listing(lines)?))
    }

    /// Build the set from already populated maps, deriving implicit
    /// directories first
    #[must_use]
    pub fn from_maps(files: ManagedFiles, mut dirs: ManagedDirs) -> Self {
        derive_implicit(&mut dirs, &files);

        let mut trie = DirTrie::new();
        for dir in dirs.keys() {
            trie.insert(dir);
        }

        debug!(
            files = files.len(),
            dirs = dirs.len(),
            implicit = dirs.values().filter(|explicit| !**explicit).count(),
            "Managed set built"
        );

        Self { files, dirs, trie }
    }

    /// Whether `path` is a managed file or symlink
    #[inline]
    #[must_use]
    pub fn is_managed_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Whether `path` is a managed directory, explicit or implicit
    #[inline]
    #[must_use]
    pub fn is_managed_dir(&self, path: &str) -> bool {
        self.dirs.contains_key(path)
    }

    /// Whether some managed directory lives strictly below `dir`
    #[inline]
    #[must_use]
    pub fn has_managed_descendant(&self, dir: &str) -> bool {
        self.trie.has_descendant(dir)
    }
}

/// Add implicitly managed directories to `dirs`.
///
/// Every proper `/`-prefix of a managed file becomes an implicit directory,
/// and a symlink whose target is a managed directory is itself treated as
/// one. Explicit entries are never downgraded. Link resolution repeats until
/// nothing changes, so chains of links and input order do not matter and a
/// second call is a no-op.
pub fn derive_implicit(dirs: &mut ManagedDirs, files: &ManagedFiles) {
    for file in files.keys() {
        for (i, byte) in file.bytes().enumerate().skip(1) {
            if byte == b'/' {
                dirs.entry(file[..i].to_string()).or_insert(false);
            }
        }
    }

    loop {
        let mut changed = false;
        for (file, target) in files {
            if !target.is_empty() && !dirs.contains_key(file) && dirs.contains_key(target) {
                dirs.insert(file.clone(), false);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}
