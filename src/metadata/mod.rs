//! Metadata extraction for unmanaged records.
//!
//! Fills in owner, group, permission string and size information. For
//! unmanaged directories the size and the file and directory counts cover
//! the whole subtree, skipping ignored paths.

pub mod owner;
pub mod permissions;

pub use owner::{CachedLookup, NameLookup, SystemLookup};
pub use permissions::FilePermissions;

use crate::errors::AuditError;
use crate::output::{FileType, UnmanagedRecord};
use crate::scanner::{DirLister, IgnoreSet, NodeKind};
use anyhow::Result;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use tracing::{Level, debug, span, warn};

/// Aggregate of a directory subtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirInfo {
    /// Summed size of every non-directory, non-symlink entry
    pub size: u64,
    /// Number of non-directory entries
    pub files: u64,
    /// Number of directories
    pub dirs: u64,
}

/// Adds metadata to unmanaged records
pub struct Enricher<'a, L: DirLister, N: NameLookup> {
    /// Directory reader for subtree aggregation
    lister: &'a L,
    /// Owner and group name resolution
    lookup: &'a N,
    /// Paths not descended into while aggregating
    ignore: &'a IgnoreSet,
}

impl<'a, L: DirLister, N: NameLookup> Enricher<'a, L, N> {
    /// Create an enricher over the given collaborators
    #[must_use]
    pub const fn new(lister: &'a L, lookup: &'a N, ignore: &'a IgnoreSet) -> Self {
        Self {
            lister,
            lookup,
            ignore,
        }
    }

    /// Fill in all metadata of `record`.
    ///
    /// Links only get owner and group. Every other type gets a mode, files
    /// and directories additionally get sizes.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Vanished`] if the path can no longer be
    /// stat'ed; the walk saw it moments ago, so this is not skipped.
    pub fn enrich(&self, record: &mut UnmanagedRecord) -> Result<()> {
        let span = span!(Level::DEBUG, "enrich", path = %record.name);
        let _guard = span.enter();

        if record.file_type != FileType::Link {
            let path = Path::new(&record.name);
            let meta = fs::metadata(path).map_err(|source| AuditError::Vanished {
                path: path.to_path_buf(),
                source,
            })?;

            record.mode = Some(FilePermissions::from_mode(meta.mode()).to_report_string());
            self.apply_size(record, meta.len());
        }

        self.apply_owner(record)
    }

    /// Set size fields according to the record type: files get `size`,
    /// directories get the subtree aggregate, links and remote mounts get
    /// nothing
    pub fn apply_size(&self, record: &mut UnmanagedRecord, size: u64) {
        match record.file_type {
            FileType::File => record.size = Some(size),
            FileType::Dir => {
                let info = self.dir_info(&record.name);
                record.size = Some(info.size);
                record.files = Some(info.files);
                record.dirs = Some(info.dirs);
            }
            FileType::Link | FileType::RemoteDir => {}
        }
    }

    /// Resolve owner and group of the path itself (symlinks not followed).
    /// Ids without a name are reported numerically.
    fn apply_owner(&self, record: &mut UnmanagedRecord) -> Result<()> {
        let path = Path::new(&record.name);
        let meta = fs::symlink_metadata(path).map_err(|source| AuditError::Vanished {
            path: path.to_path_buf(),
            source,
        })?;

        let (uid, gid) = (meta.uid(), meta.gid());
        record.user = Some(self.lookup.user_name(uid).unwrap_or_else(|| {
            debug!(uid, "No user name, reporting id");
            uid.to_string()
        }));
        record.group = Some(self.lookup.group_name(gid).unwrap_or_else(|| {
            debug!(gid, "No group name, reporting id");
            gid.to_string()
        }));
        Ok(())
    }

    /// Aggregate size and counts below `dir` (which ends with `/`)
    #[must_use]
    pub fn dir_info(&self, dir: &str) -> DirInfo {
        let entries = match self.lister.list(Path::new(dir)) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir, error = %e, "Cannot list directory while sizing, counting as empty");
                return DirInfo::default();
            }
        };

        let mut info = DirInfo::default();
        for entry in entries {
            match entry.kind {
                NodeKind::Dir => {
                    info.dirs += 1;
                    let child = format!("{dir}{}", entry.name.to_string_lossy());
                    if !self.ignore.contains(&child) {
                        let sub = self.dir_info(&format!("{child}/"));
                        info.size += sub.size;
                        info.files += sub.files;
                        info.dirs += sub.dirs;
                    }
                }
                NodeKind::Symlink => info.files += 1,
                NodeKind::File | NodeKind::Special => {
                    info.files += 1;
                    info.size += entry.size;
                }
            }
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{FsLister, ListedEntry};
    use std::collections::HashMap;
    use std::io;
    use tempfile::TempDir;

    struct FixedLookup;

    impl NameLookup for FixedLookup {
        fn user_name(&self, uid: u32) -> Option<String> {
            (uid == 0).then(|| "root".to_string())
        }

        fn group_name(&self, _gid: u32) -> Option<String> {
            None
        }
    }

    #[derive(Default)]
    struct FakeLister {
        dirs: HashMap<String, Vec<ListedEntry>>,
    }

    impl DirLister for FakeLister {
        fn list(&self, dir: &Path) -> io::Result<Vec<ListedEntry>> {
            self.dirs
                .get(dir.to_string_lossy().as_ref())
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }
    }

    #[test]
    fn test_link_never_gets_size() {
        let ignore = IgnoreSet::new();
        let lister = FakeLister::default();
        let enricher = Enricher::new(&lister, &FixedLookup, &ignore);

        let mut record = UnmanagedRecord::new("/etc/link", FileType::Link);
        enricher.apply_size(&mut record, 0);
        assert_eq!(record.size, None);

        let mut record = UnmanagedRecord::new("/etc/file", FileType::File);
        enricher.apply_size(&mut record, 0);
        assert_eq!(record.size, Some(0));
    }

    #[test]
    fn test_dir_info_aggregates_and_respects_ignore() {
        let mut lister = FakeLister::default();
        lister.dirs.insert(
            "/srv/".to_string(),
            vec![
                ListedEntry::new("a", NodeKind::File).with_size(10),
                ListedEntry::new("l", NodeKind::Symlink).with_size(99),
                ListedEntry::new("sub", NodeKind::Dir).with_size(4096),
                ListedEntry::new("mnt", NodeKind::Dir).with_size(4096),
            ],
        );
        lister.dirs.insert(
            "/srv/sub/".to_string(),
            vec![
                ListedEntry::new("b", NodeKind::File).with_size(5),
                ListedEntry::new("deeper", NodeKind::Dir),
            ],
        );
        lister.dirs.insert("/srv/sub/deeper/".to_string(), Vec::new());
        lister.dirs.insert(
            "/srv/mnt/".to_string(),
            vec![ListedEntry::new("huge", NodeKind::File).with_size(1 << 40)],
        );

        let ignore: IgnoreSet = ["/srv/mnt"].into_iter().collect();
        let enricher = Enricher::new(&lister, &FixedLookup, &ignore);

        assert_eq!(
            enricher.dir_info("/srv/"),
            DirInfo {
                size: 15,
                files: 3,
                dirs: 3,
            }
        );
    }

    #[test]
    fn test_enrich_real_paths() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new()?;
        let root = temp.path();
        let dir = root.join("data");
        fs::create_dir(&dir)?;
        fs::write(dir.join("one"), "12345")?;
        fs::write(root.join("file"), "abc")?;
        fs::set_permissions(root.join("file"), fs::Permissions::from_mode(0o640))?;
        std::os::unix::fs::symlink("/nonexistent", root.join("dangling"))?;

        let ignore = IgnoreSet::new();
        let enricher = Enricher::new(&FsLister, &FixedLookup, &ignore);

        let mut file = UnmanagedRecord::new(root.join("file").to_string_lossy(), FileType::File);
        enricher.enrich(&mut file)?;
        assert_eq!(file.mode.as_deref(), Some("640"));
        assert_eq!(file.size, Some(3));
        assert!(file.user.is_some());
        assert!(file.group.is_some());

        let mut data = UnmanagedRecord::new(format!("{}/", dir.display()), FileType::Dir);
        enricher.enrich(&mut data)?;
        assert_eq!(data.size, Some(5));
        assert_eq!(data.files, Some(1));
        assert_eq!(data.dirs, Some(0));

        // Dangling links are fine: links are never stat'ed through
        let mut link =
            UnmanagedRecord::new(root.join("dangling").to_string_lossy(), FileType::Link);
        enricher.enrich(&mut link)?;
        assert_eq!(link.mode, None);
        assert_eq!(link.size, None);
        assert!(link.user.is_some());
        Ok(())
    }

    #[test]
    fn test_remote_dir_gets_mode_and_owner_only() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new()?;
        let mount = temp.path().join("nfs");
        fs::create_dir(&mount)?;
        fs::write(mount.join("big"), vec![0u8; 2048])?;
        fs::set_permissions(&mount, fs::Permissions::from_mode(0o750))?;
        let meta = fs::symlink_metadata(&mount)?;

        let ignore = IgnoreSet::new();
        let enricher = Enricher::new(&FsLister, &FixedLookup, &ignore);

        let mut record = UnmanagedRecord::new(format!("{}/", mount.display()), FileType::RemoteDir);
        enricher.enrich(&mut record)?;

        assert_eq!(record.mode.as_deref(), Some("750"));
        assert_eq!(record.size, None);
        assert_eq!(record.files, None);
        assert_eq!(record.dirs, None);
        assert!(record.user.is_some());
        assert_eq!(record.group, Some(meta.gid().to_string()));
        Ok(())
    }

    #[test]
    fn test_vanished_path_is_fatal() {
        let ignore = IgnoreSet::new();
        let enricher = Enricher::new(&FsLister, &FixedLookup, &ignore);

        let mut record = UnmanagedRecord::new("/nonexistent/gone", FileType::File);
        let err = enricher.enrich(&mut record).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AuditError>(),
            Some(AuditError::Vanished { .. })
        ));
    }

    #[test]
    fn test_unresolved_ids_reported_numerically() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("f");
        fs::write(&path, "")?;
        let meta = fs::symlink_metadata(&path)?;

        let ignore = IgnoreSet::new();
        let enricher = Enricher::new(&FsLister, &FixedLookup, &ignore);
        let mut record = UnmanagedRecord::new(path.to_string_lossy(), FileType::File);
        enricher.enrich(&mut record)?;

        assert_eq!(record.group, Some(meta.gid().to_string()));
        Ok(())
    }
}
