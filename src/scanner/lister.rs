use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// What a directory entry is, judged without following symlinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Directory
    Dir,
    /// Regular file
    File,
    /// Symbolic link (never followed)
    Symlink,
    /// Socket, named pipe, block or character device
    Special,
}

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    /// File name, possibly not valid UTF-8
    pub name: OsString,
    /// Entry type from `lstat`
    pub kind: NodeKind,
    /// Size from `lstat`
    pub size: u64,
}

impl ListedEntry {
    /// Build an entry from a name and kind with zero size
    #[must_use]
    pub fn new(name: impl Into<OsString>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size: 0,
        }
    }

    /// Same entry with `size` set
    #[must_use]
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }
}

/// Lists the direct children of a directory.
///
/// The walker and the directory size aggregation only see the filesystem
/// through this trait, so tests can substitute an in-memory tree.
pub trait DirLister {
    /// Children of `dir`, sorted by name
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    fn list(&self, dir: &Path) -> io::Result<Vec<ListedEntry>>;
}

/// [`DirLister`] backed by the real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLister;

impl DirLister for FsLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<ListedEntry>> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            // Entries can vanish between readdir and lstat
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(e) => {
                    debug!(path = %entry.path().display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            entries.push(
                ListedEntry::new(entry.file_name(), node_kind(&meta.file_type()))
                    .with_size(meta.len()),
            );
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Map an `lstat` file type onto [`NodeKind`]
#[must_use]
pub fn node_kind(file_type: &fs::FileType) -> NodeKind {
    if file_type.is_dir() {
        NodeKind::Dir
    } else if file_type.is_symlink() {
        NodeKind::Symlink
    } else if file_type.is_file() {
        NodeKind::File
    } else {
        NodeKind::Special
    }
}
