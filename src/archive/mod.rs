//! Streaming tar+gzip export of explicit file lists.
//!
//! Each root is walked depth-first and every entry is written straight into
//! one gzip-compressed tar stream. Neither the archive nor the file list is
//! held in memory; only one file is open at a time.

pub mod file_list;

pub use file_list::NullDelimitedPaths;

use crate::errors::AuditError;
use crate::metadata::NameLookup;
use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Component, Path, PathBuf};
use tracing::{Level, debug, info, span, warn};
use walkdir::WalkDir;

/// Paths left out of the archive together with everything below them
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    /// Compared by components, so trailing slashes do not matter
    paths: HashSet<PathBuf>,
}

impl ExcludeSet {
    /// Whether `path` is excluded
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for ExcludeSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Counters reported after an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Entries written (files, directories, links, devices)
    pub entries: u64,
    /// Bytes of regular file content written
    pub bytes: u64,
    /// Entries skipped because they cannot be archived (sockets)
    pub skipped: u64,
}

/// Writes file lists as a tar+gzip stream
pub struct ArchiveExporter<'a, N: NameLookup> {
    /// Paths to leave out
    excludes: &'a ExcludeSet,
    /// Owner and group name resolution
    lookup: &'a N,
}

impl<'a, N: NameLookup> ArchiveExporter<'a, N> {
    /// Create an exporter
    #[must_use]
    pub const fn new(excludes: &'a ExcludeSet, lookup: &'a N) -> Self {
        Self { excludes, lookup }
    }

    /// Archive every root (and its subtree) into `out`.
    ///
    /// The tar trailer and gzip footer are written exactly once, also when an
    /// entry fails; the first error is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if a root cannot be read, an entry vanishes, an
    /// owner or group has no name, or writing to `out` fails.
    pub fn export<W, I>(&self, roots: I, out: W) -> Result<ExportStats>
    where
        W: Write,
        I: IntoIterator<Item = Result<PathBuf>>,
    {
        let span = span!(Level::INFO, "export");
        let _guard = span.enter();

        let mut builder = tar::Builder::new(GzEncoder::new(out, Compression::default()));
        let mut stats = ExportStats::default();

        let result = roots
            .into_iter()
            .try_for_each(|root| self.append_root(&mut builder, &root?, &mut stats));

        let closed = builder
            .into_inner()
            .and_then(GzEncoder::finish)
            .and_then(|mut out| out.flush())
            .context("Failed to finish archive stream");

        result?;
        closed?;

        info!(
            entries = stats.entries,
            bytes = stats.bytes,
            skipped = stats.skipped,
            "Archive written"
        );
        Ok(stats)
    }

    /// Walk one root in pre-order, pruning excluded subtrees
    fn append_root<W: Write>(
        &self,
        builder: &mut tar::Builder<W>,
        root: &Path,
        stats: &mut ExportStats,
    ) -> Result<()> {
        debug!(root = %root.display(), "Archiving root");

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.excludes.contains(entry.path()));

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            self.append_path(builder, entry.path(), stats)?;
        }
        Ok(())
    }

    /// Write one header, and the content for regular files
    fn append_path<W: Write>(
        &self,
        builder: &mut tar::Builder<W>,
        path: &Path,
        stats: &mut ExportStats,
    ) -> Result<()> {
        let vanished = |source: io::Error| AuditError::Vanished {
            path: path.to_path_buf(),
            source,
        };

        let meta = fs::symlink_metadata(path).map_err(vanished)?;
        let file_type = meta.file_type();
        if file_type.is_socket() {
            warn!(path = %path.display(), "Sockets cannot be archived, skipping");
            stats.skipped += 1;
            return Ok(());
        }

        let link_target = if file_type.is_symlink() {
            Some(fs::read_link(path).map_err(vanished)?)
        } else {
            None
        };

        let mut header = tar::Header::new_gnu();
        header.set_metadata_in_mode(&meta, tar::HeaderMode::Complete);
        header
            .set_username(&self.lookup.require_user(meta.uid())?)
            .with_context(|| format!("User name too long for {}", path.display()))?;
        header
            .set_groupname(&self.lookup.require_group(meta.gid())?)
            .with_context(|| format!("Group name too long for {}", path.display()))?;

        let name = archive_name(path);
        let write_context = || format!("Failed to write {} to archive", path.display());

        if let Some(target) = link_target {
            builder
                .append_link(&mut header, &name, &target)
                .with_context(write_context)?;
        } else if file_type.is_file() {
            let file = File::open(path).map_err(vanished)?;
            stats.bytes += append_file(builder, &mut header, &name, path, file)?;
        } else {
            builder
                .append_data(&mut header, &name, io::empty())
                .with_context(write_context)?;
        }

        stats.entries += 1;
        Ok(())
    }
}

/// Append a regular file whose body is exactly the size in `header`.
///
/// A short read is zero-padded so the entries that follow stay readable;
/// content shorter or longer than the stat'ed size is then reported as
/// [`AuditError::SizeChanged`].
fn append_file<W: Write, R: Read>(
    builder: &mut tar::Builder<W>,
    header: &mut tar::Header,
    name: &Path,
    path: &Path,
    content: R,
) -> Result<u64> {
    let expected = header
        .size()
        .with_context(|| format!("Invalid size in header for {}", path.display()))?;
    let mut body = FixedLength::new(content, expected);
    builder
        .append_data(header, name, &mut body)
        .with_context(|| format!("Failed to write {} to archive", path.display()))?;

    let grew = body.copied == expected
        && body
            .has_more()
            .with_context(|| format!("Failed to read {}", path.display()))?;
    let read = if grew {
        expected + 1
    } else {
        body.copied
    };
    if read != expected {
        return Err(AuditError::SizeChanged {
            path: path.to_path_buf(),
            expected,
            read,
        }
        .into());
    }
    Ok(expected)
}

/// Yields exactly `remaining` bytes: the source is cut off there, and zeros
/// stand in once it runs dry
struct FixedLength<R> {
    /// Underlying content
    inner: R,
    /// Bytes still owed to the archive
    remaining: u64,
    /// Bytes that came from `inner`
    copied: u64,
}

impl<R: Read> FixedLength<R> {
    /// Wrap `inner`, promising `len` bytes
    const fn new(inner: R, len: u64) -> Self {
        Self {
            inner,
            remaining: len,
            copied: 0,
        }
    }

    /// Whether the source still has data past the promised length
    fn has_more(&mut self) -> io::Result<bool> {
        let mut extra = [0u8; 1];
        Ok(self.inner.read(&mut extra)? > 0)
    }
}

impl<R: Read> Read for FixedLength<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let max = usize::try_from(self.remaining)
            .unwrap_or(usize::MAX)
            .min(buf.len());
        if max == 0 {
            return Ok(0);
        }

        let n = self.inner.read(&mut buf[..max])?;
        let n = if n == 0 {
            buf[..max].fill(0);
            max
        } else {
            self.copied += n as u64;
            n
        };
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Name stored in the archive: the path without its leading `/`
fn archive_name(path: &Path) -> PathBuf {
    let name: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir))
        .collect();
    if name.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        name
    }
}
