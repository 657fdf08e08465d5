use crate::archive::{ArchiveExporter, ExcludeSet, NullDelimitedPaths};
use crate::metadata::{CachedLookup, SystemLookup};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the list of paths to archive comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileList {
    /// Paths given on the command line
    Args(Vec<PathBuf>),
    /// NUL-terminated paths on stdin
    Stdin,
    /// NUL-terminated paths in a file
    File(PathBuf),
}

impl FileList {
    /// Interpret `--files-from`: `-` is stdin, anything else a file; without
    /// it the positional paths are used
    #[must_use]
    pub fn from_args(files_from: Option<PathBuf>, files: Vec<PathBuf>) -> Self {
        match files_from {
            Some(path) if path == Path::new("-") => Self::Stdin,
            Some(path) => Self::File(path),
            None => Self::Args(files),
        }
    }

    /// Stream the paths lazily
    ///
    /// # Errors
    ///
    /// Returns an error if the list file cannot be opened.
    pub fn paths(self) -> Result<Box<dyn Iterator<Item = Result<PathBuf>>>> {
        Ok(match self {
            Self::Args(files) => Box::new(files.into_iter().map(Ok)),
            Self::Stdin => Box::new(NullDelimitedPaths::new(io::stdin().lock())),
            Self::File(path) => {
                let file = File::open(&path)
                    .with_context(|| format!("Failed to open file list: {}", path.display()))?;
                Box::new(NullDelimitedPaths::new(BufReader::new(file)))
            }
        })
    }
}

/// Write the listed paths as tar+gzip to stdout
///
/// # Errors
///
/// Returns an error if the file list cannot be read or the export fails.
pub fn execute(files: FileList, exclude: Vec<PathBuf>) -> Result<()> {
    let out = BufWriter::new(io::stdout().lock());
    write_archive(files, exclude, out)
}

/// Write the listed paths as tar+gzip to `out`
///
/// # Errors
///
/// Returns an error if the file list cannot be read or the export fails.
pub fn write_archive<W: Write>(files: FileList, exclude: Vec<PathBuf>, out: W) -> Result<()> {
    debug!(?files, excluded = exclude.len(), "Starting export");

    let excludes: ExcludeSet = exclude.into_iter().collect();
    let lookup = CachedLookup::new(SystemLookup);
    ArchiveExporter::new(&excludes, &lookup).export(files.paths()?, out)?;
    Ok(())
}
