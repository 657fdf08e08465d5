//! Package manager collaborators that produce the managed set.

use crate::config::ManifestKind;
use crate::errors::AuditError;
use crate::manifest::entry::{EntryKind, ManifestEntry};
use crate::manifest::managed::ManagedSet;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{Level, debug, info, span, warn};

/// Something that can tell which files the installed packages own
pub trait ManifestSource {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Query the package database and build the managed set
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager cannot be run or its output
    /// is malformed.
    fn load(&self) -> Result<ManagedSet>;
}

/// `rpm -qlav` based source
#[derive(Debug, Default)]
pub struct RpmSource;

impl ManifestSource for RpmSource {
    fn name(&self) -> &'static str {
        "rpm"
    }

    fn load(&self) -> Result<ManagedSet> {
        let output = run("rpm", &["-qlav"])?;
        ManagedSet::from_listing(output.lines())
    }
}

/// dpkg based source. dpkg listings carry no type column, so each listed
/// path is classified with `lstat`.
#[derive(Debug, Default)]
pub struct DpkgSource;

impl ManifestSource for DpkgSource {
    fn name(&self) -> &'static str {
        "dpkg"
    }

    fn load(&self) -> Result<ManagedSet> {
        let selections = run("dpkg", &["--get-selections"])?;
        let mut entries = Vec::new();

        for package in installed_packages(&selections) {
            // Packages without a file list make `dpkg -L` fail; they own nothing
            let listing = match run("dpkg", &["-L", package]) {
                Ok(listing) => listing,
                Err(e) => {
                    debug!(package, error = %e, "Skipping package without file list");
                    continue;
                }
            };

            for line in listing.lines().filter(|l| l.starts_with('/')) {
                let Ok(meta) = fs::symlink_metadata(line) else {
                    continue;
                };
                let kind = if meta.is_dir() {
                    EntryKind::Dir
                } else {
                    EntryKind::File
                };
                entries.push(ManifestEntry {
                    kind,
                    path: line.to_string(),
                    link_target: None,
                });
            }
        }

        Ok(ManagedSet::from_entries(entries))
    }
}

/// Reads an `rpm -qlav` formatted listing from a file
#[derive(Debug)]
pub struct FileSource {
    /// Listing file
    path: PathBuf,
}

impl FileSource {
    /// Create a source reading `path`
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ManifestSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    fn load(&self) -> Result<ManagedSet> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read listing: {}", self.path.display()))?;
        ManagedSet::from_listing(content.lines())
    }
}

/// Package manager that owns nothing, used when none is installed
#[derive(Debug, Default)]
pub struct EmptySource;

impl ManifestSource for EmptySource {
    fn name(&self) -> &'static str {
        "none"
    }

    fn load(&self) -> Result<ManagedSet> {
        Ok(ManagedSet::default())
    }
}

/// Pick the manifest source for the configured kind.
///
/// `Auto` prefers rpm over dpkg, falling back to an empty set when neither
/// binary is on `PATH`.
///
/// # Errors
///
/// Returns an error if `File` is requested without a path.
pub fn select(kind: ManifestKind, path: Option<&Path>) -> Result<Box<dyn ManifestSource>> {
    let source: Box<dyn ManifestSource> = match kind {
        ManifestKind::Rpm => Box::new(RpmSource),
        ManifestKind::Dpkg => Box::new(DpkgSource),
        ManifestKind::File => {
            let path = path.context("Manifest source 'file' needs a listing path")?;
            Box::new(FileSource::new(path.to_path_buf()))
        }
        ManifestKind::Auto => {
            if which::which("rpm").is_ok() {
                Box::new(RpmSource)
            } else if which::which("dpkg").is_ok() {
                Box::new(DpkgSource)
            } else {
                warn!("Neither rpm nor dpkg found; treating every file as unmanaged");
                Box::new(EmptySource)
            }
        }
    };

    info!(source = source.name(), "Manifest source selected");
    Ok(source)
}

/// Installed package names from `dpkg --get-selections` output
fn installed_packages(selections: &str) -> impl Iterator<Item = &str> {
    selections
        .lines()
        .filter(|line| !line.contains("deinstall"))
        .filter_map(|line| line.split_whitespace().next())
}

/// Run a command and return its stdout
fn run(program: &str, args: &[&str]) -> Result<String> {
    let command = format!("{program} {}", args.join(" "));
    let span = span!(Level::DEBUG, "package_manager", command = %command);
    let _guard = span.enter();

    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute {command}"))?;

    if !output.status.success() {
        return Err(AuditError::ManagerFailed {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    debug!(bytes = output.stdout.len(), "Command finished");
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
