#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)] // Counters and sizes cannot realistically overflow u64
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # pkgaudit - Unmanaged File Audit
//!
//! pkgaudit finds every file on a machine that the package manager does not
//! account for, and can stream an explicit file list into a tar+gzip archive.
//! Migration tooling uses it to capture the state that reinstalling packages
//! would not bring back.
//!
//! ## Architecture
//!
//! - [`manifest`]: package listing parser, managed set and implicit directory derivation
//! - [`mounts`]: mount table classification (remote, special, local)
//! - [`scanner`]: filesystem walk that classifies unmanaged paths
//! - [`metadata`]: owner, group, mode and size enrichment
//! - [`output`]: JSON report records
//! - [`archive`]: streaming tar+gzip export
//! - [`config`]: TOML configuration and validation
//! - [`commands`]: command implementations driven by `main`
//!
//! ## Example Usage
//!
//! ```no_run
//! use pkgaudit::AuditContext;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = AuditContext::new(None, None)?;
//! let report = pkgaudit::commands::scan::build_report(&ctx, false)?;
//! println!("{} unmanaged paths", report.files.len());
//! # Ok(())
//! # }
//! ```

/// Streaming tar+gzip export of explicit file lists.
pub mod archive;

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Command implementations.
pub mod commands;

/// Configuration parsing and validation.
pub mod config;

/// Fatal error categories.
pub mod errors;

/// Package manifest parsing and the managed set.
pub mod manifest;

/// Owner, permission and size extraction.
pub mod metadata;

/// Mount table parsing and classification.
pub mod mounts;

/// Report records and JSON output.
pub mod output;

/// Filesystem walk and unmanaged path classification.
pub mod scanner;

use anyhow::Result;
use config::{Config, ManifestKind};
use std::path::Path;
use tracing::debug;

/// Current version of the pkgaudit binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "PKGAUDIT_CONFIG";

/// Everything a command needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct AuditContext {
    /// Validated configuration
    pub config: Config,
}

impl AuditContext {
    /// Load the configuration and apply command-line overrides.
    ///
    /// A `manifest_file` switches the manifest source to that listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded or the
    /// resulting configuration is invalid.
    pub fn new(config_path: Option<&Path>, manifest_file: Option<&Path>) -> Result<Self> {
        let mut config = Config::load_or_default(config_path)?;

        if let Some(path) = manifest_file {
            debug!(path = %path.display(), "Manifest file given on command line");
            config.manifest.source = ManifestKind::File;
            config.manifest.path = Some(path.to_path_buf());
            config.validate()?;
        }

        Ok(Self::from_config(config))
    }

    /// Wrap an already validated configuration
    #[must_use]
    pub const fn from_config(config: Config) -> Self {
        Self { config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_config() -> Result<()> {
        let ctx = AuditContext::new(None, None)?;
        assert_eq!(ctx.config, Config::default());
        Ok(())
    }

    #[test]
    fn test_manifest_file_overrides_config() -> Result<()> {
        let temp = TempDir::new()?;
        let config_path = temp.path().join("pkgaudit.toml");
        fs::write(&config_path, "[manifest]\nsource = \"rpm\"\n")?;

        let listing = temp.path().join("listing");
        let ctx = AuditContext::new(Some(&config_path), Some(&listing))?;

        assert_eq!(ctx.config.manifest.source, ManifestKind::File);
        assert_eq!(ctx.config.manifest.path, Some(listing));
        Ok(())
    }

    #[test]
    fn test_missing_config_file_is_error() {
        assert!(AuditContext::new(Some(Path::new("/nonexistent/pkgaudit.toml")), None).is_err());
    }
}
