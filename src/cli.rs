//! Command-line interface definitions for pkgaudit.
//!
//! The CLI definitions are shared between the main binary and build tools
//! (like xtask) for man page generation.
//!
//! Note: Field-level documentation doubles as clap help text, so we allow
//! missing_docs for this module.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for pkgaudit.
#[derive(Parser)]
#[command(
    name = "pkgaudit",
    version = crate::VERSION,
    about = "Find files not owned by any installed package",
    long_about = "Walks the filesystem, reconciles it with the package manager's file \
                  listing and reports every unmanaged path as JSON. The tar subcommand \
                  streams an explicit file list as a tar+gzip archive."
)]
pub struct Cli {
    /// Subcommand to execute; without one the unmanaged file scan runs
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Show debug output on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file
    #[arg(long, global = true, env = crate::CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Add owner, group, mode and sizes to every reported path
    #[arg(long)]
    pub extract_metadata: bool,

    /// Read the package file listing (rpm -qlav format) from a file
    #[arg(long, value_name = "PATH")]
    pub manifest_file: Option<PathBuf>,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Write files and directories as a tar+gzip stream to stdout
    Tar {
        /// Leave out this path and everything below it
        #[arg(long, value_name = "PATH")]
        exclude: Vec<PathBuf>,

        /// Read NUL-terminated paths from a file, or from stdin with "-"
        #[arg(long, value_name = "PATH|-")]
        files_from: Option<PathBuf>,

        /// Paths to archive when --files-from is not given
        #[arg(conflicts_with = "files_from")]
        files: Vec<PathBuf>,

        /// Accepted for tar compatibility; always on
        #[arg(short = 'c', long, hide = true)]
        create: bool,

        /// Accepted for tar compatibility; always on
        #[arg(short = 'z', long, hide = true)]
        gzip: bool,

        /// Accepted for tar compatibility; always on
        #[arg(long, hide = true)]
        null: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_is_scan() {
        let cli = Cli::try_parse_from(["pkgaudit", "--extract-metadata"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.extract_metadata);
    }

    #[test]
    fn test_tar_arguments() {
        let cli = Cli::try_parse_from([
            "pkgaudit",
            "tar",
            "--create",
            "--gzip",
            "--null",
            "--files-from",
            "-",
            "--exclude",
            "/var/cache",
            "--exclude",
            "/tmp/",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Tar {
                exclude,
                files_from,
                files,
                ..
            }) => {
                assert_eq!(exclude, vec![PathBuf::from("/var/cache"), PathBuf::from("/tmp/")]);
                assert_eq!(files_from, Some(PathBuf::from("-")));
                assert!(files.is_empty());
            }
            _ => panic!("expected tar subcommand"),
        }
    }

    #[test]
    fn test_files_from_conflicts_with_positional() {
        assert!(
            Cli::try_parse_from(["pkgaudit", "tar", "--files-from", "-", "/etc"]).is_err()
        );
    }
}
