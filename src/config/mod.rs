pub mod validator;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime configuration, loaded once at startup and read-only afterwards
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,

    /// Filesystem type lists used to classify the mount table
    #[serde(default)]
    pub mounts: MountConfig,

    #[serde(default)]
    pub manifest: ManifestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanConfig {
    /// Directory the classification walk starts from
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Extra absolute paths excluded from the walk
    #[serde(default)]
    pub ignore: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MountConfig {
    #[serde(default = "default_mount_table")]
    pub table: PathBuf,
    #[serde(default = "default_remote_fs")]
    pub remote_fs: Vec<String>,
    #[serde(default = "default_special_fs")]
    pub special_fs: Vec<String>,
    #[serde(default = "default_local_fs")]
    pub local_fs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ManifestConfig {
    #[serde(default)]
    pub source: ManifestKind,
    /// Listing file, required when `source = "file"`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Where the managed file listing comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    /// rpm if installed, else dpkg, else nothing
    #[default]
    Auto,
    Rpm,
    Dpkg,
    /// An `rpm -qlav` formatted listing stored in a file
    File,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            ignore: Vec::new(),
        }
    }
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            table: default_mount_table(),
            remote_fs: default_remote_fs(),
            special_fs: default_special_fs(),
            local_fs: default_local_fs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Unlike a user preferences file this is never created on demand: a
    /// missing path is an error, and callers that have no file use
    /// [`Config::default`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid TOML or unknown enum values
    /// - The resulting configuration fails validation
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        validator::ConfigValidator::new().warn_unknown_fields(&content);
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise return the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Check the invariants the scanner relies on
    ///
    /// # Errors
    ///
    /// Returns an error if a path that must be absolute is relative, or if
    /// the file manifest source has no path.
    pub fn validate(&self) -> Result<()> {
        validator::ConfigValidator::validate(self)
    }
}

// Default functions for serde
fn default_root() -> PathBuf {
    PathBuf::from("/")
}

fn default_mount_table() -> PathBuf {
    PathBuf::from("/proc/mounts")
}

fn default_remote_fs() -> Vec<String> {
    ["autofs", "cifs", "nfs", "nfs4"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_special_fs() -> Vec<String> {
    [
        "proc",
        "sysfs",
        "devtmpfs",
        "tmpfs",
        "rpc_pipefs",
        "fuse.gvfs-fuse-daemon",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn default_local_fs() -> Vec<String> {
    [
        "ext2", "ext3", "ext4", "reiserfs", "btrfs", "vfat", "xfs", "jfs",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.scan.root, PathBuf::from("/"));
        assert_eq!(config.mounts.table, PathBuf::from("/proc/mounts"));
        assert!(config.mounts.remote_fs.contains(&"nfs4".to_string()));
        assert!(config.mounts.special_fs.contains(&"tmpfs".to_string()));
        assert_eq!(config.manifest.source, ManifestKind::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("pkgaudit.toml");
        std::fs::write(
            &path,
            "[scan]\nignore = [\"/srv/cache\"]\n\n[manifest]\nsource = \"rpm\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.scan.ignore, vec![PathBuf::from("/srv/cache")]);
        assert_eq!(config.scan.root, PathBuf::from("/"));
        assert_eq!(config.manifest.source, ManifestKind::Rpm);
        assert_eq!(config.mounts, MountConfig::default());
        Ok(())
    }

    #[test]
    fn test_roundtrip_through_toml() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("pkgaudit.toml");
        let mut config = Config::default();
        config.mounts.remote_fs.push("glusterfs".to_string());
        std::fs::write(&path, toml::to_string_pretty(&config)?)?;

        assert_eq!(Config::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(Config::load(Path::new("/nonexistent/pkgaudit.toml")).is_err());
        assert!(Config::load_or_default(None).is_ok());
    }

    #[test]
    fn test_unknown_source_rejected() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("pkgaudit.toml");
        std::fs::write(&path, "[manifest]\nsource = \"pacman\"\n")?;
        assert!(Config::load(&path).is_err());
        Ok(())
    }
}
