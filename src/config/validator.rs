use crate::config::{Config, ManifestKind};
use anyhow::{Result, bail};
use std::collections::HashSet;
use tracing::warn;

/// Validates configuration values and flags fields nothing reads
pub struct ConfigValidator {
    /// Set of valid configuration fields
    known_fields: HashSet<&'static str>,
}

impl ConfigValidator {
    /// Create a new validator with known configuration fields
    #[must_use]
    pub fn new() -> Self {
        let known_fields = [
            "scan.root",
            "scan.ignore",
            "mounts.table",
            "mounts.remote_fs",
            "mounts.special_fs",
            "mounts.local_fs",
            "manifest.source",
            "manifest.path",
        ]
        .into_iter()
        .collect();

        Self { known_fields }
    }

    /// Check the values of a parsed configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(config: &Config) -> Result<()> {
        if !config.scan.root.is_absolute() {
            bail!(
                "scan.root must be an absolute path: {}",
                config.scan.root.display()
            );
        }

        if let Some(relative) = config.scan.ignore.iter().find(|p| !p.is_absolute()) {
            bail!(
                "scan.ignore entries must be absolute paths: {}",
                relative.display()
            );
        }

        if config.manifest.source == ManifestKind::File && config.manifest.path.is_none() {
            bail!("manifest.path is required when manifest.source = \"file\"");
        }

        let remote: HashSet<&str> = config.mounts.remote_fs.iter().map(String::as_str).collect();
        if let Some(fs) = config
            .mounts
            .special_fs
            .iter()
            .find(|fs| remote.contains(fs.as_str()))
        {
            bail!("Filesystem type '{fs}' is listed as both remote and special");
        }

        Ok(())
    }

    /// Log a warning for every field in `content` that is not recognized
    pub fn warn_unknown_fields(&self, content: &str) {
        let Ok(parsed) = toml::from_str::<toml::Table>(content) else {
            return;
        };

        for field in self.unknown_fields(&parsed) {
            warn!(field = %field, "Unknown configuration field");
        }
    }

    /// Dotted names of fields not in the known set
    fn unknown_fields(&self, table: &toml::Table) -> Vec<String> {
        let mut unknown = Vec::new();

        for (section, value) in table {
            match value.as_table() {
                Some(inner) => {
                    for key in inner.keys() {
                        let field = format!("{section}.{key}");
                        if !self.known_fields.contains(field.as_str()) {
                            unknown.push(field);
                        }
                    }
                }
                None => unknown.push(section.clone()),
            }
        }

        unknown.sort();
        unknown
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
