//! Report records and JSON rendering.
//!
//! The scan result is a single JSON object on stdout:
//!
//! ```json
//! {
//!   "extracted": false,
//!   "files": [
//!     { "name": "/srv/data/", "type": "dir" }
//!   ]
//! }
//! ```
//!
//! Optional fields are omitted unless metadata extraction filled them in.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// Classification of an unmanaged path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// Regular file
    File,
    /// Directory root of an unmanaged subtree
    Dir,
    /// Symbolic link
    Link,
    /// Mount point of a network filesystem, not traversed
    RemoteDir,
}

/// One unmanaged path in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmanagedRecord {
    /// Absolute path; directories and remote mounts end in `/`
    pub name: String,
    /// Owner name, or the numeric uid when it has no name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Group name, or the numeric gid when it has no name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// What kind of path this is
    #[serde(rename = "type")]
    pub file_type: FileType,
    /// Octal permission string, e.g. `"644"` or `"1777"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Number of non-directory entries in a directory subtree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<u64>,
    /// Number of directories in a directory subtree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirs: Option<u64>,
    /// File size, or summed regular file size for directories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl UnmanagedRecord {
    /// A record with only name and type set
    #[must_use]
    pub fn new(name: impl Into<String>, file_type: FileType) -> Self {
        Self {
            name: name.into(),
            user: None,
            group: None,
            file_type,
            mode: None,
            files: None,
            dirs: None,
            size: None,
        }
    }
}

/// The complete scan result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Whether metadata extraction ran
    pub extracted: bool,
    /// Unmanaged paths, sorted by name
    pub files: Vec<UnmanagedRecord>,
}

impl Report {
    /// Turn the classifier's path map into bare records; the map's ordering
    /// gives the sorted output
    #[must_use]
    pub fn from_classified(classified: BTreeMap<String, FileType>) -> Self {
        Self {
            extracted: false,
            files: classified
                .into_iter()
                .map(|(name, file_type)| UnmanagedRecord::new(name, file_type))
                .collect(),
        }
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }

    /// Write the JSON report followed by a newline
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        let json = self.to_json()?;
        writeln!(out, "{json}").context("Failed to write report")?;
        out.flush().context("Failed to flush report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_report() {
        let report = Report::from_classified(BTreeMap::new());
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"extracted": false, "files": []}));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let mut classified = BTreeMap::new();
        classified.insert("/srv/data/".to_string(), FileType::Dir);
        classified.insert("/etc/local.conf".to_string(), FileType::File);
        classified.insert("/mnt/nfs/".to_string(), FileType::RemoteDir);

        let report = Report::from_classified(classified);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(
            value,
            json!({
                "extracted": false,
                "files": [
                    {"name": "/etc/local.conf", "type": "file"},
                    {"name": "/mnt/nfs/", "type": "remote_dir"},
                    {"name": "/srv/data/", "type": "dir"},
                ]
            })
        );
    }

    #[test]
    fn test_enriched_record_shape() {
        let mut record = UnmanagedRecord::new("/srv/data/", FileType::Dir);
        record.user = Some("root".to_string());
        record.group = Some("root".to_string());
        record.mode = Some("755".to_string());
        record.size = Some(0);
        record.files = Some(0);
        record.dirs = Some(1);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "/srv/data/",
                "user": "root",
                "group": "root",
                "type": "dir",
                "mode": "755",
                "files": 0,
                "dirs": 1,
                "size": 0
            })
        );
    }

    #[test]
    fn test_numeric_owner_stays_a_string() {
        let mut record = UnmanagedRecord::new("/opt/blob", FileType::File);
        record.user = Some("4242".to_string());
        record.group = Some("100".to_string());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["user"], json!("4242"));
        assert_eq!(value["group"], json!("100"));

        let back: UnmanagedRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_write_to_appends_newline() {
        let mut buf = Vec::new();
        Report::from_classified(BTreeMap::new())
            .write_to(&mut buf)
            .unwrap();
        assert!(buf.ends_with(b"}\n"));
    }
}
