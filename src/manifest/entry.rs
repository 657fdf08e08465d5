use crate::errors::AuditError;
use anyhow::Result;

/// Line rpm prints for a package that owns no files.
pub const NO_FILES_SENTINEL: &str = "(contains no files)";

/// Separator between a symlink and its target in verbose listings.
const LINK_ARROW: &str = " -> ";

/// Type of a listed package entry, taken from the first column of the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file (`-`)
    File,
    /// Directory (`d`)
    Dir,
    /// Symbolic link (`l`)
    Link,
    /// Anything else the package manager lists (devices, fifos, sockets)
    Other(char),
}

impl EntryKind {
    /// Map a permission-string type tag to a kind
    #[must_use]
    pub const fn from_tag(tag: char) -> Self {
        match tag {
            '-' => Self::File,
            'd' => Self::Dir,
            'l' => Self::Link,
            other => Self::Other(other),
        }
    }
}

/// One file owned by an installed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Entry type
    pub kind: EntryKind,
    /// Absolute path of the entry
    pub path: String,
    /// Symlink target, exactly as listed (may be relative)
    pub link_target: Option<String>,
}

impl ManifestEntry {
    /// Parse one line of `rpm -qlav` style output.
    ///
    /// The path is located by the first `/` on the line rather than by
    /// splitting columns, so file names with embedded spaces survive.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::MalformedManifest`] if the line contains no `/`.
    pub fn parse(line: &str) -> Result<Self> {
        let Some(start) = line.find('/') else {
            return Err(AuditError::MalformedManifest(line.to_string()).into());
        };

        // `start` is found, so the line has at least one character
        let tag = line.chars().next().unwrap_or('/');
        let rest = &line[start..];

        let (path, link_target) = match rest.split_once(LINK_ARROW) {
            Some((path, target)) if !target.contains(LINK_ARROW) => {
                (path.to_string(), Some(target.to_string()))
            }
            _ => (rest.to_string(), None),
        };

        Ok(Self {
            kind: EntryKind::from_tag(tag),
            path,
            link_target,
        })
    }
}

/// Parse every meaningful line of a listing, dropping blanks and the
/// "no files" sentinel.
///
/// # Errors
///
/// Returns an error on the first malformed line.
pub fn parse_listing<I, S>(lines: I) -> Result<Vec<ManifestEntry>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter(|line| {
            let line = line.as_ref();
            !line.is_empty() && line != NO_FILES_SENTINEL
        })
        .map(|line| ManifestEntry::parse(line.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        "-rw-r--r--    1 root    root                 18234080 Mar 31 11:40 /usr/lib64/libruby2.0-static.a",
        EntryKind::File,
        "/usr/lib64/libruby2.0-static.a",
        None
    )]
    #[case(
        "drwxr-xr-x    2 root    root                        0 Mar 31 11:45 /usr/include/ruby-2.0.0/x86_64-linux/ruby",
        EntryKind::Dir,
        "/usr/include/ruby-2.0.0/x86_64-linux/ruby",
        None
    )]
    #[case(
        "lrwxrwxrwx    1 root    root                       19 Mar 31 11:45 /usr/lib64/libruby2.0.so -> libruby2.0.so.2.0.0",
        EntryKind::Link,
        "/usr/lib64/libruby2.0.so",
        Some("libruby2.0.so.2.0.0")
    )]
    #[case(
        "-rw-r--r--    1 root    root                    61749 Jun 26 01:56 /usr/share/kde4/templates/kipiplugins_photolayoutseditor/data/templates/a4/h/Flipping Tux Black.ple",
        EntryKind::File,
        "/usr/share/kde4/templates/kipiplugins_photolayoutseditor/data/templates/a4/h/Flipping Tux Black.ple",
        None
    )]
    #[case(
        "crw-rw-rw-    1 root    root                   1,   3 Mar 31 11:45 /dev/null",
        EntryKind::Other('c'),
        "/dev/null",
        None
    )]
    fn test_parse_listing_line(
        #[case] line: &str,
        #[case] kind: EntryKind,
        #[case] path: &str,
        #[case] target: Option<&str>,
    ) {
        let entry = ManifestEntry::parse(line).unwrap();
        assert_eq!(entry.kind, kind);
        assert_eq!(entry.path, path);
        assert_eq!(entry.link_target.as_deref(), target);
    }

    #[test]
    fn test_absolute_link_target() {
        let entry =
            ManifestEntry::parse("lrwxrwxrwx 1 root root 9 Mar 31 11:45 /lib -> /usr/lib").unwrap();
        assert_eq!(entry.path, "/lib");
        assert_eq!(entry.link_target.as_deref(), Some("/usr/lib"));
    }

    #[test]
    fn test_line_without_path_is_fatal() {
        let err = ManifestEntry::parse("-rw-r--r-- 1 root root 0 Mar 31 11:40 relative").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AuditError>(),
            Some(AuditError::MalformedManifest(_))
        ));
    }

    #[test]
    fn test_parse_listing_skips_sentinel_and_blanks() {
        let lines = [
            NO_FILES_SENTINEL,
            "",
            "-rw-r--r-- 1 root root 3 Mar 31 11:40 /etc/motd",
        ];
        let entries = parse_listing(lines).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "/etc/motd");
    }

    #[test]
    fn test_kind_from_tag() {
        assert_eq!(EntryKind::from_tag('-'), EntryKind::File);
        assert_eq!(EntryKind::from_tag('d'), EntryKind::Dir);
        assert_eq!(EntryKind::from_tag('l'), EntryKind::Link);
        assert_eq!(EntryKind::from_tag('b'), EntryKind::Other('b'));
    }
}
