use std::fmt;
use std::path::PathBuf;

/// Fatal audit conditions that callers may want to tell apart.
///
/// These are carried inside `anyhow::Error` and can be recovered with
/// `err.downcast_ref::<AuditError>()`.
#[derive(Debug)]
pub enum AuditError {
    /// A package listing line that has no path in it
    MalformedManifest(String),
    /// A path observed during the walk could no longer be stat'ed or opened
    Vanished {
        /// Path that disappeared or became unreadable
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// A numeric uid or gid with no name in the user/group database
    UnresolvableIdentity {
        /// "user" or "group"
        kind: &'static str,
        /// Numeric id that failed to resolve
        id: u32,
    },
    /// A file's content no longer matched its stat'ed size while archived
    SizeChanged {
        /// File that shrank or grew
        path: PathBuf,
        /// Size recorded in the tar header
        expected: u64,
        /// Bytes actually read, or `expected + 1` when the file grew
        read: u64,
    },
    /// The package manager ran but reported failure
    ManagerFailed {
        /// Command line that was executed
        command: String,
        /// Trimmed stderr of the command
        stderr: String,
    },
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedManifest(line) => {
                write!(f, "Malformed package listing line (no path): {line}")
            }
            Self::Vanished { path, source } => {
                write!(f, "Cannot access {}: {source}", path.display())
            }
            Self::UnresolvableIdentity { kind, id } => {
                write!(f, "Cannot resolve {kind} name for id {id}")
            }
            Self::SizeChanged {
                path,
                expected,
                read,
            } => {
                if read > expected {
                    write!(
                        f,
                        "{} grew past {expected} bytes while being archived",
                        path.display()
                    )
                } else {
                    write!(
                        f,
                        "{} shrank from {expected} to {read} bytes while being archived",
                        path.display()
                    )
                }
            }
            Self::ManagerFailed { command, stderr } => {
                if stderr.is_empty() {
                    write!(f, "{command} failed")
                } else {
                    write!(f, "{command} failed: {stderr}")
                }
            }
        }
    }
}

impl std::error::Error for AuditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Vanished { source, .. } => Some(source),
            _ => None,
        }
    }
}
