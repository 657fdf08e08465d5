//! Package manifest reconciliation.
//!
//! Turns the package manager's verbose file listing into a [`ManagedSet`]:
//! the files and directories installed packages account for, plus the
//! directories that are only managed implicitly because something managed
//! lives inside them.
//!
//! - [`entry`]: parsing of single listing lines
//! - [`managed`]: building the managed set and deriving implicit directories
//! - [`dir_trie`]: component trie answering "is anything managed below here?"
//! - [`source`]: rpm / dpkg / file collaborators producing the listing

pub mod dir_trie;
pub mod entry;
pub mod managed;
pub mod source;

pub use dir_trie::DirTrie;
pub use entry::{EntryKind, ManifestEntry, NO_FILES_SENTINEL};
pub use managed::{ManagedDirs, ManagedFiles, ManagedSet, derive_implicit};
pub use source::ManifestSource;
