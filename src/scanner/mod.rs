/// Abstract directory listing and the real filesystem implementation.
pub mod lister;

/// Paths excluded from the walk.
pub mod ignore;

/// Recursive classification of the live tree into unmanaged paths.
pub mod unmanaged;

pub use ignore::IgnoreSet;
pub use lister::{DirLister, FsLister, ListedEntry, NodeKind};
pub use unmanaged::{UnmanagedScanner, find_unmanaged_files};
