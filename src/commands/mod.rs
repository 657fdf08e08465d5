//! Command implementations. Each writes its result to stdout and leaves
//! diagnostics to `tracing` on stderr.

pub mod export;
pub mod scan;
