//! Directory storage access
//!
//! Read-only, non-recursive views of the served root directory.

mod operations;

pub use operations::{DirectoryEntry, find_entries, list_directory};
