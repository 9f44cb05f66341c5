//! Shared plumbing for the `chapter-splitter` and `visual-injector` binaries.
//!
//! Each command returns `Result<(), i32>`: on failure it has already printed
//! an `Error: ...` line to stderr and the binary exits with the code.

pub mod cli;
pub mod inject_cmd;
pub mod logging;
pub mod split_cmd;
