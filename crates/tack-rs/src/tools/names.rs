//! Canonical tool name constants.
//!
//! All tool-name string literals should reference these constants to avoid
//! scattered magic strings.

pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";
pub const EDIT: &str = "edit";
pub const SHELL: &str = "shell";
pub const LIST_DIR: &str = "list_dir";
pub const GREP: &str = "grep";
