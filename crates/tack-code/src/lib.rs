//! Command-line driver for the `tack-rs` tool pipeline.
//!
//! `tack-code` exposes the built-in tools to scripts and to humans: it
//! prints the tool schemas the model would see, and runs single tool calls
//! through the full validate, confirm, approve and execute pipeline with
//! confirmations asked on the terminal.
//!
//! # Library usage
//!
//! ```ignore
//! use tack_code::CodeConfig;
//!
//! let config = CodeConfig::load(None)?.with_workdir(".");
//! let registry = config.build_registry();
//! let approvals = config.build_approvals(false);
//! let result = registry
//!     .invoke("list_dir", serde_json::json!({}), &config.workdir, Some(&approvals))
//!     .await;
//! ```
//!
//! # Binary
//!
//! ```sh
//! tack-code schema
//! tack-code invoke shell '{"command": "cargo --version"}' --cwd /path/to/project
//! ```

pub mod config;
pub mod confirm;

pub use config::CodeConfig;
pub use confirm::{prompt_on_terminal, render_confirmation};
