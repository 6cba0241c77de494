//! Shell command layer for steampad: builds PowerShell pipelines and runs
//! them as single one-shot invocations.
//!
//! The rest of the workspace talks to the OS through this crate: registry
//! reads, process queries, file content reads, and process lifecycle
//! commands. Output comes back as plain text or JSON; callers at the data
//! layer degrade failures to empty defaults, callers at the control layer
//! ignore them.

pub mod pipeline;
pub mod powershell;

pub use pipeline::{Pipeline, SortKey, quote};
pub use powershell::{
    OutputMode, PowerShell, ProcessTarget, ShellOutput, StartProcessOptions, coerce_array,
};

/// Errors from shell invocations.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("failed to spawn shell: {0}")]
    Spawn(String),

    #[error("command exited with {code}: {stderr}")]
    Exit { code: i32, stderr: String },

    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}
