//! Interface driver errors

use std::io;
use thiserror::Error;

/// Errors that can occur while mutating host interfaces
#[derive(Debug, Error)]
pub enum DriverError {
    /// Failed to spawn the command
    #[error("Failed to execute '{command}': {source}")]
    Spawn {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Command returned a non-zero exit code
    #[error("Command failed: '{command}' (exit code {exit_code}): {output}")]
    CommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code, -1 when terminated by a signal.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// `ip -json` output could not be parsed
    #[error("Failed to parse link details: {0}")]
    Parse(#[from] serde_json::Error),

    /// An interface with this name exists under a different definition
    #[error("Interface {name} already exists with a conflicting definition: {reason}")]
    Conflict {
        /// Interface name.
        name: String,
        /// What differs.
        reason: String,
    },

    /// Invalid request (e.g., empty interface name)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
