// pkgtool-core/src/errors.rs
use thiserror::Error;

/// Errors that stop a tool invocation before it produces an outcome.
///
/// A process that ran and exited unsuccessfully is *not* an error; it is reported
/// as [`crate::tools::ToolOutcome::Failure`].
#[derive(Error, Debug)]
pub enum ToolError {
    /// The process could not be started (shell missing, bad working directory, ...).
    #[error("Failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on a launched process failed.
    #[error("Failed to wait for child process: {0}")]
    Wait(#[source] std::io::Error),

    /// No tool is registered under this name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The arguments could not be decoded into the tool's input.
    #[error("Invalid input for tool '{tool}': {message}")]
    InvalidInput { tool: String, message: String },
}

impl ToolError {
    pub fn invalid_input(tool: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::InvalidInput {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// The generic error carried by a failed outcome.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("Unexpected exit code")]
pub struct UnexpectedExit;
