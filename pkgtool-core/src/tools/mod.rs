// pkgtool-core/src/tools/mod.rs

//! Tools backed by an external command.
//!
//! A [`CommandTool`] turns its [`ToolInput`] into a [`CommandSpec`]; the
//! [`runner`] launches that command through the caller's shell and maps the
//! process exit onto a [`ToolOutcome`]. The package tools in [`package`] are
//! the concrete instances.

pub mod package;
pub mod runner;

use async_trait::async_trait;
use serde::{Serialize, Serializer};

use crate::context::ExecutionContext;
use crate::errors::{ToolError, UnexpectedExit};
use crate::models::tools::{ToolDefinition, ToolInput};
use runner::RunnerSettings;

/// The program and argument vector a tool wants to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The line handed to the shell: program and arguments separated by single spaces.
    /// No quoting is applied.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured output of a process that exited with code 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Captured output of a process that exited with a non-zero code or was killed by a signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessFailure {
    #[serde(serialize_with = "serialize_display")]
    pub error: UnexpectedExit,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// The single terminal result of a tool invocation that got as far as launching its process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolOutcome {
    Success(ProcessOutput),
    Failure(ProcessFailure),
}

impl ToolOutcome {
    /// Maps an exit code onto an outcome. Only `Some(0)` is a success.
    pub fn from_exit(exit_code: Option<i32>, stdout: String, stderr: String) -> Self {
        match exit_code {
            Some(0) => ToolOutcome::Success(ProcessOutput { stdout, stderr }),
            exit_code => ToolOutcome::Failure(ProcessFailure {
                error: UnexpectedExit,
                exit_code,
                stdout,
                stderr,
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    pub fn stdout(&self) -> &str {
        match self {
            ToolOutcome::Success(out) => &out.stdout,
            ToolOutcome::Failure(fail) => &fail.stdout,
        }
    }

    pub fn stderr(&self) -> &str {
        match self {
            ToolOutcome::Success(out) => &out.stderr,
            ToolOutcome::Failure(fail) => &fail.stderr,
        }
    }
}

fn serialize_display<T: std::fmt::Display, S: Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// A tool whose work is done by one external command.
#[async_trait]
pub trait CommandTool: Send + Sync {
    /// The name the host uses to call this tool.
    fn name(&self) -> &str;

    /// Name, description and input schema presented to the host.
    fn definition(&self) -> ToolDefinition;

    /// Builds the command for `input`. Must be deterministic.
    fn build_command(&self, input: &ToolInput) -> Result<CommandSpec, ToolError>;

    /// Builds the command and runs it in `context`.
    async fn run(
        &self,
        input: &ToolInput,
        context: &ExecutionContext,
        settings: &RunnerSettings,
    ) -> Result<ToolOutcome, ToolError> {
        let spec = self.build_command(input)?;
        runner::run_command(&spec, context, settings).await
    }
}
