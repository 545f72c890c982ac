// pkgtool-core/src/lib.rs

#![doc = include_str!("../../README.md")]

pub mod config;
pub mod context;
pub mod errors;
pub mod models;
pub mod provider;
pub mod tools;

pub use config::ToolsConfig;
pub use context::ExecutionContext;
pub use errors::{ToolError, UnexpectedExit};
pub use models::tools::{
    ToolDefinition, ToolInput, ToolParameter, ToolParameterType, ToolParametersDefinition,
};
pub use provider::{PackageToolProvider, ToolProvider};
pub use tools::runner::{run_command, RunnerSettings};
pub use tools::{CommandSpec, CommandTool, ProcessFailure, ProcessOutput, ToolOutcome};

pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
