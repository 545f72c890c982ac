// pkgtool-core/src/provider.rs

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::config::ToolsConfig;
use crate::context::ExecutionContext;
use crate::errors::ToolError;
use crate::models::tools::{ToolDefinition, ToolInput};
use crate::tools::package::{InstallPackageTool, UninstallPackageTool};
use crate::tools::runner::RunnerSettings;
use crate::tools::{CommandTool, ToolOutcome};

/// Trait defining the interface a host uses to discover and call tools.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Returns the definitions of all tools available.
    fn get_tool_definitions(&self) -> Vec<ToolDefinition>;

    /// Executes the tool with the given name and input arguments.
    async fn execute_tool(
        &self,
        tool_name: &str,
        input: ToolInput,
        context: ExecutionContext,
    ) -> Result<ToolOutcome, ToolError>;
}

/// Provides the package-manager tools.
pub struct PackageToolProvider {
    tools: Vec<Arc<dyn CommandTool>>,
    settings: RunnerSettings,
}

impl PackageToolProvider {
    pub fn new(config: &ToolsConfig) -> Self {
        let tools: Vec<Arc<dyn CommandTool>> = vec![
            Arc::new(InstallPackageTool::new(config.package_manager.clone())),
            Arc::new(UninstallPackageTool::new(config.package_manager.clone())),
        ];
        Self {
            tools,
            settings: config.runner_settings(),
        }
    }

    pub fn tool(&self, name: &str) -> Option<&Arc<dyn CommandTool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }
}

#[async_trait]
impl ToolProvider for PackageToolProvider {
    fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    async fn execute_tool(
        &self,
        tool_name: &str,
        input: ToolInput,
        context: ExecutionContext,
    ) -> Result<ToolOutcome, ToolError> {
        let tool = match self.tool(tool_name) {
            Some(tool) => tool,
            None => {
                warn!(tool_name, "Requested unknown tool");
                return Err(ToolError::UnknownTool(tool_name.to_string()));
            }
        };

        let invocation_id = Uuid::new_v4();
        let span = tracing::info_span!("tool", name = tool_name, invocation = %invocation_id);
        async move {
            info!(arguments = ?input.arguments, "Executing tool");
            let result = tool.run(&input, &context, &self.settings).await;
            match &result {
                Ok(outcome) => info!(success = outcome.is_success(), "Tool completed"),
                Err(e) => warn!(error = %e, "Tool could not be run"),
            }
            result
        }
        .instrument(span)
        .await
    }
}
