// pkgtool-core/src/tools/package.rs

//! Install and uninstall tools for an npm-compatible package manager.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{CommandSpec, CommandTool};
use crate::errors::ToolError;
use crate::models::tools::{ToolDefinition, ToolInput, ToolParameter, ToolParametersDefinition};

pub const INSTALL_PACKAGE: &str = "installPackage";
pub const UNINSTALL_PACKAGE: &str = "uninstallPackage";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstallPackageInput {
    pub package: String,
    #[serde(default)]
    pub development: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UninstallPackageInput {
    pub package: String,
}

fn get_required_arg<T>(tool: &str, input: &ToolInput, key: &str) -> Result<T, ToolError>
where
    T: DeserializeOwned,
{
    let value = input.arguments.get(key).ok_or_else(|| {
        ToolError::invalid_input(tool, format!("Missing required argument: '{}'", key))
    })?;
    serde_json::from_value(value.clone()).map_err(|e| {
        ToolError::invalid_input(
            tool,
            format!(
                "Invalid type or value for argument '{}'. Expected {}: {}",
                key,
                std::any::type_name::<T>(),
                e
            ),
        )
    })
}

fn get_optional_arg<T>(tool: &str, input: &ToolInput, key: &str) -> Result<Option<T>, ToolError>
where
    T: DeserializeOwned,
{
    match input.arguments.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(_) => get_required_arg(tool, input, key).map(Some),
    }
}

impl InstallPackageInput {
    pub fn from_tool_input(input: &ToolInput) -> Result<Self, ToolError> {
        Ok(Self {
            package: get_required_arg(INSTALL_PACKAGE, input, "package")?,
            development: get_optional_arg(INSTALL_PACKAGE, input, "development")?,
        })
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["install".to_string(), self.package.clone()];
        if self.development.unwrap_or(false) {
            args.push("--save-dev".to_string());
        }
        args
    }
}

impl UninstallPackageInput {
    pub fn from_tool_input(input: &ToolInput) -> Result<Self, ToolError> {
        Ok(Self {
            package: get_required_arg(UNINSTALL_PACKAGE, input, "package")?,
        })
    }

    pub fn args(&self) -> Vec<String> {
        vec!["uninstall".to_string(), self.package.clone()]
    }
}

/// `<pm> install <package> [--save-dev]`
#[derive(Debug, Clone)]
pub struct InstallPackageTool {
    package_manager: String,
}

impl InstallPackageTool {
    pub fn new(package_manager: impl Into<String>) -> Self {
        Self {
            package_manager: package_manager.into(),
        }
    }
}

impl CommandTool for InstallPackageTool {
    fn name(&self) -> &str {
        INSTALL_PACKAGE
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: INSTALL_PACKAGE.to_string(),
            description: "Install a package from npm".to_string(),
            parameters: ToolParametersDefinition::object()
                .with_property(
                    "package",
                    ToolParameter::string(
                        "The name of the package to install, including an optional version (e.g. `lodash`, `lodash@4.x.x`, etc.)",
                    ),
                    true,
                )
                .with_property(
                    "development",
                    ToolParameter::boolean(
                        "Whether to install the package as a development dependency",
                    ),
                    false,
                ),
        }
    }

    fn build_command(&self, input: &ToolInput) -> Result<CommandSpec, ToolError> {
        let input = InstallPackageInput::from_tool_input(input)?;
        Ok(CommandSpec::new(self.package_manager.clone(), input.args()))
    }
}

/// `<pm> uninstall <package>`
#[derive(Debug, Clone)]
pub struct UninstallPackageTool {
    package_manager: String,
}

impl UninstallPackageTool {
    pub fn new(package_manager: impl Into<String>) -> Self {
        Self {
            package_manager: package_manager.into(),
        }
    }
}

impl CommandTool for UninstallPackageTool {
    fn name(&self) -> &str {
        UNINSTALL_PACKAGE
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: UNINSTALL_PACKAGE.to_string(),
            description: "Uninstall an npm package".to_string(),
            parameters: ToolParametersDefinition::object().with_property(
                "package",
                ToolParameter::string("The name of the package to uninstall"),
                true,
            ),
        }
    }

    fn build_command(&self, input: &ToolInput) -> Result<CommandSpec, ToolError> {
        let input = UninstallPackageInput::from_tool_input(input)?;
        Ok(CommandSpec::new(self.package_manager.clone(), input.args()))
    }
}
