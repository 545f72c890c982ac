// pkgtool-core/src/config.rs

//! Handles configuration structures and parsing for the tool library.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::tools::runner::RunnerSettings;

pub const DEFAULT_PACKAGE_MANAGER: &str = "npm";
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 2000;

pub fn default_shell() -> String {
    if cfg!(target_os = "windows") {
        "cmd.exe".to_string()
    } else {
        "/bin/sh".to_string()
    }
}

fn default_package_manager() -> String {
    DEFAULT_PACKAGE_MANAGER.to_string()
}

fn default_drain_timeout_ms() -> u64 {
    DEFAULT_DRAIN_TIMEOUT_MS
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ToolsConfig {
    /// Executable used by the package tools.
    #[serde(default = "default_package_manager")]
    pub package_manager: String,
    /// Shell that interprets the command line.
    #[serde(default = "default_shell")]
    pub shell: String,
    /// How long to keep reading output after the process has exited.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
    /// Variables layered over the caller's environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            package_manager: default_package_manager(),
            shell: default_shell(),
            drain_timeout_ms: default_drain_timeout_ms(),
            env: BTreeMap::new(),
        }
    }
}

impl ToolsConfig {
    pub fn from_toml_str(config_toml_content: &str) -> Result<ToolsConfig> {
        let config: ToolsConfig = match toml::from_str(config_toml_content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    content = %config_toml_content,
                    "Failed to parse TOML content"
                );
                return Err(anyhow!(e))
                    .context("Failed to parse configuration TOML content. Check TOML syntax.");
            }
        };

        if config.package_manager.trim().is_empty() {
            return Err(anyhow!("'package_manager' in config content is empty."));
        }
        if config.shell.trim().is_empty() {
            return Err(anyhow!("'shell' in config content is empty."));
        }
        if config.drain_timeout_ms == 0 {
            return Err(anyhow!("'drain_timeout_ms' must be greater than zero."));
        }
        for key in config.env.keys() {
            if key.is_empty() || key.contains('=') {
                return Err(anyhow!("Invalid environment variable name in [env]: '{}'", key));
            }
        }

        tracing::info!("Successfully parsed and validated tools configuration.");
        Ok(config)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn runner_settings(&self) -> RunnerSettings {
        RunnerSettings {
            drain_timeout: self.drain_timeout(),
        }
    }
}
