// pkgtool-core/src/context.rs

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Everything a single tool invocation needs from its caller.
///
/// The environment is explicit: the child process sees exactly `env` and nothing
/// inherited implicitly. Use [`ExecutionContext::inheriting_env`] to start from the
/// current process environment.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub working_dir: PathBuf,
    pub shell: PathBuf,
    pub env: HashMap<OsString, OsString>,
    pub cancellation: CancellationToken,
}

impl ExecutionContext {
    /// A context with an empty environment and a fresh cancellation token.
    pub fn new(working_dir: impl Into<PathBuf>, shell: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            shell: shell.into(),
            env: HashMap::new(),
            cancellation: CancellationToken::new(),
        }
    }

    /// A context whose environment is a snapshot of the current process environment.
    pub fn inheriting_env(working_dir: impl Into<PathBuf>, shell: impl Into<PathBuf>) -> Self {
        Self::new(working_dir, shell).with_envs(std::env::vars_os())
    }

    pub fn with_env_var(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .insert(key.as_ref().to_os_string(), value.as_ref().to_os_string());
        self
    }

    pub fn with_envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        for (key, value) in vars {
            self.env
                .insert(key.as_ref().to_os_string(), value.as_ref().to_os_string());
        }
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}
