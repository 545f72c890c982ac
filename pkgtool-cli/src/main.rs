// pkgtool-cli/src/main.rs
mod models;
mod rendering;

use anyhow::{anyhow, Context, Result};
use colored::*;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use time::macros::format_description;
use tracing::{debug, error, info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use pkgtool_core::tools::package::{INSTALL_PACKAGE, UNINSTALL_PACKAGE};
use pkgtool_core::{
    ExecutionContext, PackageToolProvider, ToolDefinition, ToolInput, ToolOutcome, ToolProvider,
    ToolsConfig,
};

use crate::models::cli::{Cli, Commands};
use crate::rendering::{render_definitions, render_outcome};

const CONFIG_FILENAME: &str = "PkgTool.toml";
const LOG_FILE_NAME: &str = "pkgtool.log";

/// Walks from `start` up to the filesystem root looking for [`CONFIG_FILENAME`].
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let config_path = dir.join(CONFIG_FILENAME);
        if config_path.is_file() {
            return Some(config_path);
        }
        current = dir.parent();
    }
    None
}

fn load_config(explicit_path: Option<&Path>, search_from: &Path) -> Result<ToolsConfig> {
    let config_path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => match find_config_file(search_from) {
            Some(path) => path,
            None => {
                info!("No {} found, using default configuration.", CONFIG_FILENAME);
                return Ok(ToolsConfig::default());
            }
        },
    };
    info!("Using configuration file at: {:?}", config_path);
    let config_toml_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
    ToolsConfig::from_toml_str(&config_toml_content)
        .with_context(|| format!("Failed to parse or validate {:?}", config_path))
}

fn build_context(config: &ToolsConfig, working_dir: PathBuf) -> ExecutionContext {
    ExecutionContext::inheriting_env(working_dir, &config.shell).with_envs(config.env.iter())
}

/// Maps a CLI command onto a tool call. `None` for commands that do not run a tool.
fn tool_request(command: Commands) -> Result<Option<(String, ToolInput)>> {
    match command {
        Commands::List => Ok(None),
        Commands::Install { package, dev } => Ok(Some((
            INSTALL_PACKAGE.to_string(),
            ToolInput::default()
                .with_argument("package", package)
                .with_argument("development", dev),
        ))),
        Commands::Uninstall { package } => Ok(Some((
            UNINSTALL_PACKAGE.to_string(),
            ToolInput::default().with_argument("package", package),
        ))),
        Commands::Call { tool, input } => {
            let value: serde_json::Value = serde_json::from_str(&input)
                .with_context(|| format!("--input is not valid JSON: {}", input))?;
            let input = ToolInput::from_json(value).map_err(|e| anyhow!(e))?;
            Ok(Some((tool, input)))
        }
    }
}

/// Writes the tool listing: the coloured summary by default, the full schemas with `json`.
fn write_listing<W: Write>(
    writer: &mut W,
    definitions: &[ToolDefinition],
    json: bool,
) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(definitions)
            .context("Failed to serialize tool definitions")?;
        writeln!(writer, "{}", rendered)?;
    } else {
        render_definitions(writer, definitions)?;
    }
    Ok(())
}

/// Runs one tool, cancelling it on Ctrl-C. Returns whether the tool succeeded.
async fn handle_tool_call(
    provider: &PackageToolProvider,
    tool_name: &str,
    input: ToolInput,
    context: ExecutionContext,
    json: bool,
) -> Result<bool> {
    let token = context.cancellation.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling running tool.");
            token.cancel();
        }
    });

    let result = provider.execute_tool(tool_name, input, context).await;
    interrupt.abort();
    let outcome: ToolOutcome =
        result.with_context(|| format!("Failed to run tool '{}'", tool_name))?;

    let mut stdout = io::stdout();
    if json {
        let rendered =
            serde_json::to_string_pretty(&outcome).context("Failed to serialize tool outcome")?;
        writeln!(stdout, "{}", rendered)?;
    } else {
        render_outcome(&mut stdout, tool_name, &outcome)?;
    }
    Ok(outcome.is_success())
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Directory for `pkgtool.log`: the user cache dir, falling back to the runtime and temp dirs.
fn log_directory() -> PathBuf {
    dirs::cache_dir()
        .or_else(dirs::runtime_dir)
        .unwrap_or_else(env::temp_dir)
        .join("pkgtool")
}

/// Installs the stderr and file subscribers. The returned guard flushes the file
/// writer on drop, so it must live until the end of `main`.
fn init_logging(verbose: u8) -> Result<WorkerGuard> {
    let default_level = log_level(verbose);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    let log_dir = log_directory();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let local_timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));
    let file_layer = fmt::layer()
        .with_writer(non_blocking_writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_timer(local_timer.clone());
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(local_timer)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    info!(
        level = %default_level,
        log_file = %log_dir.join(LOG_FILE_NAME).display(),
        "Logging initialized (RUST_LOG overrides the -v level)"
    );
    Ok(guard)
}

async fn run(cli: Cli) -> Result<bool> {
    let current_dir = env::current_dir().context("Failed to get current directory")?;
    let config = load_config(cli.config.as_deref(), &current_dir)?;
    debug!(?config, "Loaded configuration");
    let provider = PackageToolProvider::new(&config);

    match tool_request(cli.command)? {
        None => {
            write_listing(&mut io::stdout(), &provider.get_tool_definitions(), cli.json)?;
            Ok(true)
        }
        Some((tool_name, input)) => {
            let working_dir = cli.cwd.unwrap_or(current_dir);
            let context = build_context(&config, working_dir);
            handle_tool_call(&provider, &tool_name, input, context, cli.json).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Ensure colored output is enabled for early errors
    colored::control::set_override(true);

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let _guard = match init_logging(cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            return ExitCode::FAILURE;
        }
    };
    colored::control::unset_override();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Operation failed: {:#}", e);
            eprintln!("{} {:#}", "Error:".red(), e);
            ExitCode::FAILURE
        }
    }
}
