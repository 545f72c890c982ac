// pkgtool-cli/src/models/cli.rs
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// pkgtool: package-manager operations exposed as agent tools.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase message verbosity.
    ///
    /// Specify multiple times for more verbose output:
    ///  -v:  INFO level
    ///  -vv: DEBUG level
    ///  -vvv: TRACE level (most verbose)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a PkgTool.toml. Defaults to searching the current directory and its parents.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Working directory for the package manager. Defaults to the current directory.
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Print the outcome as JSON instead of formatted text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// List the available tools and their input schemas.
    List,
    /// Install a package.
    Install {
        /// Package name with an optional version, e.g. `lodash` or `lodash@4.x.x`.
        package: String,
        /// Install as a development dependency.
        #[arg(short = 'D', long)]
        dev: bool,
    },
    /// Uninstall a package.
    Uninstall {
        /// Package name.
        package: String,
    },
    /// Call any tool by name with raw JSON arguments.
    Call {
        /// Tool name, e.g. `installPackage`.
        tool: String,
        /// JSON object with the tool arguments.
        #[arg(short, long, default_value = "{}")]
        input: String,
    },
}
