// HDB - Huff Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! HDB - Huff Debugger
//!
//! Compiles a Huff contract, deploys it into a local hevm state and drops the
//! user into hevm's interactive debugger on a chosen call.

use clap::{Parser, Subcommand};
use eyre::Result;
use hdb_engine::Argument;
use std::path::PathBuf;
use tracing::Level;

mod cmd;
mod utils;

/// Command-line interface for HDB
#[derive(Debug, Parser)]
#[command(name = "hdb")]
#[command(about = "Huff Debugger - Compile, deploy and step through Huff contracts in hevm")]
#[command(version)]
pub struct Cli {
    /// Workspace root every file path is resolved against (default: current directory)
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Configuration file (default: <cwd>/hdb.toml, then ~/.hdb.toml)
    #[arg(long, global = true, env = "HDB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level (repeat for more: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compile, deploy and debug a call into a Huff contract
    Debug(DebugArgs),
    /// Encode calldata for a function call
    Calldata {
        /// 4-byte function selector, e.g. a9059cbb
        selector: String,
        /// Call argument as TYPE:VALUE, in order (repeatable)
        #[arg(long = "arg", value_name = "TYPE:VALUE")]
        args: Vec<Argument>,
    },
    /// Print the address a file is deployed to
    Address {
        /// Huff file, relative to the workspace root
        file: PathBuf,
    },
    /// Print a file with its includes inlined
    Flatten {
        /// Huff file, relative to the workspace root
        file: PathBuf,
        /// Include to inline, e.g. '#include "./utils.huff"' (default: the file's own includes)
        #[arg(long = "import", value_name = "INCLUDE")]
        imports: Vec<String>,
    },
    /// Verify huffc and hevm are installed
    Check,
    /// Wipe the persisted hevm state
    ResetState,
    /// Delete temporary files left by earlier sessions
    PurgeCache,
    /// Print the effective configuration
    Config {
        /// Write the configuration to <cwd>/hdb.toml instead
        #[arg(long)]
        init: bool,
    },
}

/// Arguments of the debug command
#[derive(Debug, clap::Args)]
pub struct DebugArgs {
    /// Huff file, relative to the workspace root
    pub file: PathBuf,

    /// 4-byte function selector of the call (omit to debug with empty calldata)
    #[arg(long)]
    pub selector: Option<String>,

    /// Call argument as TYPE:VALUE, in order (repeatable)
    #[arg(long = "arg", value_name = "TYPE:VALUE", requires = "selector")]
    pub args: Vec<Argument>,

    /// Include to inline, e.g. '#include "./utils.huff"' (default: the file's own includes)
    #[arg(long = "import", value_name = "INCLUDE")]
    pub imports: Vec<String>,

    /// Run without the persisted hevm state
    #[arg(long)]
    pub no_state: bool,

    /// Execute hevm directly instead of through a command file
    #[arg(long)]
    pub direct: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    hdb_common::init_logging("hdb", true, level)?;

    let cwd = utils::resolve_cwd(cli.cwd.as_deref())?;
    tracing::info!("Using workspace root {}", cwd.display());

    match &cli.command {
        Commands::Debug(args) => cmd::debug(&cli, &cwd, args).await,
        Commands::Calldata { selector, args } => cmd::calldata(selector, args),
        Commands::Address { file } => cmd::address(file),
        Commands::Flatten { file, imports } => cmd::flatten(&cwd, file, imports),
        Commands::Check => cmd::check(&cli, &cwd),
        Commands::ResetState => cmd::reset_state(&cli, &cwd),
        Commands::PurgeCache => cmd::purge_cache(&cli, &cwd),
        Commands::Config { init } => cmd::show_config(&cli, &cwd, *init),
    }
}
