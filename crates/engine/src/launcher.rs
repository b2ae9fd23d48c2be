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

//! Debug session launch
//!
//! A [`DebugCommand`] is the interactive `hevm exec --debug` invocation. How it
//! reaches the user's terminal is up to a [`CommandDispatcher`]:
//!
//! - [`TempFileDispatcher`] persists the command to a file and runs
//!   `` `cat <file>` `` in a shell, for hosts that cap the length of a directly
//!   executed command line.
//! - [`DirectDispatcher`] executes the same tokens directly.

use crate::{format_address, BuildConfig, Bytecode, Calldata};
use alloy_primitives::Address;
use std::{
    fs, io,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::Arc,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while launching the debugger.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The command file could not be written
    #[error("failed to write debugger command to {}: {source}", path.display())]
    WriteCommand {
        /// Command file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
    /// The terminal could not start the session
    #[error("failed to start the debug session: {0}")]
    Terminal(#[source] io::Error),
}

/// The interactive debugger invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugCommand {
    /// Debugger binary
    pub program: String,
    /// Runtime bytecode to execute
    pub code: Bytecode,
    /// Address the code runs at
    pub address: Address,
    /// Caller of the transaction
    pub caller: Address,
    /// Gas limit as a hex literal
    pub gas: String,
    /// State repository, when state is enabled
    pub state: Option<PathBuf>,
    /// Calldata, omitted from the command when absent
    pub calldata: Option<Calldata>,
}

impl DebugCommand {
    /// Assemble the command for `code` from the session configuration.
    pub fn new(
        config: &BuildConfig,
        cwd: &Path,
        code: Bytecode,
        calldata: Option<Calldata>,
    ) -> Self {
        Self {
            program: config.hevm.binary.clone(),
            code,
            address: config.contract_address,
            caller: config.hevm.caller,
            gas: config.gas_hex(),
            state: config.state_path(cwd),
            calldata,
        }
    }

    /// Arguments following the program name.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "exec".to_string(),
            "--code".to_string(),
            self.code.to_string(),
            "--address".to_string(),
            format_address(&self.address),
            "--caller".to_string(),
            format_address(&self.caller),
            "--gas".to_string(),
            self.gas.clone(),
        ];

        if let Some(state) = &self.state {
            args.push("--state".to_string());
            args.push(state.to_string_lossy().into_owned());
        }

        args.push("--debug".to_string());

        if let Some(calldata) = &self.calldata {
            args.push("--calldata".to_string());
            args.push(calldata.to_string());
        }

        args
    }

    /// The full command as one line of shell text.
    pub fn to_shell_string(&self) -> String {
        std::iter::once(self.program.clone()).chain(self.args()).collect::<Vec<_>>().join(" ")
    }
}

/// Where the debugger finally runs.
pub trait Terminal: Send + Sync {
    /// Run `script` with `sh -c`.
    fn run_shell(&self, script: &str) -> io::Result<()>;

    /// Run `program` with `args`, without a shell.
    fn run_program(&self, program: &str, args: &[String]) -> io::Result<()>;
}

/// The terminal HDB was started from: the session inherits stdin, stdout and
/// stderr and HDB waits until the user leaves the debugger.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserTerminal;

impl UserTerminal {
    fn wait(mut command: Command) -> io::Result<()> {
        let status = command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;

        if status.success() {
            debug!("Debug session finished");
        } else {
            warn!("Debug session exited with {}", status);
        }
        Ok(())
    }
}

impl Terminal for UserTerminal {
    fn run_shell(&self, script: &str) -> io::Result<()> {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        Self::wait(command)
    }

    fn run_program(&self, program: &str, args: &[String]) -> io::Result<()> {
        let mut command = Command::new(program);
        command.args(args);
        Self::wait(command)
    }
}

/// How a command was handed to the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The command was persisted to this file and run through `cat`
    CommandFile(PathBuf),
    /// The command was executed directly
    Direct,
}

/// Hands a [`DebugCommand`] to a [`Terminal`].
pub trait CommandDispatcher: Send + Sync {
    /// Launch `command` for the workspace at `cwd`.
    fn dispatch(
        &self,
        command: &DebugCommand,
        cwd: &Path,
        config: &BuildConfig,
    ) -> Result<Dispatch, LaunchError>;
}

/// Persists the command to the configured file and runs `` `cat <file>` ``.
#[derive(Clone)]
pub struct TempFileDispatcher {
    terminal: Arc<dyn Terminal>,
}

impl TempFileDispatcher {
    /// Dispatch through `terminal`.
    pub fn new(terminal: Arc<dyn Terminal>) -> Self {
        Self { terminal }
    }
}

impl Default for TempFileDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(UserTerminal))
    }
}

impl CommandDispatcher for TempFileDispatcher {
    fn dispatch(
        &self,
        command: &DebugCommand,
        cwd: &Path,
        config: &BuildConfig,
    ) -> Result<Dispatch, LaunchError> {
        let path = config.command_file(cwd);
        let write_err = |source| LaunchError::WriteCommand { path: path.clone(), source };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&path, command.to_shell_string()).map_err(write_err)?;
        debug!("Debugger command written to {}", path.display());

        info!("Entering debugger...");
        self.terminal
            .run_shell(&format!("`cat {}`", path.display()))
            .map_err(LaunchError::Terminal)?;

        Ok(Dispatch::CommandFile(path))
    }
}

/// Executes the command directly, for hosts without a command-length ceiling.
#[derive(Clone)]
pub struct DirectDispatcher {
    terminal: Arc<dyn Terminal>,
}

impl DirectDispatcher {
    /// Dispatch through `terminal`.
    pub fn new(terminal: Arc<dyn Terminal>) -> Self {
        Self { terminal }
    }
}

impl Default for DirectDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(UserTerminal))
    }
}

impl CommandDispatcher for DirectDispatcher {
    fn dispatch(
        &self,
        command: &DebugCommand,
        _cwd: &Path,
        _config: &BuildConfig,
    ) -> Result<Dispatch, LaunchError> {
        info!("Entering debugger...");
        self.terminal
            .run_program(&command.program, &command.args())
            .map_err(LaunchError::Terminal)?;
        Ok(Dispatch::Direct)
    }
}
