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

//! External tools the pipeline depends on
//!
//! The compiler and the deployer are collaborators behind the [`Compiler`] and
//! [`Deployer`] traits. The real implementations shell out to `huffc` and
//! `hevm`; tests substitute in-process fakes.

mod hevm;
mod huffc;

pub use hevm::Hevm;
pub use huffc::Huffc;

use crate::{BuildConfig, Bytecode, FlattenedSource};
use hdb_common::Config;
use std::{
    io,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
    sync::Arc,
};
use thiserror::Error;
use tracing::debug;

/// Errors raised by external tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The binary could not be located
    #[error("`{tool}` is not installed or not on PATH")]
    NotInstalled {
        /// Binary name
        tool: String,
    },
    /// The process could not be started
    #[error("failed to run `{tool}`: {source}")]
    Spawn {
        /// Binary name
        tool: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
    /// The process exited unsuccessfully
    #[error("`{tool}` exited with {status}: {stderr}")]
    Failed {
        /// Binary name
        tool: String,
        /// Exit status
        status: ExitStatus,
        /// Captured stderr, trimmed
        stderr: String,
    },
    /// The process succeeded but printed no bytecode
    #[error("`{tool}` produced no bytecode, output was {output:?}")]
    InvalidOutput {
        /// Binary name
        tool: String,
        /// Captured stdout
        output: String,
    },
    /// A file the tool needs could not be prepared
    #[error("failed to prepare {}: {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Turns a flattened source into deployable bytecode.
pub trait Compiler: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Verify the compiler can be invoked.
    fn check_installed(&self) -> Result<(), ToolError>;

    /// Compile `source`, with `cwd` as the workspace root.
    fn compile(
        &self,
        source: &FlattenedSource,
        cwd: &Path,
        config: &BuildConfig,
    ) -> Result<Bytecode, ToolError>;
}

/// Runs constructor logic and returns the code left installed at the address.
pub trait Deployer: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Verify the deployer (and whatever it needs for `config`) can be invoked.
    fn check_installed(&self, config: &BuildConfig) -> Result<(), ToolError>;

    /// Deploy `bytecode` at `config.contract_address` and return the runtime bytecode.
    fn deploy(
        &self,
        bytecode: &Bytecode,
        cwd: &Path,
        config: &BuildConfig,
    ) -> Result<Bytecode, ToolError>;
}

/// The compiler and deployer used by a session.
#[derive(Clone)]
pub struct Toolchain {
    /// Compiler collaborator
    pub compiler: Arc<dyn Compiler>,
    /// Deployer collaborator
    pub deployer: Arc<dyn Deployer>,
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("compiler", &self.compiler.name())
            .field("deployer", &self.deployer.name())
            .finish()
    }
}

impl Toolchain {
    /// Combine a compiler and a deployer.
    pub fn new(compiler: Arc<dyn Compiler>, deployer: Arc<dyn Deployer>) -> Self {
        Self { compiler, deployer }
    }

    /// The `huffc` + `hevm` toolchain named in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(Huffc::new(config.compiler.binary.clone())),
            Arc::new(Hevm::new(config.hevm.binary.clone())),
        )
    }

    /// Verify every tool is installed before any work is done.
    pub fn check_installations(&self, config: &BuildConfig) -> Result<(), ToolError> {
        self.compiler.check_installed()?;
        self.deployer.check_installed(config)?;
        debug!(
            compiler = self.compiler.name(),
            deployer = self.deployer.name(),
            "Toolchain is installed"
        );
        Ok(())
    }
}

/// Find a binary in the following order:
/// 1. As a path, when `name` contains a path separator
/// 2. Next to the current executable
/// 3. In the system PATH
pub fn find_binary(name: &str) -> Result<PathBuf, ToolError> {
    let not_installed = || ToolError::NotInstalled { tool: name.to_string() };

    let as_path = Path::new(name);
    if as_path.components().count() > 1 {
        return if as_path.is_file() { Ok(as_path.to_path_buf()) } else { Err(not_installed()) };
    }

    if let Some(dir) = std::env::current_exe().ok().as_deref().and_then(Path::parent) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            debug!("Found {} at {:?}", name, candidate);
            return Ok(candidate);
        }
    }

    #[cfg(unix)]
    let lookup = Command::new("which").arg(name).output();
    #[cfg(windows)]
    let lookup = Command::new("where").arg(name).output();

    if let Ok(output) = lookup {
        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some(path) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
                debug!("Found {} in PATH at {}", name, path);
                return Ok(PathBuf::from(path));
            }
        }
    }

    Err(not_installed())
}

/// Run `command` to completion and return its stdout.
///
/// A non-zero exit becomes [`ToolError::Failed`] carrying the trimmed stderr.
pub(crate) fn run_tool(tool: &str, command: &mut Command) -> Result<String, ToolError> {
    debug!(tool, ?command, "Running external tool");

    let output = command
        .output()
        .map_err(|source| ToolError::Spawn { tool: tool.to_string(), source })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            tool: tool.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
