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

//! Contract deployment through `hevm exec --create`.

use super::{find_binary, run_tool, Deployer, ToolError};
use crate::{ensure_state_repo, format_address, BuildConfig, Bytecode};
use std::{path::Path, process::Command};
use tracing::{debug, info};

/// Deploys through a locally installed `hevm`.
#[derive(Debug, Clone)]
pub struct Hevm {
    binary: String,
    prefix_args: Vec<String>,
}

impl Hevm {
    /// Use `binary` (a name on PATH or a path) as hevm.
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into(), prefix_args: Vec::new() }
    }

    /// Run hevm through a wrapper; `prefix_args` precede hevm's own arguments.
    pub fn with_args(binary: impl Into<String>, prefix_args: Vec<String>) -> Self {
        Self { binary: binary.into(), prefix_args }
    }

    /// Arguments of the constructor run.
    pub fn deploy_args(bytecode: &Bytecode, cwd: &Path, config: &BuildConfig) -> Vec<String> {
        let mut args = vec![
            "exec".to_string(),
            "--code".to_string(),
            bytecode.to_string(),
            "--address".to_string(),
            format_address(&config.contract_address),
            "--create".to_string(),
            "--caller".to_string(),
            format_address(&config.hevm.caller),
            "--gas".to_string(),
            config.gas_hex(),
        ];

        if let Some(state) = config.state_path(cwd) {
            args.push("--state".to_string());
            args.push(state.to_string_lossy().into_owned());
        }

        args
    }
}

impl Default for Hevm {
    fn default() -> Self {
        Self::new("hevm")
    }
}

impl Deployer for Hevm {
    fn name(&self) -> &str {
        &self.binary
    }

    fn check_installed(&self, config: &BuildConfig) -> Result<(), ToolError> {
        find_binary(&self.binary)?;
        // The state directory is a git repository managed through `git`.
        if config.state {
            find_binary("git")?;
        }
        Ok(())
    }

    fn deploy(
        &self,
        bytecode: &Bytecode,
        cwd: &Path,
        config: &BuildConfig,
    ) -> Result<Bytecode, ToolError> {
        if config.state {
            ensure_state_repo(cwd, &config.hevm)?;
        }

        info!(
            "Deploying {} bytes at {} with {}",
            bytecode.len(),
            format_address(&config.contract_address),
            self.binary
        );
        let output = run_tool(
            &self.binary,
            Command::new(&self.binary)
                .args(&self.prefix_args)
                .args(Self::deploy_args(bytecode, cwd, config))
                .current_dir(cwd),
        )?;

        let runtime = Bytecode::from_tool_output(&output)
            .ok_or_else(|| ToolError::InvalidOutput { tool: self.binary.clone(), output })?;

        debug!(bytes = runtime.len(), "Runtime bytecode");
        Ok(runtime)
    }
}
