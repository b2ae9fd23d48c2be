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

//! Housekeeping of the files HDB leaves in a workspace
//!
//! hevm persists state in a directory that must be a git repository. These
//! helpers create or wipe that repository and remove the temporary source and
//! command files of earlier sessions.

use crate::toolchain::{run_tool, ToolError};
use hdb_common::{Config, HevmConfig};
use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, info};

/// Create the hevm state repository if it does not exist yet.
///
/// An existing directory without a repository is initialized in place and
/// keeps its contents. Returns the absolute path of the repository.
pub fn ensure_state_repo(cwd: &Path, hevm: &HevmConfig) -> Result<PathBuf, ToolError> {
    let state = cwd.join(&hevm.state_path);
    if state.join(".git").exists() {
        debug!("State repository already initialized at {}", state.display());
        return Ok(state);
    }

    fs::create_dir_all(&state).map_err(|source| ToolError::Io { path: state.clone(), source })?;
    init_repo(&state)?;
    Ok(state)
}

/// Wipe the hevm state repository and initialize an empty one.
///
/// Every account and storage slot recorded by earlier sessions is lost.
pub fn reset_state_repo(cwd: &Path, hevm: &HevmConfig) -> Result<PathBuf, ToolError> {
    let state = cwd.join(&hevm.state_path);
    let io_err = |source| ToolError::Io { path: state.clone(), source };

    if state.exists() {
        fs::remove_dir_all(&state).map_err(io_err)?;
    }
    fs::create_dir_all(&state).map_err(io_err)?;
    init_repo(&state)?;
    Ok(state)
}

fn init_repo(state: &Path) -> Result<(), ToolError> {
    run_tool("git", Command::new("git").args(["init", "--quiet"]).current_dir(state))?;
    info!("Initialized hevm state repository at {}", state.display());
    Ok(())
}

/// Delete the temporary command and source files, if present.
///
/// Returns the files that were removed.
pub fn purge_cache(cwd: &Path, config: &Config) -> Result<Vec<PathBuf>, ToolError> {
    let mut removed = Vec::new();

    for path in
        [cwd.join(&config.hevm.temp_command_file), cwd.join(&config.compiler.temp_source_file)]
    {
        if !path.is_file() {
            continue;
        }
        fs::remove_file(&path).map_err(|source| ToolError::Io { path: path.clone(), source })?;
        debug!("Removed {}", path.display());
        removed.push(path);
    }

    info!("Purged {} temporary file(s)", removed.len());
    Ok(removed)
}
