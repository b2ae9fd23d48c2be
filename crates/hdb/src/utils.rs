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

//! Utility functions for the HDB binary

use eyre::{ensure, Result, WrapErr};
use hdb_common::Config;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// The workspace root: `--cwd` when given, the current directory otherwise.
pub fn resolve_cwd(cwd: Option<&Path>) -> Result<PathBuf> {
    let cwd = match cwd {
        Some(cwd) => cwd.to_path_buf(),
        None => std::env::current_dir().wrap_err("Failed to read the current directory")?,
    };
    ensure!(cwd.is_dir(), "Workspace root {} is not a directory", cwd.display());
    Ok(cwd)
}

/// Load the explicit `--config` file, or discover one for `cwd`.
pub fn load_config(cli: &crate::Cli, cwd: &Path) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::discover(cwd),
    }
}

/// The includes to inline before `file`.
///
/// Explicit imports win. Otherwise the file's own `#include` directives are
/// used; a file that cannot be read yields none, and flattening reports it.
pub fn resolve_imports(cwd: &Path, file: &Path, imports: &[String]) -> Vec<String> {
    if !imports.is_empty() {
        return imports.to_vec();
    }

    match fs::read_to_string(cwd.join(file)) {
        Ok(source) => {
            let found = hdb_engine::find_includes(&source);
            debug!("Discovered {} include(s) in {}", found.len(), file.display());
            found
        }
        Err(e) => {
            debug!("Could not scan {} for includes: {}", file.display(), e);
            Vec::new()
        }
    }
}
