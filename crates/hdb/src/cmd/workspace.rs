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

//! Toolchain, state and configuration housekeeping commands

use crate::utils::load_config;
use eyre::{bail, Result};
use hdb_common::Config;
use hdb_engine::find_binary;
use std::path::Path;

/// Report where each required tool was found
pub fn check(cli: &crate::Cli, cwd: &Path) -> Result<()> {
    let config = load_config(cli, cwd)?;
    let tools = [config.compiler.binary.as_str(), config.hevm.binary.as_str(), "git"];

    let mut missing = Vec::new();
    for tool in tools {
        match find_binary(tool) {
            Ok(path) => println!("✅ {tool}: {}", path.display()),
            Err(e) => {
                println!("❌ {e}");
                missing.push(tool);
            }
        }
    }

    if !missing.is_empty() {
        bail!("Missing tools: {}", missing.join(", "));
    }
    Ok(())
}

/// Wipe and re-initialize the hevm state repository
pub fn reset_state(cli: &crate::Cli, cwd: &Path) -> Result<()> {
    let config = load_config(cli, cwd)?;
    let state = hdb_engine::reset_state_repo(cwd, &config.hevm)?;
    println!("Reset hevm state at {}", state.display());
    Ok(())
}

/// Remove the temporary source and command files
pub fn purge_cache(cli: &crate::Cli, cwd: &Path) -> Result<()> {
    let config = load_config(cli, cwd)?;
    let removed = hdb_engine::purge_cache(cwd, &config)?;

    if removed.is_empty() {
        println!("Nothing to purge");
    }
    for path in removed {
        println!("Removed {}", path.display());
    }
    Ok(())
}

/// Print the effective configuration, or write it to `<cwd>/hdb.toml`
pub fn show_config(cli: &crate::Cli, cwd: &Path, init: bool) -> Result<()> {
    let config = load_config(cli, cwd)?;

    if !init {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let path = Config::project_config_path(cwd);
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    config.save_to(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
