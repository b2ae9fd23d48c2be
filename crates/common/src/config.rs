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

//! Configuration system for HDB
//!
//! Holds the static defaults of a debug session: which binaries to call, the
//! caller and gas handed to hevm, and where temporary files and the persisted
//! hevm state live relative to the workspace. Values can be overridden from a
//! TOML file, either `hdb.toml` in the workspace or `~/.hdb.toml`.

use alloy_primitives::{address, Address};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// File name of the per-workspace configuration file.
pub const PROJECT_CONFIG_FILE: &str = "hdb.toml";

/// File name of the per-user configuration file, placed in the home directory.
pub const USER_CONFIG_FILE: &str = ".hdb.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings of the hevm debugger invocation
    pub hevm: HevmConfig,
    /// Settings of the huff compiler invocation
    pub compiler: CompilerConfig,
}

/// hevm settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HevmConfig {
    /// Name or path of the hevm binary
    pub binary: String,
    /// Caller address for both deployment and the debug session
    pub caller: Address,
    /// Gas limit handed to hevm
    pub gas: u64,
    /// hevm state repository, relative to the workspace
    pub state_path: PathBuf,
    /// File the assembled debugger command is written to, relative to the workspace
    pub temp_command_file: PathBuf,
}

impl Default for HevmConfig {
    fn default() -> Self {
        Self {
            binary: "hevm".to_string(),
            caller: address!("0x0000000000000000000000000000000000000420"),
            gas: 0xffff_ffff,
            state_path: PathBuf::from("cache/huff_debug_hevm_state"),
            temp_command_file: PathBuf::from("cache/hevmtemp"),
        }
    }
}

/// huffc settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Name or path of the huffc binary
    pub binary: String,
    /// File the flattened source is written to before compiling, relative to the workspace
    pub temp_source_file: PathBuf,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self { binary: "huffc".to_string(), temp_source_file: PathBuf::from("cache/tempMacro.huff") }
    }
}

impl Config {
    /// Get the per-user config file path (`~/.hdb.toml`)
    pub fn user_config_path() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| eyre::eyre!("Unable to determine home directory"))?;
        Ok(home.join(USER_CONFIG_FILE))
    }

    /// Get the workspace config file path (`<cwd>/hdb.toml`)
    pub fn project_config_path(cwd: impl AsRef<Path>) -> PathBuf {
        cwd.as_ref().join(PROJECT_CONFIG_FILE)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as TOML: {path:?}"))?;

        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Find and load the configuration that applies to a workspace
    ///
    /// Looks at `<cwd>/hdb.toml` first, then `~/.hdb.toml`, and falls back to the
    /// built-in defaults when neither exists.
    pub fn discover(cwd: impl AsRef<Path>) -> Result<Self> {
        let project = Self::project_config_path(&cwd);
        if project.is_file() {
            return Self::load_from(project);
        }

        if let Ok(user) = Self::user_config_path() {
            if user.is_file() {
                return Self::load_from(user);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Save configuration to a file, creating parent directories as needed
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {parent:?}"))?;
        }

        let content = self.to_toml()?;
        fs::write(path, content).with_context(|| format!("Failed to write config file: {path:?}"))?;

        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Render the configuration as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.hevm.binary, "hevm");
        assert_eq!(config.hevm.gas, 0xffffffff);
        assert_eq!(config.hevm.state_path, PathBuf::from("cache/huff_debug_hevm_state"));
        assert_eq!(config.compiler.binary, "huffc");
        assert_eq!(config.compiler.temp_source_file, PathBuf::from("cache/tempMacro.huff"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(&path, "[hevm]\ngas = 1000\n\n[compiler]\nbinary = \"/opt/huff/huffc\"\n")
            .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.hevm.gas, 1000);
        assert_eq!(config.hevm.binary, "hevm");
        assert_eq!(config.compiler.binary, "/opt/huff/huffc");
        assert_eq!(config.compiler.temp_source_file, CompilerConfig::default().temp_source_file);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hdb.toml");

        let mut config = Config::default();
        config.hevm.caller = address!("0x00000000000000000000000000000000000000ca");
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[hevm\ngas = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn test_discover_prefers_project_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(Config::project_config_path(dir.path()), "[hevm]\ngas = 42\n").unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.hevm.gas, 42);
    }
}
