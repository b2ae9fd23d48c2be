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

//! Per-invocation build configuration and bytecode values.

use alloy_primitives::{keccak256, Address};
use hdb_common::{CompilerConfig, Config, HevmConfig};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Deterministic contract address for a source file.
///
/// The address is the first 20 bytes of `keccak256(path)` over the path's raw
/// bytes, so repeated sessions on the same file deploy to the same account in
/// the persisted state. For UTF-8 paths these are the UTF-8 bytes.
pub fn contract_address(path: &Path) -> Address {
    let hash = keccak256(path.as_os_str().as_encoded_bytes());
    Address::from_slice(&hash[..20])
}

/// Render an address as lowercase `0x`-prefixed hex, the form hevm is given.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Immutable configuration of a single debug invocation.
///
/// Built once from the loaded [`Config`] and the current file; nothing mutates it
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// hevm settings
    pub hevm: HevmConfig,
    /// huffc settings
    pub compiler: CompilerConfig,
    /// Address the contract is deployed to
    pub contract_address: Address,
    /// Whether the persisted hevm state is used
    pub state: bool,
}

impl BuildConfig {
    /// Merge the static configuration with the address computed for `current_file`.
    pub fn new(config: &Config, current_file: &Path, state: bool) -> Self {
        Self {
            hevm: config.hevm.clone(),
            compiler: config.compiler.clone(),
            contract_address: contract_address(current_file),
            state,
        }
    }

    /// Absolute state repository path, when state is enabled.
    pub fn state_path(&self, cwd: &Path) -> Option<PathBuf> {
        self.state.then(|| cwd.join(&self.hevm.state_path))
    }

    /// Absolute path of the file holding the assembled debugger command.
    pub fn command_file(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.hevm.temp_command_file)
    }

    /// Absolute path of the file the flattened source is compiled from.
    pub fn source_file(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.compiler.temp_source_file)
    }

    /// Gas limit as the hex literal passed to hevm.
    pub fn gas_hex(&self) -> String {
        format!("{:#x}", self.hevm.gas)
    }
}

/// Hex bytecode produced by an external tool.
///
/// The content is opaque; it is only normalised to a single `0x` prefix and
/// checked to be hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bytecode(String);

impl Bytecode {
    /// Read bytecode from tool output, using its last non-empty line.
    ///
    /// Returns `None` when there is no output or it is not hex.
    pub fn from_tool_output(output: &str) -> Option<Self> {
        let line = output.lines().map(str::trim).filter(|l| !l.is_empty()).last()?;
        let digits = line.strip_prefix("0x").unwrap_or(line);

        if digits.is_empty() || hex::decode(digits).is_err() {
            return None;
        }

        Some(Self(format!("0x{digits}")))
    }

    /// The `0x`-prefixed hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the code in bytes.
    pub fn len(&self) -> usize {
        (self.0.len() - 2) / 2
    }

    /// Whether the code is empty; always false for values built by this type.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_stable() {
        let path = Path::new("src/Token.huff");
        assert_eq!(contract_address(path), contract_address(path));
        assert_eq!(format_address(&contract_address(path)).len(), 42);
    }

    #[test]
    fn test_address_differs_per_path() {
        assert_ne!(
            contract_address(Path::new("src/Token.huff")),
            contract_address(Path::new("src/Vault.huff"))
        );
    }

    #[test]
    fn test_address_is_hash_prefix() {
        let hash = keccak256(b"A.src");
        assert_eq!(format_address(&contract_address(Path::new("A.src"))), format!("0x{}", hex::encode(&hash[..20])));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_paths_get_distinct_addresses() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        // Both paths lossily convert to "A\u{FFFD}.huff".
        let first = Path::new(OsStr::from_bytes(b"A\xff.huff"));
        let second = Path::new(OsStr::from_bytes(b"A\xfe.huff"));
        assert_eq!(first.to_string_lossy(), second.to_string_lossy());
        assert_ne!(contract_address(first), contract_address(second));
    }

    #[test]
    fn test_state_path_follows_flag() {
        let config = Config::default();
        let cwd = Path::new("/work");

        let with_state = BuildConfig::new(&config, Path::new("A.huff"), true);
        assert_eq!(with_state.state_path(cwd), Some(cwd.join("cache/huff_debug_hevm_state")));

        let without_state = BuildConfig::new(&config, Path::new("A.huff"), false);
        assert_eq!(without_state.state_path(cwd), None);
        assert_eq!(without_state.gas_hex(), "0xffffffff");
    }

    #[test]
    fn test_bytecode_from_tool_output() {
        let code = Bytecode::from_tool_output("warning: something\n600160005260206000f3\n").unwrap();
        assert_eq!(code.as_str(), "0x600160005260206000f3");
        assert_eq!(code.len(), 10);

        assert_eq!(Bytecode::from_tool_output("0xdead\n").unwrap().as_str(), "0xdead");
        assert!(Bytecode::from_tool_output("").is_none());
        assert!(Bytecode::from_tool_output("0x").is_none());
        assert!(Bytecode::from_tool_output("error: unexpected token").is_none());
    }
}
