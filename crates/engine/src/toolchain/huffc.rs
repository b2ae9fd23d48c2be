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

//! The `huffc` compiler.

use super::{find_binary, run_tool, Compiler, ToolError};
use crate::{BuildConfig, Bytecode, FlattenedSource};
use std::{fs, path::Path, process::Command};
use tracing::{debug, info, warn};

/// Compiles through a locally installed `huffc`.
#[derive(Debug, Clone)]
pub struct Huffc {
    binary: String,
    prefix_args: Vec<String>,
}

impl Huffc {
    /// Use `binary` (a name on PATH or a path) as the compiler.
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into(), prefix_args: Vec::new() }
    }

    /// Run the compiler through a wrapper, e.g. `sh path/to/huffc.sh`.
    ///
    /// `prefix_args` are passed before the compiler's own arguments.
    pub fn with_args(binary: impl Into<String>, prefix_args: Vec<String>) -> Self {
        Self { binary: binary.into(), prefix_args }
    }
}

impl Default for Huffc {
    fn default() -> Self {
        Self::new("huffc")
    }
}

impl Compiler for Huffc {
    fn name(&self) -> &str {
        &self.binary
    }

    fn check_installed(&self) -> Result<(), ToolError> {
        find_binary(&self.binary).map(|_| ())
    }

    /// Write the source to the configured temporary file and run
    /// `huffc <file> --bytecode` from the workspace root.
    fn compile(
        &self,
        source: &FlattenedSource,
        cwd: &Path,
        config: &BuildConfig,
    ) -> Result<Bytecode, ToolError> {
        let source_file = config.source_file(cwd);
        if let Some(parent) = source_file.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ToolError::Io { path: parent.to_path_buf(), source })?;
        }
        fs::write(&source_file, source.as_str())
            .map_err(|e| ToolError::Io { path: source_file.clone(), source: e })?;

        info!("Compiling {} with {}", source_file.display(), self.binary);
        let output = run_tool(
            &self.binary,
            Command::new(&self.binary)
                .args(&self.prefix_args)
                .arg(&source_file)
                .arg("--bytecode")
                .current_dir(cwd),
        );

        // The temporary source is only an input to this one invocation.
        if let Err(e) = fs::remove_file(&source_file) {
            warn!("Failed to remove temporary source {}: {}", source_file.display(), e);
        }

        let output = output?;
        let bytecode = Bytecode::from_tool_output(&output)
            .ok_or_else(|| ToolError::InvalidOutput { tool: self.binary.clone(), output })?;

        debug!(bytes = bytecode.len(), "Compiled bytecode");
        Ok(bytecode)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use hdb_common::Config;

    /// A compiler backed by a shell script, run through `sh`.
    fn scripted_compiler(dir: &Path, script: &str) -> Huffc {
        let path = dir.join("huffc.sh");
        fs::write(&path, script).unwrap();
        Huffc::with_args("sh", vec![path.to_string_lossy().into_owned()])
    }

    #[test]
    fn test_compile_reads_stdout_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let huffc = scripted_compiler(
            dir.path(),
            "test \"$2\" = --bytecode || exit 9\ngrep -q MAIN \"$1\" || exit 8\necho 60016002\n",
        );

        let config = BuildConfig::new(&Config::default(), Path::new("A.huff"), true);
        let source = FlattenedSource::from_text("#define macro MAIN() = {}");

        let bytecode = huffc.compile(&source, dir.path(), &config).unwrap();
        assert_eq!(bytecode.as_str(), "0x60016002");
        assert!(!config.source_file(dir.path()).exists());
    }

    #[test]
    fn test_compile_failure_keeps_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let huffc = scripted_compiler(dir.path(), "echo 'Invalid Macro Body' >&2\nexit 1\n");

        let config = BuildConfig::new(&Config::default(), Path::new("A.huff"), true);
        let source = FlattenedSource::from_text("garbage");

        let err = huffc.compile(&source, dir.path(), &config).unwrap_err();
        assert!(matches!(err, ToolError::Failed { ref stderr, .. } if stderr == "Invalid Macro Body"));
        assert!(!config.source_file(dir.path()).exists());
    }

    #[test]
    fn test_empty_output_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let huffc = scripted_compiler(dir.path(), "exit 0\n");

        let config = BuildConfig::new(&Config::default(), Path::new("A.huff"), true);
        let source = FlattenedSource::from_text("");

        assert!(matches!(
            huffc.compile(&source, dir.path(), &config),
            Err(ToolError::InvalidOutput { .. })
        ));
    }
}
