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

//! The debug session pipeline.
//!
//! A session takes a Huff file from source to an interactive debugger:
//!
//! 1. **Check**: verify the compiler and deployer are installed
//! 2. **Config**: compute the [`BuildConfig`] for the current file
//! 3. **Flatten**: inline the file's includes into one source unit
//! 4. **Encode**: build calldata from the selector and arguments
//! 5. **Compile**: turn the flattened source into bytecode
//! 6. **Deploy**: run the constructor and obtain the runtime bytecode
//! 7. **Launch**: hand the debugger command to the user's terminal
//!
//! Each step only runs when the previous one succeeded. The pipeline itself is
//! synchronous and runs on tokio's blocking pool, so a panic anywhere in it is
//! caught at [`DebugSession::run`] and reported as [`DebugError::Internal`].

use crate::{
    encode_calldata, flatten_file, launcher::LaunchError, Argument, BuildConfig, Bytecode,
    Calldata, CommandDispatcher, DebugCommand, Dispatch, EncodeError, FlattenError,
    TempFileDispatcher, ToolError, Toolchain,
};
use alloy_primitives::Address;
use hdb_common::Config;
use std::{fmt, path::PathBuf, sync::Arc};
use thiserror::Error;
use tracing::{debug, error, info};

/// Hint shown to the user when the build toolchain fails.
pub const HELP_HINT: &str = "Compilation failed, please contact the team in the huff discord";

/// Hint shown when a required tool is missing.
pub const INSTALL_HINT: &str = "Make sure huffc and hevm are installed and on your PATH";

/// Options of a debug request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugOptions {
    /// Run against the persisted hevm state
    pub state: bool,
}

impl Default for DebugOptions {
    fn default() -> Self {
        Self { state: true }
    }
}

/// Everything needed to debug one call into one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugRequest {
    /// Workspace root; every relative path is resolved against it
    pub cwd: PathBuf,
    /// The file to debug, relative to `cwd`
    pub current_file: PathBuf,
    /// Include fragments to inline before the current file
    pub imports: Vec<String>,
    /// Function selector; without one the call carries no calldata
    pub selector: Option<String>,
    /// Call arguments
    pub args: Vec<Argument>,
    /// Session options
    pub options: DebugOptions,
}

impl DebugRequest {
    /// A request for `current_file` with no imports, no calldata and state enabled.
    pub fn new(cwd: impl Into<PathBuf>, current_file: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            current_file: current_file.into(),
            imports: Vec::new(),
            selector: None,
            args: Vec::new(),
            options: DebugOptions::default(),
        }
    }

    /// Inline `imports` before the current file.
    pub fn with_imports(mut self, imports: Vec<String>) -> Self {
        self.imports = imports;
        self
    }

    /// Call `selector` with `args`.
    pub fn with_call(mut self, selector: impl Into<String>, args: Vec<Argument>) -> Self {
        self.selector = Some(selector.into());
        self.args = args;
        self
    }

    /// Replace the session options.
    pub fn with_options(mut self, options: DebugOptions) -> Self {
        self.options = options;
        self
    }
}

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Toolchain check
    Environment,
    /// Source flattening
    Flatten,
    /// Calldata encoding
    Encode,
    /// Compilation
    Compile,
    /// Deployment
    Deploy,
    /// Debugger launch
    Launch,
    /// Anything unexpected
    Internal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Environment => "environment",
            Self::Flatten => "flatten",
            Self::Encode => "encode",
            Self::Compile => "compile",
            Self::Deploy => "deploy",
            Self::Launch => "launch",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Errors that abort a debug session, one variant per stage.
#[derive(Debug, Error)]
pub enum DebugError {
    /// A required tool is not installed
    #[error("toolchain check failed: {0}")]
    Environment(#[source] ToolError),
    /// The source could not be flattened
    #[error("failed to flatten source: {0}")]
    Flatten(#[from] FlattenError),
    /// The calldata could not be encoded
    #[error("failed to encode calldata: {0}")]
    Encode(#[from] EncodeError),
    /// The compiler failed
    #[error("compilation failed: {0}")]
    Compile(#[source] ToolError),
    /// The deployer failed
    #[error("deployment failed: {0}")]
    Deploy(#[source] ToolError),
    /// The debugger could not be launched
    #[error("failed to launch debugger: {0}")]
    Launch(#[from] LaunchError),
    /// The pipeline panicked or could not be scheduled
    #[error("internal error: {0}")]
    Internal(String),
}

impl DebugError {
    /// Stage the error was raised in.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Environment(_) => Stage::Environment,
            Self::Flatten(_) => Stage::Flatten,
            Self::Encode(_) => Stage::Encode,
            Self::Compile(_) => Stage::Compile,
            Self::Deploy(_) => Stage::Deploy,
            Self::Launch(_) => Stage::Launch,
            Self::Internal(_) => Stage::Internal,
        }
    }

    /// What the user can do about the error, if there is anything to say.
    pub fn hint(&self) -> Option<&'static str> {
        match self.stage() {
            Stage::Environment => Some(INSTALL_HINT),
            Stage::Compile | Stage::Deploy | Stage::Internal => Some(HELP_HINT),
            Stage::Flatten | Stage::Encode | Stage::Launch => None,
        }
    }
}

/// Outcome of a launched session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    /// Address the contract was deployed to
    pub contract_address: Address,
    /// Calldata of the debugged call, if any
    pub calldata: Option<Calldata>,
    /// Runtime bytecode handed to the debugger
    pub runtime_bytecode: Bytecode,
    /// The debugger command
    pub command: DebugCommand,
    /// How the command reached the terminal
    pub dispatch: Dispatch,
}

/// Runs requests through the pipeline with a fixed configuration and collaborators.
#[derive(Clone)]
pub struct DebugSession {
    config: Config,
    toolchain: Toolchain,
    dispatcher: Arc<dyn CommandDispatcher>,
}

impl fmt::Debug for DebugSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugSession")
            .field("config", &self.config)
            .field("toolchain", &self.toolchain)
            .finish_non_exhaustive()
    }
}

impl DebugSession {
    /// Build a session from explicit collaborators.
    pub fn new(
        config: Config,
        toolchain: Toolchain,
        dispatcher: Arc<dyn CommandDispatcher>,
    ) -> Self {
        Self { config, toolchain, dispatcher }
    }

    /// The real `huffc` + `hevm` toolchain, launching through a command file.
    pub fn from_config(config: Config) -> Self {
        let toolchain = Toolchain::from_config(&config);
        Self::new(config, toolchain, Arc::new(TempFileDispatcher::default()))
    }

    /// Launch through `dispatcher` instead.
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn CommandDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Static configuration of the session.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `request` through the pipeline on the blocking pool.
    pub async fn run(&self, request: DebugRequest) -> Result<LaunchReport, DebugError> {
        let session = self.clone();
        tokio::task::spawn_blocking(move || session.run_blocking(&request))
            .await
            .map_err(|e| DebugError::Internal(e.to_string()))?
    }

    /// Run `request` through the pipeline on the current thread.
    pub fn run_blocking(&self, request: &DebugRequest) -> Result<LaunchReport, DebugError> {
        let DebugRequest { cwd, current_file, imports, selector, args, options } = request;
        info!("Starting debug session for {}", current_file.display());

        // Steps 1 and 2: Check the toolchain before touching the filesystem. The
        // check only reads the state flag from the configuration.
        let config = BuildConfig::new(&self.config, current_file, options.state);
        self.toolchain.check_installations(&config).map_err(DebugError::Environment)?;
        debug!(address = %config.contract_address, state = config.state, "Build configuration");

        // Step 3: Flatten the source
        info!("Flattening {} with {} import(s)", current_file.display(), imports.len());
        let source = flatten_file(cwd, current_file, imports)?;

        // Step 4: Encode calldata
        let calldata = match selector {
            Some(selector) => Some(encode_calldata(selector, args)?),
            None if args.is_empty() => None,
            None => return Err(EncodeError::MissingSelector(args.len()).into()),
        };

        // Step 5: Compile
        let bytecode =
            self.toolchain.compiler.compile(&source, cwd, &config).map_err(DebugError::Compile)?;

        // Step 6: Deploy
        let runtime_bytecode = self
            .toolchain
            .deployer
            .deploy(&bytecode, cwd, &config)
            .map_err(DebugError::Deploy)?;

        // Step 7: Launch
        let command = DebugCommand::new(&config, cwd, runtime_bytecode.clone(), calldata.clone());
        let dispatch = self.dispatcher.dispatch(&command, cwd, &config)?;

        Ok(LaunchReport {
            contract_address: config.contract_address,
            calldata,
            runtime_bytecode,
            command,
            dispatch,
        })
    }
}

/// Receives the error that aborted a session.
pub trait ErrorReporter: Send + Sync {
    /// Record `error`.
    fn register(&self, error: &DebugError);
}

/// Logs errors and prints their hint to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn register(&self, error: &DebugError) {
        error!(stage = %error.stage(), "{}", error);
        if let Some(hint) = error.hint() {
            eprintln!("{hint}");
        }
    }
}

/// Run a debug session, registering any failure with `reporter`.
///
/// Returns `None` when the session was aborted.
pub async fn start_debugger(
    session: &DebugSession,
    request: DebugRequest,
    reporter: &dyn ErrorReporter,
) -> Option<LaunchReport> {
    match session.run(request).await {
        Ok(report) => Some(report),
        Err(e) => {
            reporter.register(&e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_and_hint() {
        let err = DebugError::Encode(EncodeError::MissingSelector(2));
        assert_eq!(err.stage(), Stage::Encode);
        assert_eq!(err.hint(), None);

        let err = DebugError::Deploy(ToolError::NotInstalled { tool: "hevm".into() });
        assert_eq!(err.stage().to_string(), "deploy");
        assert_eq!(err.hint(), Some(HELP_HINT));

        let err = DebugError::Environment(ToolError::NotInstalled { tool: "huffc".into() });
        assert_eq!(err.hint(), Some(INSTALL_HINT));
    }

    #[test]
    fn test_request_builder() {
        let request = DebugRequest::new("/work", "src/A.huff")
            .with_imports(vec!["#include \"./B.huff\"".into()])
            .with_call("a9059cbb", vec![Argument::new("uint256", "1")])
            .with_options(DebugOptions { state: false });

        assert_eq!(request.selector.as_deref(), Some("a9059cbb"));
        assert_eq!(request.imports.len(), 1);
        assert!(!request.options.state);
        assert!(DebugOptions::default().state);
    }
}
