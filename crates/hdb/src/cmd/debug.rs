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

//! Debug command - run the full pipeline and enter the debugger

use crate::utils::{load_config, resolve_imports};
use eyre::{eyre, Result};
use hdb_engine::{
    format_address, start_debugger, DebugOptions, DebugRequest, DebugSession, DirectDispatcher,
    TracingReporter,
};
use std::{path::Path, sync::Arc};

/// Debug a call into a Huff file
pub async fn debug(cli: &crate::Cli, cwd: &Path, args: &crate::DebugArgs) -> Result<()> {
    tracing::info!("Starting debug workflow for {}", args.file.display());

    // Step 1: Load configuration and collect the includes to inline
    let config = load_config(cli, cwd)?;
    let imports = resolve_imports(cwd, &args.file, &args.imports);

    // Step 2: Build the request
    let mut request = DebugRequest::new(cwd, &args.file)
        .with_imports(imports)
        .with_options(DebugOptions { state: !args.no_state });
    if let Some(selector) = &args.selector {
        request = request.with_call(selector.clone(), args.args.clone());
    }

    // Step 3: Run the session
    let mut session = DebugSession::from_config(config);
    if args.direct {
        session = session.with_dispatcher(Arc::new(DirectDispatcher::default()));
    }

    let report = start_debugger(&session, request, &TracingReporter)
        .await
        .ok_or_else(|| eyre!("Debug session for {} failed", args.file.display()))?;

    tracing::info!(
        "Debugged {} at {} ({} bytes of runtime code)",
        args.file.display(),
        format_address(&report.contract_address),
        report.runtime_bytecode.len()
    );
    Ok(())
}
