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

//! Commands that print an intermediate artifact of the pipeline

use crate::utils::resolve_imports;
use eyre::Result;
use hdb_engine::{contract_address, encode_calldata, flatten_file, format_address, Argument};
use std::path::Path;

/// Print the calldata for `selector` called with `args`
pub fn calldata(selector: &str, args: &[Argument]) -> Result<()> {
    let calldata = encode_calldata(selector, args)?;
    println!("{calldata}");
    Ok(())
}

/// Print the address `file` is deployed to
pub fn address(file: &Path) -> Result<()> {
    println!("{}", format_address(&contract_address(file)));
    Ok(())
}

/// Print `file` with its includes inlined
pub fn flatten(cwd: &Path, file: &Path, imports: &[String]) -> Result<()> {
    let imports = resolve_imports(cwd, file, imports);
    let source = flatten_file(cwd, file, &imports)?;
    tracing::info!("Flattened {} file(s)", source.files().len());
    println!("{source}");
    Ok(())
}
