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

//! HDB engine: flattens a Huff source, encodes calldata, compiles and deploys
//! the contract, and launches `hevm` in interactive debug mode.

pub mod build_config;
pub use build_config::*;

pub mod calldata;
pub use calldata::*;

pub mod flatten;
pub use flatten::*;

pub mod launcher;
pub use launcher::*;

pub mod maintenance;
pub use maintenance::*;

pub mod session;
pub use session::*;

pub mod toolchain;
pub use toolchain::{find_binary, Compiler, Deployer, Hevm, Huffc, ToolError, Toolchain};
