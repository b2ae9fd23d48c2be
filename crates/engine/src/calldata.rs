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

//! Calldata encoding for the debugged call
//!
//! Arguments arrive as `(type, value)` string pairs, for example
//! `("address", "0x...01")` and `("uint256", "100")`. Each value is coerced into
//! its declared Solidity type and the list is ABI-encoded as function
//! parameters behind the 4-byte selector.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::debug;

/// Errors raised while building calldata.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The selector is not exactly four hex-encoded bytes
    #[error("invalid function selector `{0}`: expected 8 hex digits")]
    InvalidSelector(String),
    /// Arguments were given without a selector to call
    #[error("{0} argument(s) given but no function selector")]
    MissingSelector(usize),
    /// The declared type is not a Solidity type
    #[error("argument {index}: invalid type `{ty}`: {source}")]
    InvalidType {
        /// 1-based argument position
        index: usize,
        /// The declared type
        ty: String,
        /// Parser error
        #[source]
        source: alloy_dyn_abi::Error,
    },
    /// The literal cannot be read as a value of the declared type
    #[error("argument {index}: `{value}` is not a valid `{ty}`: {source}")]
    InvalidValue {
        /// 1-based argument position
        index: usize,
        /// The declared type
        ty: String,
        /// The offending literal
        value: String,
        /// Coercion error
        #[source]
        source: alloy_dyn_abi::Error,
    },
}

/// An argument that is not in `TYPE:VALUE` form.
#[derive(Debug, Error)]
#[error("expected an argument of the form TYPE:VALUE, got `{0}`")]
pub struct MalformedArgument(pub String);

/// A single call argument: a Solidity type tag and a literal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Solidity type, e.g. `uint256` or `address[]`
    pub ty: String,
    /// Literal value, e.g. `100` or `[0x01, 0x02]`
    pub value: String,
}

impl Argument {
    /// Create an argument from a type and a value.
    pub fn new(ty: impl Into<String>, value: impl Into<String>) -> Self {
        Self { ty: ty.into(), value: value.into() }
    }

    fn to_value(&self, index: usize) -> Result<DynSolValue, EncodeError> {
        let ty = DynSolType::parse(self.ty.trim()).map_err(|source| EncodeError::InvalidType {
            index,
            ty: self.ty.clone(),
            source,
        })?;

        ty.coerce_str(self.value.trim()).map_err(|source| EncodeError::InvalidValue {
            index,
            ty: self.ty.clone(),
            value: self.value.clone(),
            source,
        })
    }
}

impl<T: Into<String>, V: Into<String>> From<(T, V)> for Argument {
    fn from((ty, value): (T, V)) -> Self {
        Self::new(ty, value)
    }
}

impl FromStr for Argument {
    type Err = MalformedArgument;

    /// Parse `TYPE:VALUE`, splitting at the first colon so values may contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((ty, value)) if !ty.trim().is_empty() => Ok(Self::new(ty.trim(), value)),
            _ => Err(MalformedArgument(s.to_string())),
        }
    }
}

/// `0x`-prefixed calldata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calldata(String);

impl Calldata {
    /// The calldata as a `0x`-prefixed hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Calldata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a call to `selector` with `args`.
///
/// With no arguments the result is exactly `0x` followed by the selector as
/// given; no empty tuple is encoded.
pub fn encode_calldata(selector: &str, args: &[Argument]) -> Result<Calldata, EncodeError> {
    let selector = parse_selector(selector)?;

    if args.is_empty() {
        return Ok(Calldata(format!("0x{selector}")));
    }

    let values = args
        .iter()
        .enumerate()
        .map(|(i, arg)| arg.to_value(i + 1))
        .collect::<Result<Vec<_>, _>>()?;

    let encoded = DynSolValue::Tuple(values).abi_encode_params();
    debug!(selector, args = args.len(), bytes = encoded.len(), "Encoded calldata");

    Ok(Calldata(format!("0x{selector}{}", hex::encode(encoded))))
}

/// Validate a selector, dropping an optional `0x` prefix.
fn parse_selector(selector: &str) -> Result<&str, EncodeError> {
    let trimmed = selector.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.len() == 8 && digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(digits)
    } else {
        Err(EncodeError::InvalidSelector(selector.to_string()))
    }
}
