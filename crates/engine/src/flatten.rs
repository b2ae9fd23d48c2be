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

//! Source flattening
//!
//! Inlines the files a Huff source declares with `#include "<path>"` so the
//! compiler only ever sees a single file. Imports are inlined in declaration
//! order, followed by the current file, joined by newlines; every include
//! directive is then removed from the combined text. Nothing is deduplicated.

use regex::Regex;
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use thiserror::Error;
use tracing::debug;

static INCLUDE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"#include[ \t]*"([^"\r\n]*)""#).expect("include directive pattern is valid")
});

/// Errors raised while flattening a source file.
#[derive(Debug, Error)]
pub enum FlattenError {
    /// A referenced file does not exist
    #[error("source file not found: {}", path.display())]
    NotFound {
        /// Resolved path that was looked up
        path: PathBuf,
    },
    /// A referenced file exists but could not be read
    #[error("failed to read source file {}: {source}", path.display())]
    Read {
        /// Resolved path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// A single compilable unit produced by [`flatten_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedSource {
    text: String,
    files: Vec<PathBuf>,
}

impl FlattenedSource {
    /// A source unit that did not come from disk.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into(), files: Vec::new() }
    }

    /// The flattened source text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Files that were inlined, in the order they appear in the text.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Consume and return the flattened text.
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for FlattenedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Flatten `current_file` and its `imports` into one source unit.
///
/// `current_file` is relative to `cwd`; each import is either a full directive
/// (`#include "./utils.huff"`) or a bare path, and is resolved against the
/// directory containing `current_file`. A missing file fails the whole
/// operation, since a partially flattened source would compile to the wrong
/// bytecode.
pub fn flatten_file(
    cwd: &Path,
    current_file: &Path,
    imports: &[String],
) -> Result<FlattenedSource, FlattenError> {
    let base_dir = cwd.join(current_file.parent().unwrap_or_else(|| Path::new("")));

    let mut files: Vec<PathBuf> =
        imports.iter().map(|import| base_dir.join(parse_include(import))).collect();
    files.push(cwd.join(current_file));

    let contents = files.iter().map(|path| read_source(path)).collect::<Result<Vec<_>, _>>()?;

    let text = strip_includes(&contents.join("\n"));
    debug!(files = files.len(), bytes = text.len(), "Flattened {}", current_file.display());

    Ok(FlattenedSource { text, files })
}

/// Extract the path from an include fragment.
///
/// `#include "./lib.huff"` yields `./lib.huff`; anything that is not a directive
/// is treated as a path, with surrounding whitespace and quotes trimmed.
pub fn parse_include(fragment: &str) -> &str {
    match INCLUDE_DIRECTIVE.captures(fragment).and_then(|caps| caps.get(1)) {
        Some(path) => path.as_str(),
        None => fragment.trim().trim_matches('"'),
    }
}

/// List the include paths declared in `source`, in order of appearance.
pub fn find_includes(source: &str) -> Vec<String> {
    INCLUDE_DIRECTIVE
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|path| path.as_str().to_string())
        .collect()
}

/// Remove every include directive from `source`.
pub fn strip_includes(source: &str) -> String {
    INCLUDE_DIRECTIVE.replace_all(source, "").into_owned()
}

fn read_source(path: &Path) -> Result<String, FlattenError> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => FlattenError::NotFound { path: path.to_path_buf() },
        _ => FlattenError::Read { path: path.to_path_buf(), source },
    })
}
