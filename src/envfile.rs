// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Environment file handling.
//!
//! Environment files are line-oriented `KEY=VALUE` declarations in dotenv
//! syntax. Reading goes through dotenvy, but the declarations are handed back
//! as a plain map. The process environment is never touched.
//!
//! # Writing
//!
//! Files are never patched in place. Callers build the full content in memory,
//! and [`replace`] swaps it in through a temporary file in the same directory.
//! Either the old file or the new file is visible, never a half-written one.

use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

/// Parse all declarations of an environment file.
///
/// Later declarations of the same key win, just like sourcing the file in a
/// shell would.
///
/// # Errors
///
/// - Return [`EnvFileError::Parse`] if file cannot be opened or contains
///   invalid declarations.
pub fn load(path: impl AsRef<Path>) -> Result<BTreeMap<String, String>> {
    let path = path.as_ref();
    let parse_error = |source| EnvFileError::Parse {
        source,
        path: path.to_path_buf(),
    };

    let mut vars = BTreeMap::new();
    for item in dotenvy::from_path_iter(path).map_err(parse_error)? {
        let (key, value) = item.map_err(parse_error)?;
        vars.insert(key, value);
    }

    debug!("loaded {} declarations from {:?}", vars.len(), path.display());
    Ok(vars)
}

/// Read raw content of environment file.
///
/// A missing file reads as empty content.
///
/// # Errors
///
/// - Return [`EnvFileError::Read`] if file exists but cannot be read.
pub fn read_or_empty(path: impl AsRef<Path>) -> Result<String> {
    match read_to_string(path.as_ref()) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(EnvFileError::Read {
            source: err,
            path: path.as_ref().to_path_buf(),
        }),
    }
}

/// Replace entire content of file.
///
/// # Errors
///
/// - Return [`EnvFileError::Write`] if temporary file cannot be created,
///   written, or persisted over the target path.
#[instrument(skip(path, content), level = "debug")]
pub fn replace(path: impl AsRef<Path>, content: impl AsRef<str>) -> Result<()> {
    let path = path.as_ref();
    let write_error = |source| EnvFileError::Write {
        source,
        path: path.to_path_buf(),
    };

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut staged = NamedTempFile::new_in(dir).map_err(write_error)?;
    staged
        .write_all(content.as_ref().as_bytes())
        .map_err(write_error)?;
    staged.flush().map_err(write_error)?;
    staged.persist(path).map_err(|err| write_error(err.error))?;

    debug!("replaced {:?}", path.display());
    Ok(())
}

/// Append one declaration block to end of file.
///
/// Creates file if missing. Existing content without a trailing newline gets
/// one before the new block.
///
/// # Errors
///
/// - Return [`EnvFileError::Read`] if existing content cannot be read.
/// - Return [`EnvFileError::Write`] if new content cannot be written.
pub fn append(path: impl AsRef<Path>, block: &EnvBlock) -> Result<()> {
    let mut content = read_or_empty(path.as_ref())?;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(block.to_string().as_str());

    replace(path, content)
}

/// Quote value so dotenvy reads back the exact same string.
///
/// Plain values stay bare. Anything else goes into single quotes, or double
/// quotes with escapes if the value itself holds a single quote.
pub fn quote_value(value: &str) -> Cow<'_, str> {
    let is_plain = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_./:@+-".contains(c));
    if is_plain {
        return Cow::Borrowed(value);
    }

    if !value.contains('\'') {
        return Cow::Owned(format!("'{value}'"));
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');

    Cow::Owned(quoted)
}

/// Ordered block of environment file lines.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvBlock {
    lines: Vec<String>,
}

impl EnvBlock {
    /// Construct new empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add comment line.
    pub fn comment(mut self, text: impl AsRef<str>) -> Self {
        self.lines.push(format!("# {}", text.as_ref()));
        self
    }

    /// Add `KEY=VALUE` declaration with value quoted as needed.
    pub fn set(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.lines
            .push(format!("{}={}", key.as_ref(), quote_value(value.as_ref())));
        self
    }

    /// Check if block has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Display for EnvBlock {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        for line in &self.lines {
            writeln!(fmt, "{line}")?;
        }

        Ok(())
    }
}

/// Environment file error types.
#[derive(Debug, thiserror::Error)]
pub enum EnvFileError {
    /// Environment file cannot be read.
    #[error("failed to read environment file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Environment file cannot be opened or parsed.
    #[error("failed to parse environment file at {:?}", path.display())]
    Parse {
        #[source]
        source: dotenvy::Error,
        path: PathBuf,
    },

    /// Environment file cannot be written.
    #[error("failed to write environment file at {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = EnvFileError> = std::result::Result<T, E>;
