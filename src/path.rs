// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where the environment files of a project live, and how paths
//! should be handed over to external commands.
//!
//! # Environment File Layout
//!
//! Every project carries two environment files at the top-level of its
//! working directory:
//!
//! 1. `.env.dist` is the __distribution template__. It is checked into
//!    version control, and seeds every new checkout.
//! 2. `.env` is the __live environment file__. It is generated from the
//!    template by `pressenv configure`, and is what the running site reads.
//!
//! The live file always wins when both exist.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

/// Name of the live environment file.
pub const LIVE_ENV_FILE: &str = ".env";

/// Name of the distribution template environment file.
pub const TEMPLATE_ENV_FILE: &str = ".env.dist";

/// Determine absolute path to current working directory.
///
/// # Errors
///
/// - Return [`NoWorkingDir`] if current directory is missing or cannot be
///   accessed.
pub fn working_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|source| NoWorkingDir { source })
}

/// Paths to the environment files of a working directory.
///
/// Does not check if any of the paths actually exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvFiles {
    live: PathBuf,
    template: PathBuf,
}

impl EnvFiles {
    /// Compute environment file layout of target working directory.
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            live: working_dir.as_ref().join(LIVE_ENV_FILE),
            template: working_dir.as_ref().join(TEMPLATE_ENV_FILE),
        }
    }

    /// Path to live environment file.
    pub fn live(&self) -> &Path {
        self.live.as_path()
    }

    /// Path to distribution template file.
    pub fn template(&self) -> &Path {
        self.template.as_path()
    }

    /// Environment file that resolution should load.
    ///
    /// Prefers the live file if it exists, and falls back to the distribution
    /// template otherwise. The fallback may not exist either.
    pub fn current(&self) -> &Path {
        if self.live.is_file() {
            self.live.as_path()
        } else {
            self.template.as_path()
        }
    }
}

/// Escape string for use as a single shell argument.
///
/// Strings made of word characters and dashes pass through untouched.
/// Everything else is wrapped in single quotes, with embedded single quotes
/// closed, escaped, and reopened.
pub fn escape_arg(value: &str) -> Cow<'_, str> {
    let is_plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if is_plain {
        return Cow::Borrowed(value);
    }

    Cow::Owned(format!("'{}'", value.replace('\'', r"'\''")))
}

/// Current working directory cannot be determined.
#[derive(Debug, thiserror::Error)]
#[error("cannot determine current working directory")]
pub struct NoWorkingDir {
    #[source]
    source: std::io::Error,
}

/// Friendly result alias :3
pub type Result<T, E = NoWorkingDir> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case("abc-123", "abc-123"; "word and dash characters")]
    #[test_case("abc 123!", "'abc 123!'"; "whitespace and bang")]
    #[test_case("/var/www/web", "'/var/www/web'"; "absolute path")]
    #[test_case("it's", r"'it'\''s'"; "embedded single quote")]
    #[test_case("", "''"; "empty string")]
    #[test]
    fn escape_arg_quotes_when_needed(input: &str, expect: &str) {
        use pretty_assertions::assert_eq;
        assert_eq!(escape_arg(input), expect);
    }

    #[test]
    fn env_files_prefer_live_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let files = EnvFiles::new(dir.path());
        assert_eq!(files.current(), dir.path().join(".env.dist"));

        std::fs::write(dir.path().join(".env"), "A=1\n")?;
        assert_eq!(files.current(), dir.path().join(".env"));

        Ok(())
    }
}
