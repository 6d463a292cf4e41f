// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Version control queries.
//!
//! Project resolution needs two facts from the repository that houses the
//! working directory: the branch HEAD points to, and the name of the
//! repository itself. Both are read through libgit2, so no `git` binary needs
//! to be installed.

use git2::Repository;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Read facts about HEAD of repository containing a working directory.
pub trait HeadReader {
    /// Short name of branch HEAD refers to.
    ///
    /// Detached HEAD yields an empty string, just like
    /// `git symbolic-ref --short -q HEAD` prints nothing.
    fn head_branch(&self, working_dir: &Path) -> Result<String>;

    /// Name of repository, i.e., basename of its top-level work tree.
    fn repo_name(&self, working_dir: &Path) -> Result<String>;
}

/// Repository access through libgit2.
///
/// Discovers the repository by walking up from the working directory, so
/// any subdirectory of a work tree works.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Head;

impl HeadReader for Git2Head {
    #[instrument(skip(self), level = "debug")]
    fn head_branch(&self, working_dir: &Path) -> Result<String> {
        let repository = Repository::discover(working_dir)?;

        // INVARIANT: Read HEAD as a reference, not a commit.
        //   - Unborn branches still have a symbolic target.
        let head = repository.find_reference("HEAD")?;
        let branch = match head.symbolic_target() {
            Some(target) => target
                .strip_prefix("refs/heads/")
                .unwrap_or(target)
                .to_string(),
            None => String::new(),
        };
        debug!("HEAD refers to {branch:?}");

        Ok(branch)
    }

    #[instrument(skip(self), level = "debug")]
    fn repo_name(&self, working_dir: &Path) -> Result<String> {
        let repository = Repository::discover(working_dir)?;
        let workdir = repository.workdir().ok_or_else(|| GitError::NoWorkTree {
            gitdir: repository.path().to_path_buf(),
        })?;

        workdir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| GitError::NoWorkTree {
                gitdir: repository.path().to_path_buf(),
            })
    }
}

/// Version control error types.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// Repository has no named work tree, e.g., it is bare.
    #[error("repository at {:?} has no named work tree", gitdir.display())]
    NoWorkTree { gitdir: PathBuf },

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = GitError> = std::result::Result<T, E>;
