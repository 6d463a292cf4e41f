// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Project property resolution.
//!
//! Merge every source of configuration into one [`ProjectProperties`] value.
//! Sources are layered from lowest to highest precedence:
//!
//! 1. Fixed defaults, see [`PropertyDefaults`].
//! 2. Declarations of the environment file, i.e., the live file if present,
//!    or the distribution template otherwise.
//! 3. Process environment variables.
//!
//! Layers 2 and 3 are looked up under the same `TS_<PROPERTY>` names. The
//! process environment shadows the file, so loading a file never clobbers
//! what the user exported.
//!
//! # Explicit Inputs
//!
//! Resolution never reads global state on its own. Everything it looks at is
//! captured into [`Sources`] first. Only [`Sources::capture`] touches the
//! real process environment, and nothing in pressenv ever writes to it.

use crate::{
    config::{PlatformContext, ProjectProperties, PropertyDefaults, PROPERTY_PREFIX},
    envfile,
    git::{Git2Head, HeadReader},
    path::{escape_arg, working_dir, EnvFiles, NoWorkingDir},
    settings::{Credentials, SettingsError, PRESSFLOW_SETTINGS},
};

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Explicit inputs of property resolution.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Sources {
    working_dir: PathBuf,
    process_env: BTreeMap<String, String>,
    file_env: BTreeMap<String, String>,
}

impl Sources {
    /// Construct sources for target working directory with no variables.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Default::default()
        }
    }

    /// Capture current directory, process environment, and environment file.
    ///
    /// Variables that are not valid unicode are skipped.
    ///
    /// # Errors
    ///
    /// - Return [`NoWorkingDir`] if current directory cannot be determined.
    pub fn capture() -> Result<Self, NoWorkingDir> {
        let process_env = std::env::vars_os().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        });

        Ok(Self::new(working_dir()?)
            .with_process_env(process_env)
            .load_env_file())
    }

    /// Use given variables as process environment.
    pub fn with_process_env(
        mut self,
        vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.process_env = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self
    }

    /// Use given variables as environment file declarations.
    pub fn with_file_env(
        mut self,
        vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.file_env = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self
    }

    /// Load declarations of environment file in working directory.
    ///
    /// A missing or unreadable file is tolerated, leaving no file
    /// declarations at all.
    pub fn load_env_file(mut self) -> Self {
        let files = self.env_files();
        let path = files.current();
        if !path.exists() {
            debug!("no environment file at {:?}", path.display());
            self.file_env.clear();
            return self;
        }

        self.file_env = match envfile::load(path) {
            Ok(vars) => vars,
            Err(error) => {
                warn!("ignoring environment file: {error}");
                BTreeMap::new()
            }
        };
        self
    }

    /// Working directory of the project.
    pub fn working_dir(&self) -> &Path {
        self.working_dir.as_path()
    }

    /// Environment file layout of the working directory.
    pub fn env_files(&self) -> EnvFiles {
        EnvFiles::new(&self.working_dir)
    }

    /// Look up non-empty variable.
    ///
    /// Process environment shadows file declarations, even when the process
    /// variable is set to the empty string.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.process_env
            .get(key)
            .or_else(|| self.file_env.get(key))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Hosting platform context.
    pub fn platform(&self) -> PlatformContext {
        PlatformContext {
            site: self.var("TERMINUS_SITE").map(Into::into),
            env: self.var("TERMINUS_ENV").map(Into::into),
            ci: self.var("CIRCLECI").is_some(),
        }
    }

    fn property(&self, name: &str, default: String) -> String {
        let key = format!("{PROPERTY_PREFIX}{}", name.to_uppercase());
        self.var(&key).map(Into::into).unwrap_or(default)
    }
}

/// Resolve project properties from [`Sources`].
#[derive(Debug, Default, Clone)]
pub struct ConfigResolver<H = Git2Head>
where
    H: HeadReader,
{
    defaults: PropertyDefaults,
    head: H,
}

impl<H> ConfigResolver<H>
where
    H: HeadReader,
{
    /// Construct new resolver.
    pub fn new(defaults: PropertyDefaults, head: H) -> Self {
        Self { defaults, head }
    }

    /// Access reader used for branch detection.
    pub fn head(&self) -> &H {
        &self.head
    }

    /// Resolve project properties.
    ///
    /// Branch detection failures are tolerated: the branch resolves empty,
    /// and so does every value derived from it.
    ///
    /// # Errors
    ///
    /// - Return [`ResolveError::Settings`] if a persisted settings blob is
    ///   present but not valid JSON.
    #[instrument(skip(self, sources), level = "debug")]
    pub fn resolve(&self, sources: &Sources) -> Result<ProjectProperties> {
        let defaults = self.defaults.clone();
        let working_dir = sources.working_dir().to_path_buf();

        // Web root always lives under the working directory, even if the
        // variable is spelled as an absolute path.
        let web_root = match sources.var("TS_WEB_ROOT") {
            Some(web_root) => working_dir.join(web_root.trim_start_matches('/')),
            None => working_dir.clone(),
        };
        let escaped_web_root_path = escape_arg(web_root.to_string_lossy().as_ref()).into_owned();

        let mut properties = ProjectProperties {
            project: sources.property("project", defaults.project),
            hash_salt: sources.property("hash_salt", defaults.hash_salt),
            config_dir: sources.property("config_dir", defaults.config_dir),
            host_repo: sources.property("host_repo", defaults.host_repo),
            install_profile: sources.property("install_profile", defaults.install_profile),
            admin_name: sources.property("admin_name", defaults.admin_name),
            prod_branch: sources.property("prod_branch", defaults.prod_branch),
            branch: self.detect_branch(sources),
            working_dir,
            web_root,
            escaped_web_root_path,
            ..Default::default()
        };

        if let Some(blob) = sources.var(PRESSFLOW_SETTINGS) {
            debug!("database credentials come from persisted settings");
            let credentials = Credentials::from_blob(blob)?;
            properties.db_name = credentials.database.unwrap_or_default();
            properties.db_user = credentials.username;
            properties.db_pass = credentials.password;
            properties.db_host = credentials.host;
        } else if let Some(db_name) = sources.var("TS_DB_NAME") {
            properties.db_name = db_name.into();
        } else {
            properties.db_name = derive_db_name(&properties.project, &properties.branch);
        }

        info!(
            "resolved project {:?} on branch {:?}",
            properties.project, properties.branch
        );
        Ok(properties)
    }

    fn detect_branch(&self, sources: &Sources) -> String {
        if let Some(branch) = sources.var("TS_BRANCH") {
            return branch.into();
        }

        let branch = match self.head.head_branch(sources.working_dir()) {
            Ok(branch) => branch.trim().to_string(),
            Err(error) => {
                warn!("cannot detect current branch: {error}");
                String::new()
            }
        };

        if branch.is_empty() {
            warn!("current branch is empty, derived names will be incomplete");
        }

        branch
    }
}

/// Derive database name from project and branch.
///
/// Dashes are not valid in unquoted MySQL identifiers, so they become
/// underscores.
pub fn derive_db_name(project: &str, branch: &str) -> String {
    format!("{project}_{branch}").replace('-', "_")
}

/// Property resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Persisted settings blob cannot be decoded.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Friendly result alias :3
pub type Result<T, E = ResolveError> = std::result::Result<T, E>;
