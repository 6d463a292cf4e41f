// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the resolved project configuration. Resolution
//! itself lives in [`resolve`](crate::resolve). Everything here is plain
//! data.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
};

/// Prefix of environment variables that override project properties.
pub const PROPERTY_PREFIX: &str = "TS_";

/// Environment name the production branch deploys to.
pub const PROD_TERMINUS_ENV: &str = "dev";

/// Default values of overridable project properties.
///
/// Each field can be overridden by an environment variable named after it,
/// e.g., `install_profile` by `TS_INSTALL_PROFILE`.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PropertyDefaults {
    pub project: String,
    pub hash_salt: String,
    pub config_dir: String,
    pub host_repo: String,
    pub install_profile: String,
    pub admin_name: String,
    pub prod_branch: String,
}

impl Default for PropertyDefaults {
    fn default() -> Self {
        Self {
            project: String::new(),
            hash_salt: String::new(),
            config_dir: String::new(),
            host_repo: String::new(),
            install_profile: "standard".into(),
            admin_name: "admin".into(),
            prod_branch: "main".into(),
        }
    }
}

/// Resolved runtime configuration of one invocation.
///
/// Rebuilt from scratch on every run. Optional database fields stay [`None`]
/// unless a persisted settings blob or an explicit override provided them.
/// An explicit override to the empty string is kept as `Some("")`.
#[derive(Debug, Default, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ProjectProperties {
    pub project: String,
    pub hash_salt: String,
    pub config_dir: String,
    pub host_repo: String,
    pub install_profile: String,
    pub admin_name: String,
    pub prod_branch: String,
    pub working_dir: PathBuf,
    pub web_root: PathBuf,
    pub escaped_web_root_path: String,
    pub branch: String,

    #[serde(rename = "db-name")]
    pub db_name: String,

    #[serde(rename = "db-user", skip_serializing_if = "Option::is_none")]
    pub db_user: Option<String>,

    #[serde(rename = "db-pass", skip_serializing_if = "Option::is_none")]
    pub db_pass: Option<String>,

    #[serde(rename = "db-host", skip_serializing_if = "Option::is_none")]
    pub db_host: Option<String>,

    #[serde(rename = "db-upgrade", skip_serializing_if = "Option::is_none")]
    pub db_upgrade: Option<String>,

    /// Only known after a configure run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminus_env: Option<String>,
}

impl ProjectProperties {
    /// Remote environment this checkout maps to.
    pub fn terminus_env(&self) -> String {
        terminus_env(&self.branch, &self.prod_branch)
    }
}

impl Display for ProjectProperties {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let mut shown = self.clone();
        if !shown.hash_salt.is_empty() {
            shown.hash_salt = "<redacted>".into();
        }
        if shown.db_pass.as_deref().is_some_and(|pass| !pass.is_empty()) {
            shown.db_pass = Some("<redacted>".into());
        }

        fmt.write_str(
            toml::ser::to_string_pretty(&shown)
                .map_err(|_| FmtError)?
                .as_str(),
        )
    }
}

/// Map branch to remote environment name.
///
/// The production branch deploys to "dev", every other branch deploys to a
/// multidev environment of the same name.
pub fn terminus_env(branch: &str, prod_branch: &str) -> String {
    if branch == prod_branch {
        PROD_TERMINUS_ENV.into()
    } else {
        branch.into()
    }
}

/// Context provided by the hosting platform and CI runner.
///
/// Read, but never produced, by pressenv.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct PlatformContext {
    /// Site name on hosting platform (`TERMINUS_SITE`).
    pub site: Option<String>,

    /// Environment name on hosting platform (`TERMINUS_ENV`).
    pub env: Option<String>,

    /// Running inside CI (`CIRCLECI`).
    pub ci: bool,
}

impl PlatformContext {
    /// Format `<site>.<env>` as expected by terminus commands.
    ///
    /// Uses the platform environment when `env` is empty or absent.
    pub fn site_env(&self, env: Option<&str>) -> String {
        let env = env
            .filter(|env| !env.is_empty())
            .or(self.env.as_deref())
            .unwrap_or_default();

        format!("{}.{}", self.site.as_deref().unwrap_or_default(), env)
    }
}
