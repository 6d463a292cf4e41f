// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Environment file synthesis.
//!
//! Turn resolved [`ProjectProperties`] plus explicit overrides into a fresh
//! live environment file. The live file is the distribution template followed
//! by a generated block:
//!
//! ```text
//! # Generated configuration
//! PRESSFLOW_SETTINGS='{"databases":...}'
//! TERMINUS_ENV=dev
//! TS_BRANCH=main
//! TS_PROD_BRANCH=main
//! TS_INSTALL_PROFILE=standard
//! ```
//!
//! # Hash Salt
//!
//! A project without a hash salt gets one generated on its first configure
//! run. The salt is appended to the distribution template rather than the
//! live file, so every later resolution and every reseeded live file picks
//! it up. Removing that declaration from the template is the only way to get
//! a new salt.

use crate::{
    config::{terminus_env, ProjectProperties},
    envfile::{self, EnvBlock, EnvFileError},
    path::EnvFiles,
    resolve::Sources,
    settings::{
        DatabaseConnection, DatabaseTarget, PressflowSettings, SettingsError,
        DEFAULT_PRESSFLOW_SETTINGS, PRESSFLOW_SETTINGS,
    },
};

use base64::prelude::{Engine as _, BASE64_URL_SAFE_NO_PAD};
use rand::{rngs::OsRng, RngCore};
use std::{convert::Infallible, path::PathBuf, str::FromStr};
use tracing::{debug, info, instrument, warn};

/// Command line spelling of an explicit empty value.
pub const CLEAR_SENTINEL: &str = "NULL";

/// Number of random bytes behind a generated hash salt.
pub const HASH_SALT_BYTES: usize = 55;

/// Explicit override of one property.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub enum Override {
    /// Leave property as resolved.
    #[default]
    Keep,

    /// Force property to the empty string.
    Clear,

    /// Replace property with value.
    Set(String),
}

impl Override {
    /// Apply override to optional property.
    pub fn apply(&self, current: Option<String>) -> Option<String> {
        match self {
            Self::Keep => current,
            Self::Clear => Some(String::new()),
            Self::Set(value) => Some(value.clone()),
        }
    }

    /// Apply override to required property.
    pub fn apply_str(&self, current: String) -> String {
        self.apply(Some(current)).unwrap_or_default()
    }
}

impl FromStr for Override {
    type Err = Infallible;

    /// Parse command line value, mapping [`CLEAR_SENTINEL`] to [`Override::Clear`].
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == CLEAR_SENTINEL {
            Ok(Self::Clear)
        } else {
            Ok(Self::Set(value.into()))
        }
    }
}

impl From<Option<Override>> for Override {
    fn from(value: Option<Override>) -> Self {
        value.unwrap_or_default()
    }
}

/// Overrides accepted by a configure run.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct ConfigureOptions {
    pub db_pass: Override,
    pub db_user: Override,
    pub db_name: Override,
    pub db_host: Override,
    pub db_upgrade: Override,
    pub branch: Override,
    pub profile: Override,
    pub prod_branch: Override,
}

impl ConfigureOptions {
    /// Store overrides into resolved properties.
    pub fn apply(&self, mut properties: ProjectProperties) -> ProjectProperties {
        properties.db_pass = self.db_pass.apply(properties.db_pass);
        properties.db_user = self.db_user.apply(properties.db_user);
        properties.db_name = self.db_name.apply_str(properties.db_name);
        properties.db_host = self.db_host.apply(properties.db_host);
        properties.db_upgrade = self.db_upgrade.apply(properties.db_upgrade);
        properties.branch = self.branch.apply_str(properties.branch);
        properties.install_profile = self.profile.apply_str(properties.install_profile);
        properties.prod_branch = self.prod_branch.apply_str(properties.prod_branch);
        properties
    }
}

/// Outcome of a configure run.
#[derive(Debug, Clone, PartialEq)]
pub struct Configured {
    /// Properties after overrides, salt, and remote environment resolution.
    pub properties: ProjectProperties,

    /// Settings blob embedded into the live file.
    pub settings: PressflowSettings,

    /// Path of the written live environment file.
    pub live_file: PathBuf,
}

/// Write live environment file from resolved properties.
#[derive(Debug, Clone)]
pub struct EnvFileSynthesizer {
    files: EnvFiles,
    base: PressflowSettings,
}

impl EnvFileSynthesizer {
    /// Construct new synthesizer using default settings as base.
    pub fn new(files: EnvFiles) -> Self {
        Self {
            files,
            base: PressflowSettings::default(),
        }
    }

    /// Construct synthesizer for working directory of sources.
    ///
    /// Uses `DEFAULT_PRESSFLOW_SETTINGS` as base settings if it is set.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigureError::Settings`] if base settings are malformed.
    pub fn from_sources(sources: &Sources) -> Result<Self> {
        let synthesizer = Self::new(sources.env_files());
        match sources.var(DEFAULT_PRESSFLOW_SETTINGS) {
            Some(base) => {
                debug!("using {DEFAULT_PRESSFLOW_SETTINGS} as base settings");
                Ok(synthesizer.with_base_settings(base.parse()?))
            }
            None => Ok(synthesizer),
        }
    }

    /// Replace base settings.
    pub fn with_base_settings(mut self, base: PressflowSettings) -> Self {
        self.base = base;
        self
    }

    /// Apply overrides, and regenerate the live environment file.
    ///
    /// Generates and persists a hash salt if the properties lack one. The
    /// live file is replaced in one step, so a failure leaves the previous
    /// live file as it was. A salt persisted before such a failure stays
    /// persisted.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigureError::EnvFile`] if the template or live file
    ///   cannot be read or written.
    /// - Return [`ConfigureError::Settings`] if settings cannot be encoded.
    #[instrument(skip(self, properties, options), level = "debug")]
    pub fn configure(
        &self,
        properties: ProjectProperties,
        options: &ConfigureOptions,
    ) -> Result<Configured> {
        let mut settings = self.base.clone();
        let mut properties = options.apply(properties);

        let db = &mut settings.databases.default.default;
        db.database = properties.db_name.clone();
        if let Some(username) = &properties.db_user {
            db.username = username.clone();
        }
        if let Some(password) = &properties.db_pass {
            db.password = password.clone();
        }
        if let Some(host) = &properties.db_host {
            db.host = host.clone();
        }

        settings.databases.upgrade = properties
            .db_upgrade
            .as_deref()
            .filter(|upgrade| !upgrade.is_empty() && *upgrade != properties.db_name)
            .map(|upgrade| DatabaseTarget {
                default: DatabaseConnection {
                    database: upgrade.into(),
                    ..settings.databases.default.default.clone()
                },
            });

        if properties.hash_salt.is_empty() {
            properties.hash_salt = self.persist_new_hash_salt()?;
        }
        settings.drupal_hash_salt = properties.hash_salt.clone();

        if !properties.config_dir.is_empty() {
            settings.config_directory_name = properties.config_dir.clone();
        }

        let terminus_env = terminus_env(&properties.branch, &properties.prod_branch);
        properties.terminus_env = Some(terminus_env.clone());

        let block = EnvBlock::new()
            .comment("Generated configuration")
            .set(PRESSFLOW_SETTINGS, settings.to_json()?)
            .set("TERMINUS_ENV", &terminus_env)
            .set("TS_BRANCH", &properties.branch)
            .set("TS_PROD_BRANCH", &properties.prod_branch)
            .set("TS_INSTALL_PROFILE", &properties.install_profile);

        let mut content = envfile::read_or_empty(self.files.template())?;
        if content.is_empty() {
            warn!(
                "distribution template {:?} is empty or missing",
                self.files.template().display()
            );
        } else if !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(block.to_string().as_str());
        envfile::replace(self.files.live(), content)?;

        info!(
            "configured {:?} for remote environment {:?}",
            self.files.live().display(),
            terminus_env
        );
        Ok(Configured {
            properties,
            settings,
            live_file: self.files.live().to_path_buf(),
        })
    }

    fn persist_new_hash_salt(&self) -> Result<String> {
        let salt = generate_hash_salt();
        envfile::append(
            self.files.template(),
            &EnvBlock::new().set("TS_HASH_SALT", &salt),
        )?;
        info!(
            "generated new hash salt into {:?}",
            self.files.template().display()
        );

        Ok(salt)
    }
}

/// Generate hash salt from operating system randomness.
///
/// Output is URL-safe base64 without padding.
pub fn generate_hash_salt() -> String {
    let mut bytes = [0u8; HASH_SALT_BYTES];
    OsRng.fill_bytes(&mut bytes);
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Environment file synthesis error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigureError {
    /// Template or live environment file cannot be read or written.
    #[error(transparent)]
    EnvFile(#[from] EnvFileError),

    /// Settings blob cannot be decoded or encoded.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Friendly result alias :3
pub type Result<T, E = ConfigureError> = std::result::Result<T, E>;
