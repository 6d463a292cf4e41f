// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Pressflow settings layout.
//!
//! The hosting platform hands Drupal its runtime configuration as one JSON
//! object stored in the `PRESSFLOW_SETTINGS` variable. Locally we mimic that
//! by embedding the same object into the live environment file. This module
//! only specifies the layout of that object. File I/O is left to the caller.
//!
//! Unknown keys are carried through untouched, so a site-wide
//! `DEFAULT_PRESSFLOW_SETTINGS` object can add fields we do not model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Variable holding the serialized settings of the current project.
pub const PRESSFLOW_SETTINGS: &str = "PRESSFLOW_SETTINGS";

/// Variable holding a user-wide base settings object.
pub const DEFAULT_PRESSFLOW_SETTINGS: &str = "DEFAULT_PRESSFLOW_SETTINGS";

/// Structured settings blob.
///
/// Missing fields fall back to their local defaults.
#[derive(Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PressflowSettings {
    /// Database connections.
    pub databases: Databases,

    /// Platform, file path, and compression flags.
    pub conf: Conf,

    /// Platform level salt slot, kept empty locally.
    pub hash_salt: String,

    /// Location of configuration sync directory relative to web root.
    pub config_directory_name: String,

    /// Salt used by Drupal for one-time login links and such.
    pub drupal_hash_salt: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PressflowSettings {
    fn default() -> Self {
        Self {
            databases: Databases::default(),
            conf: Conf::default(),
            hash_salt: String::new(),
            config_directory_name: "../config".into(),
            drupal_hash_salt: String::new(),
            extra: Map::new(),
        }
    }
}

impl PressflowSettings {
    /// Encode settings as single-line JSON.
    ///
    /// # Errors
    ///
    /// - Return [`SettingsError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(SettingsError::Encode)
    }
}

impl FromStr for PressflowSettings {
    type Err = SettingsError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(data).map_err(SettingsError::Decode)
    }
}

/// Primary database credentials pulled out of a settings blob.
///
/// Only looks at `databases.default.default`, and ignores the shape of
/// everything else. Scalars of any type are taken as their string form.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Credentials {
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
}

impl Credentials {
    /// Extract credentials from serialized settings.
    ///
    /// # Errors
    ///
    /// - Return [`SettingsError::Decode`] if data is not valid JSON.
    pub fn from_blob(data: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(data).map_err(SettingsError::Decode)?;
        let field = |name: &str| {
            value
                .pointer(&format!("/databases/default/default/{name}"))
                .and_then(scalar_string)
        };

        Ok(Self {
            database: field("database"),
            username: field("username"),
            password: field("password"),
            host: field("host"),
        })
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

/// Port number as written in a settings blob.
///
/// Platforms hand out ports as strings now and then. Both forms are accepted
/// and written back the way they came in.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Port {
    Number(u64),
    Text(String),
}

impl From<u16> for Port {
    fn from(port: u16) -> Self {
        Self::Number(port.into())
    }
}

/// Database connection groups.
///
/// The `upgrade` group only exists when a distinct migration source database
/// was requested.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Databases {
    /// Primary database of the site.
    pub default: DatabaseTarget,

    /// Legacy database used as migration source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade: Option<DatabaseTarget>,
}

/// Database target keyed the way Drupal expects, i.e., `<group>.default`.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseTarget {
    pub default: DatabaseConnection,
}

/// Connection info of one database.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConnection {
    pub driver: String,
    pub prefix: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: Port,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DatabaseConnection {
    fn default() -> Self {
        Self {
            driver: "mysql".into(),
            prefix: String::new(),
            database: String::new(),
            username: "root".into(),
            password: "root".into(),
            host: "127.0.0.1".into(),
            port: Port::from(3306),
            extra: Map::new(),
        }
    }
}

/// Fixed bag of platform flags.
///
/// Values describe a local environment. Nothing here is derived from project
/// properties.
#[derive(Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Conf {
    pub pressflow_smart_start: bool,
    pub pantheon_binding: Option<String>,
    pub pantheon_site_uuid: Option<String>,
    pub pantheon_environment: String,
    pub pantheon_tier: String,
    pub pantheon_index_host: String,
    pub pantheon_index_port: Port,
    pub redis_client_host: String,
    pub redis_client_port: Port,
    pub redis_client_password: String,
    pub file_public_path: String,
    pub file_private_path: String,
    pub file_directory_path: String,
    pub file_temporary_path: String,
    pub file_directory_temp: String,
    pub css_gzip_compression: bool,
    pub js_gzip_compression: bool,
    pub page_compression: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            pressflow_smart_start: true,
            pantheon_binding: None,
            pantheon_site_uuid: None,
            pantheon_environment: "local".into(),
            pantheon_tier: "local".into(),
            pantheon_index_host: "localhost".into(),
            pantheon_index_port: Port::from(8983),
            redis_client_host: String::new(),
            redis_client_port: Port::from(6379),
            redis_client_password: String::new(),
            file_public_path: "sites/default/files".into(),
            file_private_path: "sites/default/files/private".into(),
            file_directory_path: "site/default/files".into(),
            file_temporary_path: "/tmp".into(),
            file_directory_temp: "/tmp".into(),
            css_gzip_compression: false,
            js_gzip_compression: false,
            page_compression: false,
            extra: Map::new(),
        }
    }
}

/// Settings blob error types.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings blob is not valid JSON.
    #[error("malformed settings blob")]
    Decode(#[source] serde_json::Error),

    /// Settings cannot be encoded to JSON.
    #[error("failed to encode settings blob")]
    Encode(#[source] serde_json::Error),
}

/// Friendly result alias :3
type Result<T, E = SettingsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_settings_describe_local_mysql() {
        let settings = PressflowSettings::default();
        let db = &settings.databases.default.default;

        assert_eq!(db.driver, "mysql");
        assert_eq!((db.username.as_str(), db.password.as_str()), ("root", "root"));
        assert_eq!((db.host.as_str(), &db.port), ("127.0.0.1", &Port::from(3306)));
        assert_eq!(settings.databases.upgrade, None);
        assert_eq!(settings.config_directory_name, "../config");
        assert_eq!(settings.hash_salt, "");
        assert_eq!(settings.conf.pantheon_environment, "local");
    }

    #[test]
    fn encoded_settings_are_single_line_without_upgrade_block() -> anyhow::Result<()> {
        let json = PressflowSettings::default().to_json()?;

        assert!(!json.contains('\n'));
        assert!(!json.contains("upgrade"));
        assert!(json.starts_with(r#"{"databases":{"default":{"default":{"driver":"mysql""#));

        Ok(())
    }

    #[test]
    fn decode_keeps_unknown_fields() -> anyhow::Result<()> {
        let settings: PressflowSettings = r#"{
            "databases": {"default": {"default": {
                "driver": "mysql", "database": "pantheon", "username": "pantheon",
                "password": "secret", "host": "dbserver", "port": 10432
            }}},
            "conf": {"pantheon_environment": "dev", "pantheon_tier": "live"},
            "drupal_hash_salt": "abc",
            "install_profile": "minimal"
        }"#
        .parse()?;

        assert_eq!(settings.databases.default.default.port, Port::from(10432));
        assert_eq!(settings.databases.default.default.prefix, "");
        assert_eq!(settings.conf.pantheon_environment, "dev");
        assert_eq!(settings.conf.file_temporary_path, "/tmp");
        assert_eq!(settings.config_directory_name, "../config");
        assert_eq!(settings.extra.get("install_profile"), Some(&Value::from("minimal")));

        let json = settings.to_json()?;
        assert!(json.contains(r#""install_profile":"minimal""#));

        Ok(())
    }

    #[test]
    fn encoded_settings_keep_platform_key_order() -> anyhow::Result<()> {
        let json = PressflowSettings::default().to_json()?;
        let tail = r#""hash_salt":"","config_directory_name":"../config","drupal_hash_salt":""}"#;

        assert!(json.ends_with(tail), "unexpected tail in {json}");

        Ok(())
    }

    #[test]
    fn decode_fills_missing_connection_fields() -> anyhow::Result<()> {
        let settings: PressflowSettings = r#"{"databases": {"default": {"default": {
            "database": "pantheon", "username": "pantheon", "password": "secret"
        }}}}"#
            .parse()?;
        let db = &settings.databases.default.default;

        assert_eq!(db.database, "pantheon");
        assert_eq!(db.driver, "mysql");
        assert_eq!(db.host, "127.0.0.1");
        assert_eq!(db.port, Port::from(3306));
        assert_eq!(settings.conf, Conf::default());

        Ok(())
    }

    #[test]
    fn decode_accepts_string_ports() -> anyhow::Result<()> {
        let settings: PressflowSettings = r#"{
            "databases": {"default": {"default": {"database": "db", "port": "3306"}}},
            "conf": {"redis_client_port": "6380"}
        }"#
        .parse()?;

        assert_eq!(settings.databases.default.default.port, Port::Text("3306".into()));
        assert_eq!(settings.conf.redis_client_port, Port::Text("6380".into()));
        assert!(settings.to_json()?.contains(r#""port":"3306""#));

        Ok(())
    }

    #[test]
    fn credentials_ignore_blob_shape() -> anyhow::Result<()> {
        let credentials = Credentials::from_blob(
            r#"{"databases": {"default": {"default": {
                "database": "pantheon", "username": "pantheon", "password": 1234,
                "port": "3306", "driver": ["odd"]
            }}}, "conf": "whatever"}"#,
        )?;

        assert_eq!(credentials.database.as_deref(), Some("pantheon"));
        assert_eq!(credentials.username.as_deref(), Some("pantheon"));
        assert_eq!(credentials.password.as_deref(), Some("1234"));
        assert_eq!(credentials.host, None);

        assert_eq!(Credentials::from_blob("[]")?, Credentials::default());
        assert!(matches!(
            Credentials::from_blob("{broken"),
            Err(SettingsError::Decode(_))
        ));

        Ok(())
    }

    #[test]
    fn decode_rejects_garbage() {
        let result = "{not json".parse::<PressflowSettings>();
        assert!(matches!(result, Err(SettingsError::Decode(_))));
    }
}
