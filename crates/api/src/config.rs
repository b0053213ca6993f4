//! Process configuration, read once from the environment at startup.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use url::Url;

use pawmart_infra::document_store::MongoConnectOptions;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_NAME: &str = "PawMartStore";
const DEFAULT_APP_NAME: &str = "PawMart";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to read env file: {0}")]
    EnvFile(String),
}

/// Load `KEY=value` lines from `path` into the process environment.
///
/// Variables already set in the environment win over the file. A missing file
/// is not an error and yields `Ok(None)`.
pub fn load_env_file(path: &Path) -> Result<Option<PathBuf>, ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(Some(path.to_path_buf())),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(ConfigError::EnvFile(format!("{}: {e}", path.display()))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Process-local store; contents are lost on exit.
    Memory,
    Mongo(MongoConnectOptions),
}

#[derive(Clone, PartialEq, Eq)]
pub enum AuthConfig {
    Firebase { project_id: String },
    Hs256 { secret: String },
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AuthConfig::Firebase { project_id } => f
                .debug_struct("Firebase")
                .field("project_id", project_id)
                .finish(),
            AuthConfig::Hs256 { .. } => f.debug_struct("Hs256").finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub store: StoreConfig,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: format!("{e}"),
            })?,
            None => {
                info!("PORT not set, using default: {DEFAULT_PORT}");
                DEFAULT_PORT
            }
        };

        let store = match get("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("mongo") => {
                let database = get("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string());
                let app_name = get("DB_APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string());
                let uri = match get("MONGODB_URI") {
                    Some(uri) => uri,
                    None => atlas_uri(
                        &require("DB_USER")?,
                        &require("DB_PASS")?,
                        &require("DB_HOST")?,
                        &app_name,
                    )?,
                };
                StoreConfig::Mongo(MongoConnectOptions {
                    uri,
                    database,
                    app_name: Some(app_name),
                })
            }
            Some("memory") => StoreConfig::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    reason: format!("expected 'mongo' or 'memory', got '{other}'"),
                });
            }
        };

        let auth = match get("AUTH_MODE").as_deref().map(str::trim) {
            None | Some("firebase") => AuthConfig::Firebase {
                project_id: require("FIREBASE_PROJECT_ID")?,
            },
            Some("hs256") => AuthConfig::Hs256 {
                secret: require("AUTH_HS256_SECRET")?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "AUTH_MODE",
                    reason: format!("expected 'firebase' or 'hs256', got '{other}'"),
                });
            }
        };

        Ok(Self { port, store, auth })
    }
}

/// `mongodb+srv://<user>:<pass>@<host>/?appName=<app>` with credentials percent-encoded.
fn atlas_uri(user: &str, pass: &str, host: &str, app_name: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: "DB_HOST",
        reason,
    };

    let mut url = Url::parse(&format!("mongodb+srv://{}/", host.trim()))
        .map_err(|e| invalid(e.to_string()))?;
    url.set_username(user)
        .map_err(|_| invalid("host cannot carry credentials".to_string()))?;
    url.set_password(Some(pass))
        .map_err(|_| invalid("host cannot carry credentials".to_string()))?;
    url.query_pairs_mut().append_pair("appName", app_name);

    Ok(url.into())
}
