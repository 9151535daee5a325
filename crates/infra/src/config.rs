//! Process configuration read from environment variables.
//!
//! | variable | values | default |
//! |---|---|---|
//! | `INVOICER_STORAGE` | `local`, `remote` (templates and drafts) | `local` |
//! | `INVOICER_DATA_DIR` | directory for the JSON files | platform data dir |
//! | `DATABASE_URL` | Postgres URL | required for `remote` |
//! | `INVOICER_USER_ID` | user id | required for `remote` |
//! | `INVOICER_USER_EMAIL` | email | empty |
//! | `INVOICER_USER_ROLE` | `user`, `admin` | `user` |
//! | `INVOICER_LOG_FORMAT` | `json`, `pretty` | `json` |

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use invoicer_core::UserId;
use invoicer_invoicing::{User, UserRole};
use invoicer_observability::LogFormat;

use crate::storage::FileStorage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("{var} must be set when INVOICER_STORAGE=remote")]
    Missing { var: &'static str },

    #[error("no data directory could be determined; set INVOICER_DATA_DIR")]
    NoDataDir,
}

/// Where templates and drafts are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// JSON files in the data directory.
    Local,
    /// A shared Postgres database, scoped to one user.
    Remote { database_url: String, user: User },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicerConfig {
    pub storage: StorageMode,
    /// Local JSON files. Invoices always live here, in either mode.
    pub data_dir: PathBuf,
    pub log_format: LogFormat,
}

impl InvoicerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let log_format = match get("INVOICER_LOG_FORMAT") {
            None => LogFormat::default(),
            Some(raw) => LogFormat::from_str(&raw).map_err(|e| ConfigError::Invalid {
                var: "INVOICER_LOG_FORMAT",
                message: e.to_string(),
            })?,
        };

        let data_dir = match get("INVOICER_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => FileStorage::default_location()
                .map_err(|_| ConfigError::NoDataDir)?
                .dir()
                .to_path_buf(),
        };

        let mode = get("INVOICER_STORAGE").unwrap_or_else(|| "local".to_string());
        let storage = match mode.trim().to_ascii_lowercase().as_str() {
            "local" => StorageMode::Local,
            "remote" => {
                let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing {
                    var: "DATABASE_URL",
                })?;
                let id: UserId = get("INVOICER_USER_ID")
                    .ok_or(ConfigError::Missing {
                        var: "INVOICER_USER_ID",
                    })?
                    .parse()
                    .map_err(|e: invoicer_core::DomainError| ConfigError::Invalid {
                        var: "INVOICER_USER_ID",
                        message: e.to_string(),
                    })?;
                let role = match get("INVOICER_USER_ROLE") {
                    None => UserRole::default(),
                    Some(raw) => raw.parse().map_err(|e: invoicer_core::DomainError| {
                        ConfigError::Invalid {
                            var: "INVOICER_USER_ROLE",
                            message: e.to_string(),
                        }
                    })?,
                };
                let user = User {
                    id,
                    email: get("INVOICER_USER_EMAIL").unwrap_or_default(),
                    role,
                };
                StorageMode::Remote { database_url, user }
            }
            other => {
                return Err(ConfigError::Invalid {
                    var: "INVOICER_STORAGE",
                    message: format!("unknown storage mode '{other}' (expected 'local' or 'remote')"),
                });
            }
        };

        Ok(Self {
            storage,
            data_dir,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<InvoicerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        InvoicerConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn local_with_explicit_dir() {
        let cfg = config(&[("INVOICER_DATA_DIR", "/tmp/invoices")]).unwrap();
        assert_eq!(cfg.storage, StorageMode::Local);
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/invoices"));
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn remote_requires_database_url_and_user() {
        let err = config(&[("INVOICER_STORAGE", "remote"), ("INVOICER_DATA_DIR", "/d")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing { var: "DATABASE_URL" });

        let err = config(&[
            ("INVOICER_STORAGE", "remote"),
            ("INVOICER_DATA_DIR", "/d"),
            ("DATABASE_URL", "postgres://localhost/invoicer"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing { var: "INVOICER_USER_ID" });
    }

    #[test]
    fn remote_user_is_assembled() {
        let cfg = config(&[
            ("INVOICER_STORAGE", "Remote"),
            ("INVOICER_DATA_DIR", "/d"),
            ("DATABASE_URL", "postgres://localhost/invoicer"),
            ("INVOICER_USER_ID", "u-1"),
            ("INVOICER_USER_EMAIL", "a@example.com"),
            ("INVOICER_USER_ROLE", "admin"),
            ("INVOICER_LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        let StorageMode::Remote { database_url, user } = cfg.storage else {
            panic!("expected remote mode");
        };
        assert_eq!(database_url, "postgres://localhost/invoicer");
        assert_eq!(user.id.as_str(), "u-1");
        assert!(user.is_admin());
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            config(&[("INVOICER_DATA_DIR", "/d"), ("INVOICER_STORAGE", "s3")]),
            Err(ConfigError::Invalid { var: "INVOICER_STORAGE", .. })
        ));
        assert!(matches!(
            config(&[("INVOICER_DATA_DIR", "/x"), ("INVOICER_LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid { var: "INVOICER_LOG_FORMAT", .. })
        ));
    }
}
