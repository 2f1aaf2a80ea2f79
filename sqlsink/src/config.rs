// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use log::LevelFilter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyConnectOptions;
use sqlx::mysql::MySqlConnectOptions;
use sqlx::postgres::PgConnectOptions;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::ConnectOptions;

use crate::errors::SinkError;

/// Prefix of environment variables which are picked up by [`Configuration::load`].
pub const ENV_PREFIX: &str = "SQLSINK_";

/// Database name which makes SQLite keep everything in memory.
pub const SQLITE_MEMORY: &str = ":memory:";

/// Table names end up unescaped in generated statements, only allow plain identifiers.
static TABLE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").unwrap());

/// Database engine the sink is talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL or MariaDB.
    #[serde(alias = "mariadb")]
    Mysql,

    /// PostgreSQL.
    #[serde(alias = "postgresql")]
    Postgres,

    /// SQLite, `database` is interpreted as a file path or `:memory:`.
    Sqlite,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::Mysql
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Mysql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        };

        write!(f, "{}", name)
    }
}

/// Configuration of a [`SqlSink`](crate::SqlSink).
///
/// Set once when the sink gets constructed. To change any of these values a new sink instance
/// needs to be created.
///
/// Keys are camelCase (`omitNull`, `maxConnections`) in every source. Environment variables use
/// the upper snake case form behind the prefix, e.g. `SQLSINK_OMIT_NULL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    /// Minimum severity a log record needs to be accepted by the sink. Defaults to `info`.
    pub level: LevelFilter,

    /// Database engine. Defaults to MySQL.
    pub dialect: Dialect,

    /// Database host. Ignored for SQLite. Defaults to "localhost".
    pub host: String,

    /// Database port. Ignored for SQLite. Defaults to 3306, also for PostgreSQL.
    pub port: u16,

    /// Name of the database, or for SQLite the path to the database file. Defaults to "log".
    pub database: String,

    /// Database user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password of the database user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Leave columns without a value out of the INSERT statement so the database default applies
    /// instead of an explicit NULL.
    pub omit_null: bool,

    /// Name of the table log records are written into. Defaults to "log".
    pub table: String,

    /// Log every SQL statement which is sent to the database.
    pub logging: bool,

    /// Accept log calls without writing anything.
    pub silent: bool,

    /// Maximum number of connections the pool keeps open. Defaults to 10.
    pub max_connections: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            dialect: Dialect::default(),
            host: "localhost".into(),
            port: 3306,
            database: "log".into(),
            username: None,
            password: None,
            omit_null: false,
            table: "log".into(),
            logging: false,
            silent: false,
            max_connections: 10,
        }
    }
}

impl Configuration {
    /// Get configuration from 1. defaults, 2. an optional .toml file and 3. environment variables
    /// prefixed with `SQLSINK_` (in that order, later sources take precedence).
    pub fn load(path: Option<&Path>) -> Result<Self, SinkError> {
        let mut figment = Figment::from(Serialized::defaults(Configuration::default()));

        if let Some(path) = path {
            if !path.exists() {
                return Err(SinkError::Configuration(format!(
                    "Config file '{}' does not exist",
                    path.display()
                )));
            }

            figment = figment.merge(Toml::file(path));
        }

        let env = Env::prefixed(ENV_PREFIX)
            .lowercase(false)
            .map(|key| env_key(key.as_str()).into());

        let config: Configuration = figment.merge(env).extract()?;
        config.validate()?;

        Ok(config)
    }

    /// Check that all values can be used to open a connection and declare the table.
    pub fn validate(&self) -> Result<(), SinkError> {
        if !TABLE_NAME_REGEX.is_match(&self.table) {
            return Err(SinkError::Configuration(format!(
                "Table name '{}' is not a valid identifier",
                self.table
            )));
        }

        if self.database.is_empty() {
            return Err(SinkError::Configuration("Database name is empty".into()));
        }

        if self.dialect != Dialect::Sqlite {
            if self.host.is_empty() {
                return Err(SinkError::Configuration("Database host is empty".into()));
            }

            if self.port == 0 {
                return Err(SinkError::Configuration("Database port is 0".into()));
            }
        }

        if self.max_connections == 0 {
            return Err(SinkError::Configuration(
                "Connection pool needs at least one connection".into(),
            ));
        }

        Ok(())
    }

    /// Connection options for the database driver matching the configured dialect.
    pub(crate) fn connect_options(&self) -> Result<AnyConnectOptions, SinkError> {
        let mut options: AnyConnectOptions = match self.dialect {
            Dialect::Mysql => {
                let mut options = MySqlConnectOptions::new()
                    .host(&self.host)
                    .port(self.port)
                    .database(&self.database);

                if let Some(username) = &self.username {
                    options = options.username(username);
                }

                if let Some(password) = &self.password {
                    options = options.password(password);
                }

                options.into()
            }
            Dialect::Postgres => {
                let mut options = PgConnectOptions::new()
                    .host(&self.host)
                    .port(self.port)
                    .database(&self.database);

                if let Some(username) = &self.username {
                    options = options.username(username);
                }

                if let Some(password) = &self.password {
                    options = options.password(password);
                }

                options.into()
            }
            Dialect::Sqlite => {
                if self.database == SQLITE_MEMORY {
                    // Gives every pool its own in-memory database, shared between its connections
                    SqliteConnectOptions::from_str("sqlite::memory:")
                        .map_err(|err| SinkError::Configuration(err.to_string()))?
                        .into()
                } else {
                    SqliteConnectOptions::new()
                        .filename(&self.database)
                        .create_if_missing(true)
                        .into()
                }
            }
        };

        if self.logging {
            options.log_statements(LevelFilter::Debug);
        } else {
            options.disable_statement_logging();
        }

        Ok(options)
    }
}

/// Turn the unprefixed name of an environment variable into a configuration key, for example
/// `MAX_CONNECTIONS` into `maxConnections`.
fn env_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut upper = false;

    for c in name.chars() {
        if c == '_' {
            upper = !key.is_empty();
        } else if upper {
            key.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            key.push(c.to_ascii_lowercase());
        }
    }

    key
}
