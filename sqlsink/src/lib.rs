// SPDX-License-Identifier: AGPL-3.0-or-later

//! # sqlsink
//!
//! Log sink persisting every log call as a single row in a MySQL, PostgreSQL or SQLite table.
//!
//! ```no_run
//! # async fn run() -> Result<(), sqlsink::SinkError> {
//! use log::Level;
//! use serde_json::json;
//! use sqlsink::{Configuration, Dialect, LogSink, Logger, SqlSink};
//!
//! let sink = SqlSink::new(Configuration {
//!     dialect: Dialect::Postgres,
//!     port: 5432,
//!     username: Some("logger".into()),
//!     ..Configuration::default()
//! })
//! .await?;
//!
//! let logger = Logger::new().with_sink(sink);
//! logger
//!     .log(Level::Error, "disk full", Some(json!({ "ip": "10.0.0.1" })))
//!     .await;
//! logger.close().await;
//! # Ok(())
//! # }
//! ```
#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

mod config;
mod db;
mod errors;
mod logger;
mod metadata;
mod sink;
mod traits;

#[cfg(test)]
mod test_utils;

pub use crate::config::{Configuration, Dialect, ENV_PREFIX, SQLITE_MEMORY};
pub use crate::db::{LogRecord, LogStore, NewLogRecord, SqlStore, TableSchema};
pub use crate::errors::SinkError;
pub use crate::logger::{Logger, SinkOutcome};
pub use crate::metadata::{map_record, normalize};
pub use crate::sink::{LogResult, SqlSink, SINK_NAME};
pub use crate::traits::LogSink;
