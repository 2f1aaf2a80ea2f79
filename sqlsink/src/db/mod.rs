// SPDX-License-Identifier: AGPL-3.0-or-later

//! Persistent storage for log records supporting MySQL, PostgreSQL and SQLite databases.
//!
//! The main interface is the [`LogStore`] trait, implemented by [`SqlStore`] on top of a database
//! agnostic connection pool.
use sqlx::any::{AnyPool, AnyPoolOptions};

use crate::config::Configuration;
use crate::errors::SinkError;

pub mod models;
pub mod schema;
pub mod store;
pub mod traits;

pub use models::{LogRecord, NewLogRecord};
pub use schema::TableSchema;
pub use store::SqlStore;
pub use traits::LogStore;

/// Re-export of generic connection pool type.
pub type Pool = AnyPool;

/// Create a database agnostic connection pool.
///
/// Establishes a first connection right away, an unreachable database or bad credentials fail
/// here already.
pub async fn connection_pool(config: &Configuration) -> Result<Pool, SinkError> {
    let options = config.connect_options()?;

    let pool: Pool = AnyPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(SinkError::Connection)?;

    Ok(pool)
}
