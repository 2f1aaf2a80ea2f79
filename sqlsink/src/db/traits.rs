// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::models::{LogRecord, NewLogRecord};
use crate::db::schema::TableSchema;
use crate::errors::SinkError;

/// Storage a sink writes log records into.
///
/// This is the only interface a sink uses to reach the database. Table existence and id
/// uniqueness are the responsibility of the implementer.
#[async_trait]
pub trait LogStore: Send + Sync + Debug {
    /// Declare the log table. Declaring a table which exists already is not an error.
    async fn define_table(&self, schema: &TableSchema) -> Result<(), SinkError>;

    /// Insert exactly one row and return it together with the id the database assigned.
    ///
    /// When `omit_null` is set, columns without a value are left out of the statement instead of
    /// being bound as NULL.
    async fn insert(
        &self,
        schema: &TableSchema,
        record: NewLogRecord,
        created_at: DateTime<Utc>,
        omit_null: bool,
    ) -> Result<LogRecord, SinkError>;

    /// Release all connections. Waits for connections which are currently in use.
    async fn close(&self);
}
