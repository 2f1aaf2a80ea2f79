// SPDX-License-Identifier: AGPL-3.0-or-later

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{query, Row};

use crate::config::{Configuration, Dialect};
use crate::db::models::{format_timestamp, LogRecord, NewLogRecord};
use crate::db::schema::TableSchema;
use crate::db::traits::LogStore;
use crate::db::{connection_pool, Pool};
use crate::errors::SinkError;

/// SQL based storage for log records on top of a database agnostic connection pool.
#[derive(Clone, Debug)]
pub struct SqlStore {
    pub(crate) pool: Pool,
}

impl SqlStore {
    /// Create a new `SqlStore` using the provided db `Pool`.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Open a connection pool with the given configuration.
    pub async fn connect(config: &Configuration) -> Result<Self, SinkError> {
        let pool = connection_pool(config).await?;
        debug!(
            "Connected to {} database '{}'",
            config.dialect, config.database
        );

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl LogStore for SqlStore {
    async fn define_table(&self, schema: &TableSchema) -> Result<(), SinkError> {
        query(&schema.create_table_sql())
            .execute(&self.pool)
            .await
            .map_err(SinkError::from_store)?;

        Ok(())
    }

    async fn insert(
        &self,
        schema: &TableSchema,
        record: NewLogRecord,
        created_at: DateTime<Utc>,
        omit_null: bool,
    ) -> Result<LogRecord, SinkError> {
        let bound: Vec<(&str, Option<String>)> = record
            .optional_columns()
            .iter()
            .filter(|(_, value)| !omit_null || value.is_some())
            .map(|(name, value)| (*name, value.map(str::to_owned)))
            .collect();

        let names: Vec<&str> = bound.iter().map(|(name, _)| *name).collect();
        let sql = schema.insert_sql(&names);

        let mut statement = query(&sql)
            .bind(record.level.clone())
            .bind(record.msg.clone())
            .bind(format_timestamp(&created_at));

        for (_, value) in bound.iter() {
            statement = statement.bind(value.clone());
        }

        let id: i64 = match schema.dialect() {
            Dialect::Postgres => statement
                .fetch_one(&self.pool)
                .await
                .map_err(SinkError::from_store)?
                .try_get(0)
                .map_err(SinkError::Store)?,
            Dialect::Mysql | Dialect::Sqlite => statement
                .execute(&self.pool)
                .await
                .map_err(SinkError::from_store)?
                .last_insert_id()
                .ok_or_else(|| {
                    SinkError::Store(sqlx::Error::Protocol(
                        "Database did not report id of inserted row".into(),
                    ))
                })?,
        };

        trace!("Inserted log record {} into '{}'", id, schema.name());

        Ok(LogRecord::new(id, record, created_at))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
