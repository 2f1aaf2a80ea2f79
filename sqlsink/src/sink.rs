// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use log::{debug, info, Level, LevelFilter};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::RwLock;

use crate::config::Configuration;
use crate::db::{LogRecord, LogStore, SqlStore, TableSchema};
use crate::errors::SinkError;
use crate::metadata::map_record;
use crate::traits::LogSink;

/// Name the sink reports to front-ends.
pub const SINK_NAME: &str = "sql";

/// Outcome of a single log call.
pub type LogResult = Result<Option<LogRecord>, SinkError>;

/// Sink writing every log call as one row into a database table.
///
/// Cloning is cheap, all clones share the same connection pool and are closed together.
#[derive(Debug)]
pub struct SqlSink<S = SqlStore> {
    config: Arc<Configuration>,
    schema: Arc<TableSchema>,
    store: Arc<S>,
    closed: Arc<AtomicBool>,
    in_flight: Arc<RwLock<()>>,
}

impl<S> Clone for SqlSink<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            schema: self.schema.clone(),
            store: self.store.clone(),
            closed: self.closed.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl SqlSink<SqlStore> {
    /// Connect to the configured database and declare the log table.
    pub async fn new(config: Configuration) -> Result<Self, SinkError> {
        config.validate()?;
        let store = SqlStore::connect(&config).await?;
        Self::with_store(config, store).await
    }
}

impl<S> SqlSink<S>
where
    S: LogStore + 'static,
{
    /// Declare the log table through an already connected store.
    ///
    /// The store gets closed again when the table can not be declared.
    pub async fn with_store(config: Configuration, store: S) -> Result<Self, SinkError> {
        config.validate()?;

        let schema = TableSchema::new(&config.table, config.dialect);
        if let Err(err) = store.define_table(&schema).await {
            store.close().await;
            return Err(err);
        }

        info!(
            "Writing log records into table '{}' ({})",
            schema.name(),
            schema.dialect()
        );

        Ok(Self {
            config: Arc::new(config),
            schema: Arc::new(schema),
            store: Arc::new(store),
            closed: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(RwLock::new(())),
        })
    }

    /// Configuration the sink was constructed with.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Storage the sink writes into.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns true after `close` was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Write one log record.
    ///
    /// A silent sink returns `None` right away without touching the database. Otherwise exactly
    /// one row is inserted, with `created_at` taken at the time of this call. Failures are
    /// returned as they are, nothing is retried.
    pub async fn write(&self, level: Level, message: &str, metadata: Option<Value>) -> LogResult {
        if self.config.silent {
            return Ok(None);
        }

        if self.is_closed() {
            return Err(SinkError::ConnectionClosed);
        }

        // Held until the insert resolved, `close` waits for all of these
        let _in_flight = self.in_flight.read().await;

        // The sink might have been closed while waiting for the guard
        if self.is_closed() {
            return Err(SinkError::ConnectionClosed);
        }

        let created_at = Utc::now().trunc_subsecs(3);
        let record = map_record(level, message, metadata)?;

        let record = self
            .store
            .insert(&self.schema, record, created_at, self.config.omit_null)
            .await?;

        Ok(Some(record))
    }

    /// Write one log record in the background and report the outcome to `callback`.
    ///
    /// The callback is called exactly once. For silent sinks this happens before the method
    /// returns, otherwise from a task spawned on the current tokio runtime. When that runtime
    /// shuts down before the write finished the callback receives
    /// [`SinkError::ConnectionClosed`].
    pub fn log_with_callback<F>(
        &self,
        level: Level,
        message: impl Into<String>,
        metadata: Option<Value>,
        callback: F,
    ) where
        F: FnOnce(LogResult) + Send + 'static,
    {
        if self.config.silent {
            return callback(Ok(None));
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(err) => {
                return callback(Err(SinkError::Configuration(format!(
                    "Writing in the background requires a tokio runtime: {}",
                    err
                ))))
            }
        };

        let sink = self.clone();
        let message = message.into();
        let completion = Completion::new(callback);

        handle.spawn(async move {
            let result = sink.write(level, &message, metadata).await;
            completion.complete(result);
        });
    }
}

/// Callback of a background write which fires with `ConnectionClosed` when the write gets
/// dropped before it resolved.
struct Completion<F>
where
    F: FnOnce(LogResult),
{
    callback: Option<F>,
}

impl<F> Completion<F>
where
    F: FnOnce(LogResult),
{
    fn new(callback: F) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    fn complete(mut self, result: LogResult) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl<F> Drop for Completion<F>
where
    F: FnOnce(LogResult),
{
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback(Err(SinkError::ConnectionClosed));
        }
    }
}

#[async_trait]
impl<S> LogSink for SqlSink<S>
where
    S: LogStore + 'static,
{
    fn name(&self) -> &str {
        SINK_NAME
    }

    fn level(&self) -> LevelFilter {
        self.config.level
    }

    async fn log(
        &self,
        level: Level,
        message: &str,
        metadata: Option<Value>,
    ) -> Result<Option<LogRecord>, SinkError> {
        self.write(level, message, metadata).await
    }

    /// Reject all further log calls, then close the connection pool.
    ///
    /// Writes which were already accepted are finished before the pool shuts down.
    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        // Wait until every accepted write resolved
        drop(self.in_flight.write().await);

        self.store.close().await;
        debug!("Closed sink writing into '{}'", self.schema.name());
    }
}
