// SPDX-License-Identifier: AGPL-3.0-or-later

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use crate::db::{LogRecord, LogStore, NewLogRecord, TableSchema};
use crate::errors::SinkError;

/// Store which fails every insert as if the connection dropped mid-write.
#[derive(Clone, Debug, Default)]
pub struct RejectingStore {
    reject_define_table: bool,
    insert_attempts: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl RejectingStore {
    /// Store which already fails when the table gets declared.
    pub fn failing_define_table() -> Self {
        Self {
            reject_define_table: true,
            ..Self::default()
        }
    }

    /// Number of times `insert` was called.
    pub fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn dropped_connection() -> sqlx::Error {
    sqlx::Error::Io(io::Error::new(
        io::ErrorKind::ConnectionReset,
        "simulated connection drop",
    ))
}

#[async_trait]
impl LogStore for RejectingStore {
    async fn define_table(&self, _schema: &TableSchema) -> Result<(), SinkError> {
        if self.reject_define_table {
            return Err(SinkError::Store(sqlx::Error::Protocol(
                "simulated table conflict".into(),
            )));
        }

        Ok(())
    }

    async fn insert(
        &self,
        _schema: &TableSchema,
        _record: NewLogRecord,
        _created_at: DateTime<Utc>,
        _omit_null: bool,
    ) -> Result<LogRecord, SinkError> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::from_store(dropped_connection()))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Store whose inserts stay pending until the test releases them.
#[derive(Clone, Debug, Default)]
pub struct GatedStore {
    started: Arc<Notify>,
    release: Arc<Notify>,
    closed: Arc<AtomicBool>,
}

impl GatedStore {
    /// Resolves once an insert reached the store.
    pub async fn insert_started(&self) {
        self.started.notified().await;
    }

    /// Let one pending insert finish.
    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogStore for GatedStore {
    async fn define_table(&self, _schema: &TableSchema) -> Result<(), SinkError> {
        Ok(())
    }

    async fn insert(
        &self,
        _schema: &TableSchema,
        record: NewLogRecord,
        created_at: DateTime<Utc>,
        _omit_null: bool,
    ) -> Result<LogRecord, SinkError> {
        self.started.notify_one();
        self.release.notified().await;

        Ok(LogRecord::new(1, record, created_at))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
