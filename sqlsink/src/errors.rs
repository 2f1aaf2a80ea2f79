// SPDX-License-Identifier: AGPL-3.0-or-later

use thiserror::Error;

/// Represents all the ways constructing a sink or writing a log record can fail.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Configuration is malformed, the sink can not be constructed.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Database could not be reached, either while connecting or during a write.
    #[error("Could not connect to database: {0}")]
    Connection(#[source] sqlx::Error),

    /// Sink was closed before the log call was made.
    #[error("Sink connection is already closed")]
    ConnectionClosed,

    /// Log call violates a precondition or does not fit into the table columns.
    #[error("Invalid log record: {0}")]
    Validation(String),

    /// Database rejected the statement.
    #[error("Database error: {0}")]
    Store(#[source] sqlx::Error),
}

impl SinkError {
    /// Sort an error returned by the database driver into a connection or a store error.
    pub(crate) fn from_store(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::WorkerCrashed => Self::Connection(err),
            sqlx::Error::PoolClosed => Self::ConnectionClosed,
            err => Self::Store(err),
        }
    }
}

impl From<figment::Error> for SinkError {
    fn from(err: figment::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}
