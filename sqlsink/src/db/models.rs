// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, Utc};

/// Format timestamps are sent to the database in, also how SQLite stores them.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Row values derived from a single log call, before the database assigned an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewLogRecord {
    /// Lower-case level name.
    pub level: String,

    /// Log message.
    pub msg: String,

    /// JSON encoded metadata.
    pub meta: Option<String>,

    pub ip_address: Option<String>,

    pub session_id: Option<String>,

    pub route: Option<String>,

    pub query: Option<String>,

    pub body: Option<String>,

    pub host: Option<String>,

    pub url: Option<String>,
}

impl NewLogRecord {
    /// Values of all nullable columns, paired with their column name.
    pub fn optional_columns(&self) -> [(&'static str, Option<&str>); 8] {
        [
            ("meta", self.meta.as_deref()),
            ("ip_address", self.ip_address.as_deref()),
            ("session_id", self.session_id.as_deref()),
            ("route", self.route.as_deref()),
            ("query", self.query.as_deref()),
            ("body", self.body.as_deref()),
            ("host", self.host.as_deref()),
            ("url", self.url.as_deref()),
        ]
    }
}

/// Log record as it was persisted in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Id assigned by the database.
    pub id: i64,

    pub level: String,

    pub msg: String,

    pub meta: Option<String>,

    /// Time of the log call, set by the sink.
    pub created_at: DateTime<Utc>,

    pub ip_address: Option<String>,

    pub session_id: Option<String>,

    pub route: Option<String>,

    pub query: Option<String>,

    pub body: Option<String>,

    pub host: Option<String>,

    pub url: Option<String>,
}

impl LogRecord {
    /// Combine the mapped row values with what got assigned during the insert.
    pub fn new(id: i64, record: NewLogRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            level: record.level,
            msg: record.msg,
            meta: record.meta,
            created_at,
            ip_address: record.ip_address,
            session_id: record.session_id,
            route: record.route,
            query: record.query,
            body: record.body,
            host: record.host,
            url: record.url,
        }
    }
}

/// Render a timestamp the way it is bound in insert statements.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
