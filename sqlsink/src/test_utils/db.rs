// SPDX-License-Identifier: AGPL-3.0-or-later

use sqlx::{query_as, query_scalar, FromRow};

use crate::sink::SqlSink;

/// Log table row as it was read back from the database.
#[derive(FromRow, Debug)]
pub struct LogRow {
    pub id: i64,
    pub level: String,
    pub msg: String,
    pub meta: Option<String>,
    pub created_at: String,
    pub ip_address: Option<String>,
    pub session_id: Option<String>,
    pub route: Option<String>,
    pub query: Option<String>,
    pub body: Option<String>,
    pub host: Option<String>,
    pub url: Option<String>,
}

/// All rows the sink has written so far, oldest first.
pub async fn fetch_rows(sink: &SqlSink) -> Vec<LogRow> {
    query_as::<_, LogRow>(&format!(
        "
        SELECT
            id,
            level,
            msg,
            meta,
            created_at,
            ip_address,
            session_id,
            route,
            query,
            body,
            host,
            url
        FROM
            \"{}\"
        ORDER BY
            id ASC
        ",
        sink.config().table
    ))
    .fetch_all(&sink.store().pool)
    .await
    .expect("Could not read log table")
}

/// Number of rows in the sink's table.
pub async fn count_rows(sink: &SqlSink) -> i64 {
    query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM \"{}\"",
        sink.config().table
    ))
    .fetch_one(&sink.store().pool)
    .await
    .expect("Could not count rows of log table")
}
