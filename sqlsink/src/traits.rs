// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt::Debug;

use async_trait::async_trait;
use log::{Level, LevelFilter};
use serde_json::Value;

use crate::db::LogRecord;
use crate::errors::SinkError;

/// Destination a logging front-end hands log calls to.
#[async_trait]
pub trait LogSink: Send + Sync + Debug {
    /// Identifier of the sink.
    fn name(&self) -> &str;

    /// Minimum severity the sink accepts, used by front-ends for filtering.
    fn level(&self) -> LevelFilter;

    /// Persist one log call.
    ///
    /// Resolves to the stored record, or to `None` when the sink accepted the call without
    /// writing anything.
    async fn log(
        &self,
        level: Level,
        message: &str,
        metadata: Option<Value>,
    ) -> Result<Option<LogRecord>, SinkError>;

    /// Release all resources held by the sink.
    async fn close(&self);
}
