// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use futures::future::join_all;
use log::Level;
use serde_json::Value;

use crate::sink::LogResult;
use crate::traits::LogSink;

/// Outcome of a log call for one sink, together with the sink's name.
pub type SinkOutcome = (String, LogResult);

/// Logging front-end dispatching log calls to an explicit list of sinks.
#[derive(Debug, Default, Clone)]
pub struct Logger {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl Logger {
    /// Front-end without any sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the front-end with `sink` added to it.
    pub fn with_sink<T: LogSink + 'static>(mut self, sink: T) -> Self {
        self.add_sink(Arc::new(sink));
        self
    }

    /// Register another sink.
    pub fn add_sink(&mut self, sink: Arc<dyn LogSink>) {
        self.sinks.push(sink);
    }

    /// All registered sinks in the order they were added.
    pub fn sinks(&self) -> &[Arc<dyn LogSink>] {
        &self.sinks
    }

    /// Hand a log call to every sink whose level admits it.
    ///
    /// Sinks are called concurrently, the outcomes are returned in the order the sinks were
    /// added. Sinks which filtered the call out do not show up in the result.
    pub async fn log(
        &self,
        level: Level,
        message: &str,
        metadata: Option<Value>,
    ) -> Vec<SinkOutcome> {
        let calls = self
            .sinks
            .iter()
            .filter(|sink| level <= sink.level())
            .map(|sink| {
                let metadata = metadata.clone();

                async move {
                    let result = sink.log(level, message, metadata).await;
                    (sink.name().to_owned(), result)
                }
            });

        join_all(calls).await
    }

    /// Close all registered sinks.
    pub async fn close(&self) {
        join_all(self.sinks.iter().map(|sink| sink.close())).await;
    }
}
