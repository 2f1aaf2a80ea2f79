// SPDX-License-Identifier: AGPL-3.0-or-later

use std::panic;

use futures::Future;
use tokio::runtime::Builder;

use crate::config::Configuration;
use crate::sink::SqlSink;
use crate::test_utils::test_config;

/// Run a test against a sink backed by a fresh in-memory SQLite database.
///
/// The connection pool is closed after the test, also when it panicked.
pub fn test_runner<T, Fut>(test: T)
where
    T: FnOnce(SqlSink) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    test_runner_with_config(test_config(), test)
}

/// Same as `test_runner` but constructs the sink with a custom configuration.
pub fn test_runner_with_config<T, Fut>(config: Configuration, test: T)
where
    T: FnOnce(SqlSink) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let _ = env_logger::builder().is_test(true).try_init();

    let runtime = Builder::new_current_thread()
        .enable_all()
        .thread_name("sqlsink_test")
        .build()
        .expect("Could not build tokio runtime for test");

    runtime.block_on(async {
        let sink = SqlSink::new(config)
            .await
            .expect("Could not construct sink for test");

        // Only the pool is needed for teardown, the test owns the sink
        let pool = sink.store().pool.clone();

        // A panic inside the test stays in its task until the pool is closed
        let result = tokio::spawn(test(sink)).await;

        pool.close().await;

        if let Err(err) = result {
            if err.is_panic() {
                panic::resume_unwind(err.into_panic());
            }

            panic!("Test task was cancelled: {}", err);
        }
    });
}
