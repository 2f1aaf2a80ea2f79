// SPDX-License-Identifier: AGPL-3.0-or-later

use rstest::fixture;

use crate::config::{Configuration, Dialect, SQLITE_MEMORY};

/// Configuration for a sink writing into its own in-memory SQLite database.
#[fixture]
pub fn test_config() -> Configuration {
    Configuration {
        dialect: Dialect::Sqlite,
        database: SQLITE_MEMORY.into(),
        // Keep all statements on the same connection of the in-memory database
        max_connections: 1,
        ..Configuration::default()
    }
}
