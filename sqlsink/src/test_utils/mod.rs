// SPDX-License-Identifier: AGPL-3.0-or-later

mod config;
mod db;
mod runner;
mod store;

pub use config::test_config;
pub use db::{count_rows, fetch_rows};
pub use runner::{test_runner, test_runner_with_config};
pub use store::{GatedStore, RejectingStore};
