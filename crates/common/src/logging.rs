// SDB - SQL Script Debugger
// Copyright (C) 2026 The SDB Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Logging setup shared by the SDB binaries and tests

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TEST_LOGGING: Once = Once::new();

/// Initialize logging for a binary.
///
/// `RUST_LOG` overrides `default_directive` when set.
pub fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Initialize logging for tests, exactly once per process.
///
/// Safe to call from every test; later calls are no-ops. Output goes through
/// the test writer so it is captured per test.
pub fn ensure_test_logging() {
    TEST_LOGGING.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
