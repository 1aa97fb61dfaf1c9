// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Subscriber setup for hosts that do not install their own.
//!
//! Library code only emits `tracing` events. Applications embedding a
//! session normally install a subscriber themselves; this helper exists for
//! small hosts, tests and benches.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted for the filter, e.g. `framefeed=trace`.
pub const LOG_ENV_VAR: &str = "FRAMEFEED_LOG";

/// Installs a formatting subscriber filtered by [`LOG_ENV_VAR`], falling back
/// to `default_directive` when unset or unparseable. Events are written to
/// stderr.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
