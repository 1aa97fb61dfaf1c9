// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

mod egress;
mod error_channel;
mod ingest;
#[allow(clippy::module_inception)]
mod session;
mod state;
mod streams;

pub use error_channel::{ErrorChannel, ErrorListener};
pub use session::{OnWillAddFrame, Session};
pub use state::SessionState;
pub use streams::SessionStreams;
