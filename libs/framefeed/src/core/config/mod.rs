// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Session wiring loaded from disk.

mod session_config;

pub use session_config::{AudioStreamsConfig, SessionConfig, VideoStreamsConfig};
