// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use crate::core::frames::AudioFormat;
use crate::core::{FrameFeedError, Result};

/// Stream wiring of a session.
///
/// Replaced as a whole while the session is idle and read lock-free by
/// ingestion afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStreams {
    pub video_input: Option<String>,
    pub video_input_cpu: Option<String>,
    pub video_output: Option<String>,
    pub audio_input: Option<String>,
    pub audio_output: Option<String>,
    /// Set once audio streams are configured; constant afterwards.
    pub audio_format: Option<AudioFormat>,
}

impl SessionStreams {
    /// Names of every stream the session feeds or listens to.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        [
            &self.video_input,
            &self.video_input_cpu,
            &self.video_output,
            &self.audio_input,
            &self.audio_output,
        ]
        .into_iter()
        .filter_map(|name| name.as_deref())
    }
}

/// Which video ingestion path a session has committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum VideoPath {
    Gpu = 1,
    Cpu = 2,
}

impl VideoPath {
    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Gpu),
            2 => Some(Self::Cpu),
            _ => None,
        }
    }
}

pub(crate) fn validate_stream_name(role: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(FrameFeedError::Configuration(format!(
            "{} stream name must not be empty",
            role
        )));
    }
    Ok(())
}

/// Validates an input/output pair passed to one `add_*_streams` call.
pub(crate) fn validate_stream_pair(
    kind: &str,
    input: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    if let Some(input) = input {
        validate_stream_name(&format!("{} input", kind), input)?;
    }
    if let Some(output) = output {
        validate_stream_name(&format!("{} output", kind), output)?;
    }
    match (input, output) {
        (Some(input), Some(output)) if input == output => Err(FrameFeedError::Configuration(
            format!("{} input and output stream are both '{}'", kind, input),
        )),
        _ => Ok(()),
    }
}
