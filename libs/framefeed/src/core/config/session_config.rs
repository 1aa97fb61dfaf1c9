// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Session wiring via `framefeed.yaml`.

use crate::core::{FrameFeedError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Video section of `framefeed.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStreamsConfig {
    #[serde(default)]
    pub input_stream: Option<String>,
    /// Stream fed with decoded CPU images instead of GPU frames.
    #[serde(default)]
    pub input_stream_cpu: Option<String>,
    #[serde(default)]
    pub output_stream: Option<String>,
    /// Host GL context the graph should share textures with.
    #[serde(default)]
    pub parent_gl_context: Option<u64>,
}

/// Audio section of `framefeed.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioStreamsConfig {
    #[serde(default)]
    pub input_stream: Option<String>,
    #[serde(default)]
    pub output_stream: Option<String>,
    #[serde(default = "default_channel_count")]
    pub channel_count: u16,
    pub sample_rate: u32,
}

fn default_channel_count() -> u16 {
    1
}

/// Session configuration from `framefeed.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub video: Option<VideoStreamsConfig>,
    #[serde(default)]
    pub audio: Option<AudioStreamsConfig>,
}

impl SessionConfig {
    /// Configuration file name.
    pub const FILE_NAME: &'static str = "framefeed.yaml";

    /// Parses a configuration document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            FrameFeedError::Configuration(format!("Failed to parse session config: {}", e))
        })
    }

    /// Load session configuration from a directory. Returns error if file is
    /// missing or cannot be parsed.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            FrameFeedError::Configuration(format!(
                "Failed to read {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            FrameFeedError::Configuration(format!(
                "Failed to parse {}: {}",
                config_path.display(),
                e
            ))
        })?;

        tracing::info!("Loaded session config from {}", config_path.display());
        Ok(config)
    }

    /// Load session configuration from a directory, returning defaults if the
    /// file is missing or unparseable.
    pub fn load_or_default(dir: &Path) -> Self {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            tracing::debug!(
                "No {} found in {}, using defaults",
                Self::FILE_NAME,
                dir.display()
            );
            return Self::default();
        }

        match Self::load(dir) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }
}
