// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameFeedError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Packet creation failed: {0}")]
    PacketCreation(String),

    #[error("Session is closed: {0}")]
    SessionClosed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FrameFeedError {
    /// Control-plane errors are raised to the caller; everything else is a
    /// data-plane failure routed through the session's error channel.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, FrameFeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(FrameFeedError::Configuration("x".into()).is_configuration());
        assert!(!FrameFeedError::Graph("x".into()).is_configuration());
        assert!(!FrameFeedError::SessionClosed("x".into()).is_configuration());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = FrameFeedError::Graph("timestamp bound exceeded".into());
        assert_eq!(err.to_string(), "Graph error: timestamp bound exceeded");
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: FrameFeedError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "boom");
    }
}
