// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use bytes::Bytes;

use super::frame::{LoopbackFrame, RgbImage};
use super::ledger::ReleaseLedger;
use crate::core::engine::{GraphPacket, Releasable, TextureFrame};
use crate::core::{FrameFeedError, Result};

/// What a loopback packet carries.
#[derive(Debug)]
pub enum Payload {
    Texture(LoopbackFrame),
    Image(RgbImage),
    Audio {
        data: Bytes,
        channel_count: u16,
        num_samples: usize,
    },
    Header {
        channel_count: u16,
        sample_rate: f64,
    },
    Text(String),
}

#[derive(Debug)]
pub struct LoopbackPacket {
    ledger: Arc<ReleaseLedger>,
    timestamp: i64,
    payload: Payload,
}

impl LoopbackPacket {
    pub fn new(ledger: &Arc<ReleaseLedger>, payload: Payload, timestamp: i64) -> Self {
        ledger.packet_created();
        Self {
            ledger: Arc::clone(ledger),
            timestamp,
            payload,
        }
    }

    /// Packet owning a fresh frame for `texture_name`.
    pub fn texture(
        ledger: &Arc<ReleaseLedger>,
        texture_name: u32,
        width: u32,
        height: u32,
        timestamp: i64,
    ) -> Self {
        let frame = LoopbackFrame::new(ledger, texture_name, width, height, timestamp);
        Self::new(ledger, Payload::Texture(frame), timestamp)
    }

    pub fn audio(
        ledger: &Arc<ReleaseLedger>,
        data: Bytes,
        channel_count: u16,
        num_samples: usize,
        timestamp: i64,
    ) -> Self {
        Self::new(
            ledger,
            Payload::Audio {
                data,
                channel_count,
                num_samples,
            },
            timestamp,
        )
    }

    pub fn text(ledger: &Arc<ReleaseLedger>, text: impl Into<String>) -> Self {
        Self::new(ledger, Payload::Text(text.into()), 0)
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub(super) fn set_timestamp(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
    }
}

impl Releasable for LoopbackPacket {
    fn release(self) {
        self.ledger.packet_released();
        if let Payload::Texture(frame) = self.payload {
            frame.release();
        }
    }
}

impl GraphPacket for LoopbackPacket {
    type Frame = LoopbackFrame;

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn texture_frame(&self) -> Result<LoopbackFrame> {
        match &self.payload {
            Payload::Texture(frame) => Ok(LoopbackFrame::new(
                &self.ledger,
                frame.texture_name(),
                frame.width(),
                frame.height(),
                self.timestamp,
            )),
            other => Err(FrameFeedError::Graph(format!(
                "packet does not hold a texture: {}",
                kind(other)
            ))),
        }
    }

    fn audio_data(&self) -> Result<Bytes> {
        match &self.payload {
            Payload::Audio { data, .. } => Ok(data.clone()),
            other => Err(FrameFeedError::Graph(format!(
                "packet does not hold audio: {}",
                kind(other)
            ))),
        }
    }
}

fn kind(payload: &Payload) -> &'static str {
    match payload {
        Payload::Texture(_) => "texture",
        Payload::Image(_) => "image",
        Payload::Audio { .. } => "audio",
        Payload::Header { .. } => "header",
        Payload::Text(_) => "text",
    }
}
