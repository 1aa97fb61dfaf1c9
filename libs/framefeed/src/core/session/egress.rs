// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Output callbacks that fan graph outputs out to registered consumers.
//!
//! Delivery is synchronous on the engine's output thread: a slow consumer
//! delays the ones after it and holds up the engine.

use std::sync::Arc;

use super::error_channel::ErrorChannel;
use crate::core::consumers::{AudioDataConsumer, ConsumerRegistry, TextureFrameConsumer};
use crate::core::engine::{GraphEngine, GraphPacket, PacketCallback, TextureFrame};
use crate::core::frames::AudioFormat;

/// Callback for a video output stream.
///
/// Every consumer in the snapshot gets its own frame handle for the same
/// texture, so each can release independently.
pub(crate) fn video_fan_out<G: GraphEngine>(
    stream: String,
    consumers: Arc<ConsumerRegistry<dyn TextureFrameConsumer<G::Frame>>>,
    errors: Arc<ErrorChannel>,
) -> PacketCallback<G::Packet> {
    Box::new(move |packet: &G::Packet| {
        let snapshot = consumers.snapshot();
        for (index, consumer) in snapshot.iter().enumerate() {
            let frame = match packet.texture_frame() {
                Ok(frame) => frame,
                Err(error) => {
                    errors.report(error);
                    continue;
                }
            };
            tracing::trace!(
                stream = %stream,
                texture = frame.texture_name(),
                width = frame.width(),
                height = frame.height(),
                consumer = index,
                "Output tex"
            );
            consumer.on_new_frame(frame);
        }
    })
}

/// Callback for an audio output stream.
///
/// The payload is extracted once and shared read-only between consumers.
pub(crate) fn audio_fan_out<G: GraphEngine>(
    stream: String,
    consumers: Arc<ConsumerRegistry<dyn AudioDataConsumer>>,
    errors: Arc<ErrorChannel>,
    format: AudioFormat,
) -> PacketCallback<G::Packet> {
    Box::new(move |packet: &G::Packet| {
        let snapshot = consumers.snapshot();
        if snapshot.is_empty() {
            return;
        }

        let data = match packet.audio_data() {
            Ok(data) => data,
            Err(error) => {
                errors.report(error);
                return;
            }
        };
        let timestamp = packet.timestamp();
        tracing::trace!(
            stream = %stream,
            bytes = data.len(),
            timestamp,
            consumers = snapshot.len(),
            "Output audio"
        );
        for consumer in snapshot.iter() {
            consumer.on_new_audio_data(data.clone(), timestamp, format);
        }
    })
}
