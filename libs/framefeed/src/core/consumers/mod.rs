// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Consumers of graph output and the registry that holds them.

mod registry;

use bytes::Bytes;

use crate::core::frames::AudioFormat;

pub use registry::ConsumerRegistry;

/// Receives frames produced on a video output stream.
///
/// Each call hands over an independent frame handle; the consumer releases
/// it when done.
pub trait TextureFrameConsumer<F>: Send + Sync {
    fn on_new_frame(&self, frame: F);
}

impl<F, T> TextureFrameConsumer<F> for T
where
    T: Fn(F) + Send + Sync,
{
    fn on_new_frame(&self, frame: F) {
        self(frame)
    }
}

/// Receives 16-bit PCM windows produced on an audio output stream.
pub trait AudioDataConsumer: Send + Sync {
    fn on_new_audio_data(&self, data: Bytes, timestamp_micros: i64, format: AudioFormat);
}

impl<T> AudioDataConsumer for T
where
    T: Fn(Bytes, i64, AudioFormat) + Send + Sync,
{
    fn on_new_audio_data(&self, data: Bytes, timestamp_micros: i64, format: AudioFormat) {
        self(data, timestamp_micros, format)
    }
}
