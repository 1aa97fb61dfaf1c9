// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Ingestion entry points of a [`Session`].
//!
//! Wiring mistakes are returned to the caller. Everything that goes wrong
//! once a buffer is on its way to the graph is routed through the session's
//! error channel and the call returns `Ok`.

use std::sync::atomic::Ordering;

use super::session::Session;
use super::streams::VideoPath;
use crate::core::engine::{GraphEngine, TextureFrame};
use crate::core::frames::AudioFormat;
use crate::core::transfer::{PacketTransfer, ReleaseGuard};
use crate::core::{FrameFeedError, Result};

impl<G: GraphEngine> Session<G> {
    /// Feeds a GPU frame to the video input stream.
    ///
    /// The frame is owned by the session from here on: it ends up in the
    /// graph or is released exactly once.
    pub fn submit_video_frame(&self, frame: G::Frame, timestamp: i64) -> Result<()> {
        tracing::trace!(
            texture = frame.texture_name(),
            width = frame.width(),
            height = frame.height(),
            timestamp,
            "Input tex"
        );
        let frame = ReleaseGuard::new(frame);

        let streams = self.streams.load();
        let Some(stream) = streams.video_input.as_deref() else {
            return Err(FrameFeedError::Configuration(
                "submit_video_frame requires a video input stream".into(),
            ));
        };
        if !self.admit_ingestion() {
            return Ok(());
        }
        self.claim_video_path(VideoPath::Gpu)?;
        self.notify_will_add_frame(timestamp);

        self.route(PacketTransfer::new(&*self.graph, stream).transfer_frame(frame, timestamp));
        Ok(())
    }

    /// Feeds a decoded CPU image to the CPU video input stream.
    ///
    /// The bitmap is copied; the caller keeps it.
    pub fn submit_bitmap_frame(&self, bitmap: &G::Bitmap, timestamp: i64) -> Result<()> {
        let streams = self.streams.load();
        let Some(stream) = streams.video_input_cpu.as_deref() else {
            return Err(FrameFeedError::Configuration(
                "submit_bitmap_frame requires a cpu video input stream".into(),
            ));
        };
        if !self.admit_ingestion() {
            return Ok(());
        }
        self.claim_video_path(VideoPath::Cpu)?;
        self.notify_will_add_frame(timestamp);

        self.route(PacketTransfer::new(&*self.graph, stream).transfer_bitmap(bitmap, timestamp));
        Ok(())
    }

    /// Feeds an interleaved 16-bit PCM window to the audio input stream.
    ///
    /// A window whose `format` differs from the configured one is dropped
    /// with a warning.
    pub fn submit_audio_data(
        &self,
        data: &[u8],
        timestamp_micros: i64,
        format: &AudioFormat,
    ) -> Result<()> {
        let streams = self.streams.load();
        let (Some(stream), Some(configured)) =
            (streams.audio_input.as_deref(), streams.audio_format)
        else {
            return Err(FrameFeedError::Configuration(
                "submit_audio_data requires an audio input stream".into(),
            ));
        };
        if !self.admit_ingestion() {
            return Ok(());
        }

        if let Some(difference) = configured.mismatch(format) {
            tracing::warn!(
                stream,
                timestamp_micros,
                "Producer audio format does not match the session's: {}",
                difference
            );
            return Ok(());
        }

        let num_samples = configured.sample_count(data.len());
        self.route(PacketTransfer::new(&*self.graph, stream).transfer_audio(
            data,
            configured.channel_count,
            num_samples,
            timestamp_micros,
        ));
        Ok(())
    }

    /// Starts the graph on first use. Returns `false` when the buffer must
    /// not be submitted; the reason has been reported already.
    ///
    /// A failed start still leaves the session started, so later submissions
    /// reach the engine and surface its state.
    fn admit_ingestion(&self) -> bool {
        match self.lifecycle.ensure_started(|| self.start_graph()) {
            Ok(_) => true,
            Err(error) => {
                tracing::debug!(state = ?self.lifecycle.state(), "Ingestion not admitted");
                self.errors.report(error);
                false
            }
        }
    }

    fn notify_will_add_frame(&self, timestamp: i64) {
        let listener = self.will_add_frame.read().clone();
        if let Some(listener) = listener {
            listener.on_will_add_frame(timestamp);
        }
    }

    /// Commits the session to one video path on its first admitted frame.
    fn claim_video_path(&self, path: VideoPath) -> Result<()> {
        match self.video_path.compare_exchange(
            0,
            path as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Ok(()),
            Err(current) if current == path as u8 => Ok(()),
            Err(current) => {
                let committed = VideoPath::from_u8(current).unwrap_or(path);
                Err(FrameFeedError::Configuration(format!(
                    "session already feeds video through the {:?} path, cannot switch to {:?}",
                    committed, path
                )))
            }
        }
    }

    fn route(&self, outcome: Result<()>) {
        if let Err(error) = outcome {
            self.errors.report(error);
        }
    }
}
