// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU8;

use arc_swap::ArcSwap;
use parking_lot::RwLock;

use super::egress::{audio_fan_out, video_fan_out};
use super::error_channel::{ErrorChannel, ErrorListener};
use super::state::{Lifecycle, SessionState};
use super::streams::{SessionStreams, validate_stream_name, validate_stream_pair};
use crate::core::config::SessionConfig;
use crate::core::consumers::{AudioDataConsumer, ConsumerRegistry, TextureFrameConsumer};
use crate::core::dispatch::Dispatcher;
use crate::core::engine::{GraphEngine, GraphService, PacketCallback, Releasable};
use crate::core::frames::AudioFormat;
use crate::core::{FrameFeedError, Result};

/// Notified right before a video frame is handed to the graph, so correlated
/// packets can be fed to side streams at the same timestamp.
pub trait OnWillAddFrame: Send + Sync {
    fn on_will_add_frame(&self, timestamp: i64);
}

impl<T> OnWillAddFrame for T
where
    T: Fn(i64) + Send + Sync,
{
    fn on_will_add_frame(&self, timestamp: i64) {
        self(timestamp)
    }
}

/// One processing session on top of one graph instance.
///
/// Configure streams while idle, optionally [`preheat`](Self::preheat), feed
/// frames and audio from any thread, then [`close`](Self::close).
pub struct Session<G: GraphEngine> {
    pub(super) graph: Arc<G>,
    pub(super) lifecycle: Lifecycle,
    pub(super) streams: ArcSwap<SessionStreams>,
    /// Committed [`VideoPath`](super::streams::VideoPath), 0 while undecided.
    pub(super) video_path: AtomicU8,
    pub(super) video_consumers: Arc<ConsumerRegistry<dyn TextureFrameConsumer<G::Frame>>>,
    pub(super) audio_consumers: Arc<ConsumerRegistry<dyn AudioDataConsumer>>,
    pub(super) errors: Arc<ErrorChannel>,
    pub(super) will_add_frame: RwLock<Option<Arc<dyn OnWillAddFrame>>>,
}

impl<G: GraphEngine> Session<G> {
    pub fn new(graph: Arc<G>) -> Self {
        Self {
            graph,
            lifecycle: Lifecycle::new(),
            streams: ArcSwap::from_pointee(SessionStreams::default()),
            video_path: AtomicU8::new(0),
            video_consumers: Arc::new(ConsumerRegistry::new()),
            audio_consumers: Arc::new(ConsumerRegistry::new()),
            errors: Arc::new(ErrorChannel::new()),
            will_add_frame: RwLock::new(None),
        }
    }

    /// Creates a session wired for video input and, optionally, output.
    pub fn with_video_streams(
        graph: Arc<G>,
        input_stream: &str,
        output_stream: Option<&str>,
    ) -> Result<Self> {
        let session = Self::new(graph);
        session.add_video_streams(Some(input_stream), output_stream, None)?;
        Ok(session)
    }

    /// Creates a session wired as described by `config`.
    pub fn from_config(graph: Arc<G>, config: &SessionConfig) -> Result<Self> {
        let session = Self::new(graph);
        session.configure(config)?;
        Ok(session)
    }

    pub fn graph(&self) -> &Arc<G> {
        &self.graph
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    pub fn streams(&self) -> Arc<SessionStreams> {
        self.streams.load_full()
    }

    // =========================================================================
    // Configuration (idle only)
    // =========================================================================

    /// Applies every section of `config`.
    pub fn configure(&self, config: &SessionConfig) -> Result<()> {
        if let Some(video) = &config.video {
            if video.input_stream.is_some() || video.output_stream.is_some() {
                self.add_video_streams(
                    video.input_stream.as_deref(),
                    video.output_stream.as_deref(),
                    video.parent_gl_context,
                )?;
            }
            if let Some(cpu) = &video.input_stream_cpu {
                self.set_video_input_stream_cpu(cpu)?;
            }
        }
        if let Some(audio) = &config.audio {
            self.add_audio_streams(
                audio.input_stream.as_deref(),
                audio.output_stream.as_deref(),
                audio.channel_count,
                audio.sample_rate,
            )?;
        }
        Ok(())
    }

    /// Wires the GPU video input stream and the video output stream.
    ///
    /// The output stream gets a fan-out callback delivering to the video
    /// consumers. `parent_gl_context` lets graph GL contexts share textures
    /// with the host context.
    pub fn add_video_streams(
        &self,
        input_stream: Option<&str>,
        output_stream: Option<&str>,
        parent_gl_context: Option<u64>,
    ) -> Result<()> {
        self.lifecycle.configure("add_video_streams", || {
            validate_stream_pair("video", input_stream, output_stream)?;
            let current = self.streams.load_full();
            if output_stream.is_some() && current.video_output.is_some() {
                return Err(FrameFeedError::Configuration(format!(
                    "video output stream already configured as '{}'",
                    current.video_output.as_deref().unwrap_or_default()
                )));
            }

            if let Some(output) = output_stream {
                self.graph.register_output_callback(
                    output,
                    video_fan_out::<G>(
                        output.to_string(),
                        Arc::clone(&self.video_consumers),
                        Arc::clone(&self.errors),
                    ),
                )?;
            }
            if let Some(context) = parent_gl_context {
                self.graph.set_parent_gl_context(context)?;
            }

            let mut next = SessionStreams::clone(&current);
            if input_stream.is_some() {
                next.video_input = input_stream.map(str::to_string);
            }
            if output_stream.is_some() {
                next.video_output = output_stream.map(str::to_string);
            }
            tracing::info!(
                input = ?next.video_input,
                output = ?next.video_output,
                "Configured video streams"
            );
            self.streams.store(Arc::new(next));
            Ok(())
        })
    }

    /// Wires the audio streams.
    ///
    /// The input stream receives its time-series header here, once. The
    /// format is fixed from now on; only 16-bit PCM with one or two channels
    /// is supported.
    pub fn add_audio_streams(
        &self,
        input_stream: Option<&str>,
        output_stream: Option<&str>,
        channel_count: u16,
        sample_rate: u32,
    ) -> Result<()> {
        self.lifecycle.configure("add_audio_streams", || {
            validate_stream_pair("audio", input_stream, output_stream)?;
            if !(1..=2).contains(&channel_count) {
                return Err(FrameFeedError::Configuration(format!(
                    "audio channel count must be 1 or 2, got {}",
                    channel_count
                )));
            }
            if sample_rate == 0 {
                return Err(FrameFeedError::Configuration(
                    "audio sample rate must be positive".into(),
                ));
            }
            let current = self.streams.load_full();
            if current.audio_format.is_some() {
                return Err(FrameFeedError::Configuration(
                    "audio streams are already configured".into(),
                ));
            }

            let format = AudioFormat::pcm16(channel_count, sample_rate);
            if let Some(input) = input_stream {
                let header = self
                    .graph
                    .time_series_header(channel_count, sample_rate as f64)?;
                self.graph.set_stream_header(input, header)?;
            }
            if let Some(output) = output_stream {
                self.graph.register_output_callback(
                    output,
                    audio_fan_out::<G>(
                        output.to_string(),
                        Arc::clone(&self.audio_consumers),
                        Arc::clone(&self.errors),
                        format,
                    ),
                )?;
            }

            let mut next = SessionStreams::clone(&current);
            next.audio_input = input_stream.map(str::to_string);
            next.audio_output = output_stream.map(str::to_string);
            next.audio_format = Some(format);
            tracing::info!(
                input = ?next.audio_input,
                output = ?next.audio_output,
                channel_count,
                sample_rate,
                "Configured audio streams"
            );
            self.streams.store(Arc::new(next));
            Ok(())
        })
    }

    /// Sets the input stream fed by [`submit_bitmap_frame`](Self::submit_bitmap_frame).
    pub fn set_video_input_stream_cpu(&self, input_stream: &str) -> Result<()> {
        self.lifecycle.configure("set_video_input_stream_cpu", || {
            validate_stream_name("video cpu input", input_stream)?;
            let mut next = SessionStreams::clone(&self.streams.load());
            next.video_input_cpu = Some(input_stream.to_string());
            self.streams.store(Arc::new(next));
            Ok(())
        })
    }

    /// Hands packets to the graph that stay constant for the whole run.
    ///
    /// The packets are released here if the session is no longer idle.
    pub fn set_input_side_packets(&self, packets: HashMap<String, G::Packet>) -> Result<()> {
        let mut packets = Some(packets);
        let outcome = self.lifecycle.configure("set_input_side_packets", || {
            self.graph
                .set_input_side_packets(packets.take().unwrap_or_default())
        });
        for (_, packet) in packets.into_iter().flatten() {
            packet.release();
        }
        outcome
    }

    /// Binds a host object to a graph service before the graph starts.
    pub fn set_service_object<T>(&self, service: &GraphService<T>, object: Arc<T>) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        self.lifecycle.configure("set_service_object", || {
            tracing::debug!(service = service.name(), "Setting service object");
            self.graph.set_service_object(service, object)
        })
    }

    /// Installs a raw callback on any graph output stream.
    pub fn add_packet_callback(
        &self,
        output_stream: &str,
        callback: PacketCallback<G::Packet>,
    ) -> Result<()> {
        self.lifecycle.configure("add_packet_callback", || {
            validate_stream_name("callback output", output_stream)?;
            self.graph.register_output_callback(output_stream, callback)
        })
    }

    // =========================================================================
    // Listeners and consumers (any time, any thread)
    // =========================================================================

    /// Routes data-plane failures to `listener`; `None` restores logging.
    pub fn set_error_listener(&self, listener: Option<Arc<dyn ErrorListener>>) {
        self.errors.set_listener(listener, None);
    }

    /// Like [`set_error_listener`](Self::set_error_listener), but
    /// notifications are posted to `dispatcher` when one is given.
    pub fn set_error_listener_with_dispatcher(
        &self,
        listener: Option<Arc<dyn ErrorListener>>,
        dispatcher: Option<Arc<dyn Dispatcher>>,
    ) {
        self.errors.set_listener(listener, dispatcher);
    }

    pub fn set_on_will_add_frame_listener(&self, listener: Option<Arc<dyn OnWillAddFrame>>) {
        *self.will_add_frame.write() = listener;
    }

    pub fn set_consumer(&self, consumer: Arc<dyn TextureFrameConsumer<G::Frame>>) {
        self.video_consumers.set(consumer);
    }

    pub fn add_consumer(&self, consumer: Arc<dyn TextureFrameConsumer<G::Frame>>) {
        self.video_consumers.add(consumer);
    }

    pub fn remove_consumer(&self, consumer: &Arc<dyn TextureFrameConsumer<G::Frame>>) -> bool {
        self.video_consumers.remove(consumer)
    }

    pub fn set_audio_consumer(&self, consumer: Arc<dyn AudioDataConsumer>) {
        self.audio_consumers.set(consumer);
    }

    pub fn add_audio_consumer(&self, consumer: Arc<dyn AudioDataConsumer>) {
        self.audio_consumers.add(consumer);
    }

    pub fn remove_audio_consumer(&self, consumer: &Arc<dyn AudioDataConsumer>) -> bool {
        self.audio_consumers.remove(consumer)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Starts the graph ahead of the first frame.
    ///
    /// A start failure is returned here. Calling this on a started session
    /// does nothing.
    pub fn preheat(&self) -> Result<()> {
        self.lifecycle
            .ensure_started(|| self.start_graph())
            .map(|_| ())
    }

    /// Blocks until the graph has no in-flight work.
    pub fn wait_until_idle(&self) {
        if self.lifecycle.state() != SessionState::Started {
            return;
        }
        if let Err(error) = self.graph.wait_until_idle() {
            self.errors.report(error);
        }
    }

    /// Drains and tears down the graph.
    ///
    /// Blocks until every admitted packet has been processed. Failures go to
    /// the error channel. On an idle session the graph is left untouched.
    pub fn close(&self) {
        let previous = self.lifecycle.close();
        tracing::debug!(?previous, "Session closed");
        if previous != SessionState::Started {
            return;
        }

        // Listeners and output callbacks run from here on and may call back
        // into the session.
        tracing::info!("Closing graph inputs and draining");
        let drained = self
            .graph
            .close_all_inputs()
            .and_then(|()| self.graph.wait_until_drained());
        if let Err(error) = drained {
            self.errors.report(error);
        }

        if let Err(error) = self.graph.tear_down() {
            self.errors.report(error);
        }
    }

    pub(super) fn start_graph(&self) -> Result<()> {
        tracing::info!("Starting graph");
        self.graph.start_graph()
    }
}
