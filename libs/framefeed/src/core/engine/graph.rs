// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::collections::HashMap;
use std::sync::Arc;

use super::packet::{GraphPacket, Rejected, TextureFrame};
use super::service::GraphService;
use crate::core::Result;

/// Callback installed on a graph output stream.
///
/// The packet is lent for the duration of the call; the engine keeps
/// ownership and releases it afterwards.
pub type PacketCallback<P> = Box<dyn Fn(&P) + Send + Sync + 'static>;

/// The stream-processing engine behind a session.
///
/// Implementations are internally synchronized: every method may be called
/// from any thread, and output callbacks run on engine-owned threads.
pub trait GraphEngine: Send + Sync + 'static {
    type Packet: GraphPacket<Frame = Self::Frame>;
    type Frame: TextureFrame;
    /// Decoded CPU image accepted by [`GraphEngine::packet_from_bitmap`].
    type Bitmap: ?Sized + Sync;

    // Lifecycle

    fn start_graph(&self) -> Result<()>;

    /// Signals end-of-input on every input stream.
    fn close_all_inputs(&self) -> Result<()>;

    /// Blocks until every admitted packet has been processed.
    fn wait_until_drained(&self) -> Result<()>;

    /// Blocks until the graph has no in-flight work, without closing inputs.
    fn wait_until_idle(&self) -> Result<()>;

    fn tear_down(&self) -> Result<()>;

    // Streams

    /// Hands `packet` to the input stream. On success the engine owns the
    /// packet; on failure it is returned inside [`Rejected`].
    fn submit(
        &self,
        stream: &str,
        packet: Self::Packet,
        timestamp: i64,
    ) -> std::result::Result<(), Rejected<Self::Packet>>;

    fn register_output_callback(
        &self,
        stream: &str,
        callback: PacketCallback<Self::Packet>,
    ) -> Result<()>;

    /// One-time per-stream metadata. The engine owns `header` afterwards.
    fn set_stream_header(&self, stream: &str, header: Self::Packet) -> Result<()>;

    /// The engine owns the packets afterwards, whether or not the call
    /// succeeds.
    fn set_input_side_packets(&self, packets: HashMap<String, Self::Packet>) -> Result<()>;

    /// Lets graph-side GL contexts join the share group of the host context.
    fn set_parent_gl_context(&self, context: u64) -> Result<()>;

    /// Binds `object` to `service` for every node that requests it.
    fn set_service_object<T>(&self, service: &GraphService<T>, object: Arc<T>) -> Result<()>
    where
        T: Send + Sync + 'static;

    // Packet construction

    /// Wraps a GPU frame. On success the packet owns the frame and releases
    /// it together with itself; on failure the frame is handed back.
    fn packet_from_frame(
        &self,
        frame: Self::Frame,
    ) -> std::result::Result<Self::Packet, Rejected<Self::Frame>>;

    /// Copies a decoded image into an RGB image packet.
    fn packet_from_bitmap(&self, bitmap: &Self::Bitmap) -> Result<Self::Packet>;

    /// Copies an interleaved 16-bit PCM window into an audio matrix packet.
    fn packet_from_audio(
        &self,
        data: &[u8],
        channel_count: u16,
        num_samples: usize,
    ) -> Result<Self::Packet>;

    fn time_series_header(&self, channel_count: u16, sample_rate: f64) -> Result<Self::Packet>;
}
