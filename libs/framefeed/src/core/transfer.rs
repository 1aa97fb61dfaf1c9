// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Ownership transfer of caller buffers into a graph input stream.
//!
//! Every buffer that enters [`PacketTransfer`] is released exactly once
//! unless the engine accepts it:
//!
//! ```text
//! caller buffer ──build──► packet ──submit──► engine owns it
//!       │                    │
//!       └─ build failed:     └─ submit rejected:
//!          release buffer       release packet (which releases the buffer)
//! ```

use crate::core::engine::{GraphEngine, Rejected, Releasable};
use crate::core::Result;

/// Owns a releasable item until it is handed off.
///
/// Dropping the guard releases the item, so a buffer held here is never
/// leaked even if the holder unwinds or returns early.
pub struct ReleaseGuard<T: Releasable> {
    item: Option<T>,
}

impl<T: Releasable> ReleaseGuard<T> {
    pub fn new(item: T) -> Self {
        Self { item: Some(item) }
    }

    pub fn get(&self) -> &T {
        match &self.item {
            Some(item) => item,
            None => unreachable!("ReleaseGuard holds its item until consumed"),
        }
    }

    /// Hands the item to a new owner without releasing it.
    pub fn into_inner(mut self) -> T {
        match self.item.take() {
            Some(item) => item,
            None => unreachable!("ReleaseGuard holds its item until consumed"),
        }
    }

    pub fn release(mut self) {
        if let Some(item) = self.item.take() {
            item.release();
        }
    }
}

impl<T: Releasable> Drop for ReleaseGuard<T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            item.release();
        }
    }
}

/// Builds packets from caller buffers and submits them to one input stream.
pub struct PacketTransfer<'a, G: GraphEngine> {
    graph: &'a G,
    stream: &'a str,
}

impl<'a, G: GraphEngine> PacketTransfer<'a, G> {
    pub fn new(graph: &'a G, stream: &'a str) -> Self {
        Self { graph, stream }
    }

    pub fn stream(&self) -> &str {
        self.stream
    }

    /// Wraps a GPU frame and submits it.
    ///
    /// The frame moves into the packet as soon as the packet is built; from
    /// then on only the packet is released on failure.
    pub fn transfer_frame(&self, frame: ReleaseGuard<G::Frame>, timestamp: i64) -> Result<()> {
        let packet = self
            .graph
            .packet_from_frame(frame.into_inner())
            .map_err(Rejected::release_item)?;
        self.submit(ReleaseGuard::new(packet), timestamp)
    }

    /// Copies a decoded image into a packet and submits it. The bitmap stays
    /// with the caller.
    pub fn transfer_bitmap(&self, bitmap: &G::Bitmap, timestamp: i64) -> Result<()> {
        let packet = self.graph.packet_from_bitmap(bitmap)?;
        self.submit(ReleaseGuard::new(packet), timestamp)
    }

    /// Copies an interleaved PCM window into a packet and submits it.
    pub fn transfer_audio(
        &self,
        data: &[u8],
        channel_count: u16,
        num_samples: usize,
        timestamp: i64,
    ) -> Result<()> {
        let packet = self
            .graph
            .packet_from_audio(data, channel_count, num_samples)?;
        self.submit(ReleaseGuard::new(packet), timestamp)
    }

    fn submit(&self, packet: ReleaseGuard<G::Packet>, timestamp: i64) -> Result<()> {
        match self.graph.submit(self.stream, packet.into_inner(), timestamp) {
            Ok(()) => {
                tracing::trace!(stream = self.stream, timestamp, "Packet handed to graph");
                Ok(())
            }
            // Rejected submissions do not release the packet; that is on us.
            Err(rejected) => Err(rejected.release_item()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FrameFeedError;
    use crate::core::loopback::{LoopbackFrame, LoopbackGraph, RgbImage};

    fn started_graph() -> LoopbackGraph {
        let graph = LoopbackGraph::new();
        graph.start_graph().unwrap();
        graph
    }

    #[test]
    fn test_guard_drop_releases() {
        let graph = LoopbackGraph::new();
        let ledger = graph.ledger();
        {
            let _guard = ReleaseGuard::new(LoopbackFrame::new(&ledger, 1, 640, 480, 0));
        }
        assert_eq!(ledger.frames_released(), 1);
    }

    #[test]
    fn test_guard_into_inner_does_not_release() {
        let graph = LoopbackGraph::new();
        let ledger = graph.ledger();
        let guard = ReleaseGuard::new(LoopbackFrame::new(&ledger, 1, 640, 480, 0));

        let frame = guard.into_inner();
        assert_eq!(ledger.frames_released(), 0);

        frame.release();
        assert_eq!(ledger.frames_released(), 1);
    }

    #[test]
    fn test_accepted_frame_is_owned_by_graph() {
        let graph = started_graph();
        let ledger = graph.ledger();
        let frame = LoopbackFrame::new(&ledger, 7, 640, 480, 1000);

        PacketTransfer::new(&graph, "input_video")
            .transfer_frame(ReleaseGuard::new(frame), 1000)
            .unwrap();

        assert_eq!(ledger.frames_released(), 0);
        assert_eq!(graph.submissions("input_video"), vec![1000]);

        graph.wait_until_drained().unwrap();
        assert_eq!(ledger.frames_released(), 1);
        assert_eq!(ledger.packets_released(), 1);
    }

    #[test]
    fn test_rejected_submission_releases_packet_and_frame_once() {
        let graph = started_graph();
        graph.reject_next_submissions(1);
        let ledger = graph.ledger();
        let frame = LoopbackFrame::new(&ledger, 7, 640, 480, 1000);

        let err = PacketTransfer::new(&graph, "input_video")
            .transfer_frame(ReleaseGuard::new(frame), 1000)
            .unwrap_err();

        assert!(matches!(err, FrameFeedError::Graph(_)));
        assert_eq!(ledger.packets_released(), 1);
        assert_eq!(ledger.frames_released(), 1);
    }

    #[test]
    fn test_failed_build_releases_caller_frame() {
        let graph = started_graph();
        graph.fail_next_packet_creations(1);
        let ledger = graph.ledger();
        let frame = LoopbackFrame::new(&ledger, 7, 640, 480, 1000);

        let err = PacketTransfer::new(&graph, "input_video")
            .transfer_frame(ReleaseGuard::new(frame), 1000)
            .unwrap_err();

        assert!(matches!(err, FrameFeedError::PacketCreation(_)));
        assert_eq!(ledger.frames_released(), 1);
        assert_eq!(ledger.packets_created(), 0);
        assert!(graph.submissions("input_video").is_empty());
    }

    #[test]
    fn test_bitmap_rejection_releases_packet() {
        let graph = started_graph();
        let ledger = graph.ledger();
        let transfer = PacketTransfer::new(&graph, "input_video_cpu");
        let image = RgbImage::solid(4, 4, [0, 0, 0]);

        transfer.transfer_bitmap(&image, 500).unwrap();
        // Same timestamp again: the graph rejects it.
        assert!(transfer.transfer_bitmap(&image, 500).is_err());

        assert_eq!(ledger.packets_created(), 2);
        assert_eq!(ledger.packets_released(), 1);
    }

    #[test]
    fn test_audio_transfer_submits_with_timestamp() {
        let graph = started_graph();
        let transfer = PacketTransfer::new(&graph, "input_audio");

        transfer.transfer_audio(&[0u8; 64], 1, 32, 20_000).unwrap();

        assert_eq!(graph.submissions("input_audio"), vec![20_000]);
    }
}
