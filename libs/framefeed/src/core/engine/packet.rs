// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use bytes::Bytes;

use crate::core::{FrameFeedError, Result};

/// A buffer whose storage belongs to someone outside this crate and must be
/// handed back exactly once.
///
/// `release` consumes the value, so a released buffer cannot be touched or
/// released again.
pub trait Releasable {
    fn release(self);
}

/// Handle to a GPU texture produced by a camera, decoder or the graph itself.
pub trait TextureFrame: Releasable + Send + 'static {
    fn texture_name(&self) -> u32;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Timestamp in microseconds.
    fn timestamp(&self) -> i64;
}

/// Transferable unit understood by the engine.
///
/// Input packets are built from caller buffers and submitted with ownership;
/// output packets are lent to output callbacks for the duration of the call.
pub trait GraphPacket: Releasable + Send + 'static {
    type Frame: TextureFrame;

    /// Timestamp in microseconds.
    fn timestamp(&self) -> i64;

    /// Returns a new frame handle referencing this packet's texture.
    ///
    /// Every call yields an independent handle that the receiver releases.
    fn texture_frame(&self) -> Result<Self::Frame>;

    /// Returns the packet's interleaved 16-bit PCM payload.
    fn audio_data(&self) -> Result<Bytes>;
}

/// An engine call that failed and handed ownership of `item` back.
#[derive(Debug)]
pub struct Rejected<T> {
    pub item: T,
    pub error: FrameFeedError,
}

impl<T> Rejected<T> {
    pub fn new(item: T, error: FrameFeedError) -> Self {
        Self { item, error }
    }

    /// Releases the returned item and yields the error.
    pub fn release_item(self) -> FrameFeedError
    where
        T: Releasable,
    {
        self.item.release();
        self.error
    }
}
