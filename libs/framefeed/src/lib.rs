// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! framefeed: feeds timestamped video and audio into a running
//! stream-processing graph and fans the graph's outputs out to consumers.
//!
//! A [`Session`] owns one graph instance. It is configured while idle,
//! started lazily by [`Session::preheat`] or the first ingestion call, and
//! drained and torn down by [`Session::close`].

#![allow(clippy::type_complexity)] // Complex types are clear in context

pub mod core;

pub use core::{
    AudioDataConsumer, AudioEncoding, AudioFormat, ConsumerRegistry, Dispatcher, ErrorChannel,
    ErrorListener, FrameFeedError, GraphEngine, GraphPacket, GraphService, OnWillAddFrame,
    PacketCallback, PacketTransfer, Rejected, ReleaseGuard, Releasable, Result, Session,
    SessionConfig, SessionState, SessionStreams, TaskQueue, TaskQueueRunner, TextureFrame,
    TextureFrameConsumer, task_queue,
};
