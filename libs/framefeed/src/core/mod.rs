// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

pub mod config;
pub mod consumers;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod frames;
pub mod logging;
pub mod loopback;
pub mod session;
pub mod transfer;

pub use config::{AudioStreamsConfig, SessionConfig, VideoStreamsConfig};
pub use consumers::{AudioDataConsumer, ConsumerRegistry, TextureFrameConsumer};
pub use dispatch::{Dispatcher, Task, TaskQueue, TaskQueueRunner, task_queue};
pub use engine::{
    GraphEngine, GraphPacket, GraphService, PacketCallback, Rejected, Releasable, TextureFrame,
};
pub use error::*;
pub use frames::{AudioEncoding, AudioFormat, BYTES_PER_MONO_SAMPLE};
pub use session::{
    ErrorChannel, ErrorListener, OnWillAddFrame, Session, SessionState, SessionStreams,
};
pub use transfer::{PacketTransfer, ReleaseGuard};
