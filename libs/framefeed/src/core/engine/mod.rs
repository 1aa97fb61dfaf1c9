// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Contract of the external stream-processing engine.
//!
//! The engine executes the graph; this crate only drives its lifecycle,
//! hands it input packets and listens to its output streams.

mod graph;
mod packet;
mod service;

pub use graph::{GraphEngine, PacketCallback};
pub use packet::{GraphPacket, Rejected, Releasable, TextureFrame};
pub use service::GraphService;
