// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! In-process graph engine for tests, benches and host bring-up.
//!
//! Packets admitted on an input stream are forwarded unchanged to a routed
//! output stream. Every frame and packet is accounted for in a
//! [`ReleaseLedger`], which makes leaks and double releases visible.

mod frame;
mod graph;
mod ledger;
mod packet;

pub use frame::{LoopbackFrame, RgbImage};
pub use graph::{GraphCall, LoopbackGraph};
pub use ledger::ReleaseLedger;
pub use packet::{LoopbackPacket, Payload};
