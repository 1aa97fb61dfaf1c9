// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts creations and releases of loopback buffers.
///
/// A correct session leaves `outstanding_frames` and `outstanding_packets`
/// at zero once every consumer has released what it was given.
#[derive(Debug, Default)]
pub struct ReleaseLedger {
    frames_created: AtomicUsize,
    frames_released: AtomicUsize,
    packets_created: AtomicUsize,
    packets_released: AtomicUsize,
}

impl ReleaseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_created(&self) -> usize {
        self.frames_created.load(Ordering::SeqCst)
    }

    pub fn frames_released(&self) -> usize {
        self.frames_released.load(Ordering::SeqCst)
    }

    pub fn packets_created(&self) -> usize {
        self.packets_created.load(Ordering::SeqCst)
    }

    pub fn packets_released(&self) -> usize {
        self.packets_released.load(Ordering::SeqCst)
    }

    pub fn outstanding_frames(&self) -> usize {
        self.frames_created()
            .saturating_sub(self.frames_released())
    }

    pub fn outstanding_packets(&self) -> usize {
        self.packets_created()
            .saturating_sub(self.packets_released())
    }

    pub(super) fn frame_created(&self) {
        self.frames_created.fetch_add(1, Ordering::SeqCst);
    }

    pub(super) fn frame_released(&self) {
        self.frames_released.fetch_add(1, Ordering::SeqCst);
    }

    pub(super) fn packet_created(&self) {
        self.packets_created.fetch_add(1, Ordering::SeqCst);
    }

    pub(super) fn packet_released(&self) {
        self.packets_released.fetch_add(1, Ordering::SeqCst);
    }
}
