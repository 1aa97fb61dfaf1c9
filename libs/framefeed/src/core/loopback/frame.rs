// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use super::ledger::ReleaseLedger;
use crate::core::engine::{Releasable, TextureFrame};

/// Stand-in for a GPU texture handle. Only the ledger knows it exists.
#[derive(Debug)]
pub struct LoopbackFrame {
    ledger: Arc<ReleaseLedger>,
    texture_name: u32,
    width: u32,
    height: u32,
    timestamp: i64,
}

impl LoopbackFrame {
    pub fn new(
        ledger: &Arc<ReleaseLedger>,
        texture_name: u32,
        width: u32,
        height: u32,
        timestamp: i64,
    ) -> Self {
        ledger.frame_created();
        Self {
            ledger: Arc::clone(ledger),
            texture_name,
            width,
            height,
            timestamp,
        }
    }
}

impl Releasable for LoopbackFrame {
    fn release(self) {
        self.ledger.frame_released();
    }
}

impl TextureFrame for LoopbackFrame {
    fn texture_name(&self) -> u32 {
        self.texture_name
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Decoded 8-bit RGB image, tightly packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbImage {
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.pixels.len() == self.width as usize * self.height as usize * 3
    }
}
