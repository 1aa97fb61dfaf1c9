// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

mod audio_format;

pub use audio_format::{AudioEncoding, AudioFormat, BYTES_PER_MONO_SAMPLE};
