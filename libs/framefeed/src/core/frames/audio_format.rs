// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use serde::{Deserialize, Serialize};

/// Size of one sample of one channel in 16-bit PCM.
pub const BYTES_PER_MONO_SAMPLE: usize = 2;

/// Sample encoding of raw audio windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    Pcm8Bit,
    #[default]
    Pcm16Bit,
    PcmFloat,
}

impl AudioEncoding {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::Pcm8Bit => 1,
            Self::Pcm16Bit => BYTES_PER_MONO_SAMPLE,
            Self::PcmFloat => 4,
        }
    }
}

/// Shape of an interleaved audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    pub channel_count: u16,
    pub sample_rate: u32,
    #[serde(default)]
    pub encoding: AudioEncoding,
}

impl AudioFormat {
    /// 16-bit PCM, the only encoding a session accepts.
    pub fn pcm16(channel_count: u16, sample_rate: u32) -> Self {
        Self {
            channel_count,
            sample_rate,
            encoding: AudioEncoding::Pcm16Bit,
        }
    }

    /// Bytes occupied by one sample across all channels.
    pub fn bytes_per_frame(&self) -> usize {
        self.encoding.bytes_per_sample() * self.channel_count as usize
    }

    /// Number of per-channel samples in an interleaved window of `byte_len`
    /// bytes. A trailing partial frame is not counted.
    pub fn sample_count(&self, byte_len: usize) -> usize {
        match self.bytes_per_frame() {
            0 => 0,
            frame => byte_len / frame,
        }
    }

    /// Describes how `other` differs from `self`, or `None` if they match.
    pub fn mismatch(&self, other: &AudioFormat) -> Option<String> {
        let mut differences = Vec::new();
        if self.channel_count != other.channel_count {
            differences.push(format!(
                "channel count {} != {}",
                other.channel_count, self.channel_count
            ));
        }
        if self.sample_rate != other.sample_rate {
            differences.push(format!(
                "sample rate {} != {}",
                other.sample_rate, self.sample_rate
            ));
        }
        if self.encoding != other.encoding {
            differences.push(format!("encoding {:?} != {:?}", other.encoding, self.encoding));
        }

        if differences.is_empty() {
            None
        } else {
            Some(differences.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_count_stereo_pcm16() {
        let format = AudioFormat::pcm16(2, 48_000);
        assert_eq!(format.bytes_per_frame(), 4);
        assert_eq!(format.sample_count(4 * 480), 480);
    }

    #[test]
    fn test_sample_count_ignores_partial_frame() {
        let format = AudioFormat::pcm16(1, 16_000);
        assert_eq!(format.sample_count(7), 3);
    }

    #[test]
    fn test_sample_count_zero_channels() {
        let format = AudioFormat::pcm16(0, 16_000);
        assert_eq!(format.sample_count(128), 0);
    }

    #[test]
    fn test_mismatch_none_when_equal() {
        let format = AudioFormat::pcm16(1, 44_100);
        assert_eq!(format.mismatch(&AudioFormat::pcm16(1, 44_100)), None);
    }

    #[test]
    fn test_mismatch_lists_every_difference() {
        let expected = AudioFormat::pcm16(1, 16_000);
        let actual = AudioFormat {
            channel_count: 2,
            sample_rate: 48_000,
            encoding: AudioEncoding::PcmFloat,
        };

        let description = expected.mismatch(&actual).unwrap();
        assert!(description.contains("channel count 2 != 1"));
        assert!(description.contains("sample rate 48000 != 16000"));
        assert!(description.contains("PcmFloat"));
    }
}
