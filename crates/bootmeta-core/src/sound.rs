//! Boot sound type and codecs.
//!
//! The console's native format ("btsnd") is an 8-byte big-endian header
//! (output target, loop sample) followed by big-endian 16-bit stereo PCM
//! at 48 kHz. The interchange format is a plain RIFF/WAVE container with
//! one fmt chunk and one data chunk.
//!
//! In-memory sample data is always little-endian; the btsnd codec
//! byte-swaps at the boundary.

use std::fmt;

use thiserror::Error;

const BTSND_HEADER_LEN: usize = 8;
const BTSND_CHANNELS: usize = 2;
const BTSND_SAMPLE_RATE: usize = 48_000;

const RIFF_MAGIC: &[u8; 4] = b"RIFF";
const WAVE_MAGIC: &[u8; 4] = b"WAVE";
const FMT_MAGIC: &[u8; 4] = b"fmt ";
const DATA_MAGIC: &[u8; 4] = b"data";

const RIFF_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const FMT_CHUNK_LEN: usize = 16;

const WAVE_FORMAT_PCM: u16 = 1;

/// Errors produced by the native sound codec
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SoundError {
    /// The data is not a btsnd file: too short or out-of-range target
    #[error("invalid btsnd data")]
    InvalidBtsnd,
}

/// Errors produced by the wave codec
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaveError {
    /// Buffer smaller than the fixed RIFF header
    #[error("wave data smaller than the RIFF header")]
    TooSmall,

    /// Wrong magic, or a declared size that exceeds the buffer
    #[error("invalid RIFF/WAVE header")]
    InvalidHeader,

    /// A second fmt or data chunk was found
    #[error("duplicate fmt or data chunk")]
    DuplicateSections,

    /// The scan reached end of buffer without a fmt or data chunk
    #[error("missing fmt or data chunk")]
    MissingSection,

    /// Not integer PCM, or a sample layout the editor cannot hold
    #[error("unsupported wave format")]
    UnsupportedFormat,
}

/// Where the console plays the boot sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SoundTarget {
    Tv = 0,
    Drc = 1,
    Both = 2,
}

impl SoundTarget {
    fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(SoundTarget::Tv),
            1 => Some(SoundTarget::Drc),
            2 => Some(SoundTarget::Both),
            _ => None,
        }
    }
}

impl fmt::Display for SoundTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundTarget::Tv => write!(f, "TV"),
            SoundTarget::Drc => write!(f, "DRC"),
            SoundTarget::Both => write!(f, "Both"),
        }
    }
}

/// A decoded boot sound: interleaved little-endian PCM plus its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sound {
    samples: Vec<u8>,
    channels: usize,
    bytes_per_sample: usize,
    sample_rate: usize,
    sample_count: usize,
    loop_sample: usize,
    target: SoundTarget,
}

impl Sound {
    /// Decode the console's native sound format.
    pub fn from_btsnd(data: &[u8]) -> Result<Self, SoundError> {
        if data.len() < BTSND_HEADER_LEN {
            return Err(SoundError::InvalidBtsnd);
        }

        let raw_target = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let target = SoundTarget::from_u32(raw_target).ok_or(SoundError::InvalidBtsnd)?;
        let loop_sample = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;

        let payload = &data[BTSND_HEADER_LEN..];
        let sample_count = payload.len() / (BTSND_CHANNELS * 2);

        let mut samples = payload.to_vec();
        for pair in samples.chunks_exact_mut(2) {
            pair.swap(0, 1);
        }

        Ok(Self {
            samples,
            channels: BTSND_CHANNELS,
            bytes_per_sample: 2,
            sample_rate: BTSND_SAMPLE_RATE,
            sample_count,
            loop_sample,
            target,
        })
    }

    /// Encode back to the console's native sound format.
    pub fn to_btsnd(&self) -> Vec<u8> {
        let data_len = self.data_size();
        let mut out = Vec::with_capacity(BTSND_HEADER_LEN + data_len);
        out.extend_from_slice(&(self.target as u32).to_be_bytes());
        out.extend_from_slice(&(self.loop_sample as u32).to_be_bytes());
        for pair in self.samples[..data_len].chunks_exact(2) {
            out.push(pair[1]);
            out.push(pair[0]);
        }
        out
    }

    /// Decode a RIFF/WAVE file.
    ///
    /// Exactly one fmt chunk and one data chunk are required; unknown
    /// chunks are skipped by their declared length.
    pub fn from_wave(data: &[u8]) -> Result<Self, WaveError> {
        if data.len() < RIFF_HEADER_LEN {
            return Err(WaveError::TooSmall);
        }
        if &data[0..4] != RIFF_MAGIC || &data[8..12] != WAVE_MAGIC {
            return Err(WaveError::InvalidHeader);
        }
        let declared = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let end = declared
            .checked_add(8)
            .filter(|&end| end <= data.len())
            .ok_or(WaveError::InvalidHeader)?;

        let mut fmt: Option<FmtChunk> = None;
        let mut pcm: Option<&[u8]> = None;

        let mut off = RIFF_HEADER_LEN;
        while off + CHUNK_HEADER_LEN <= end {
            let magic = &data[off..off + 4];
            let size =
                u32::from_le_bytes([data[off + 4], data[off + 5], data[off + 6], data[off + 7]])
                    as usize;
            let body_start = off + CHUNK_HEADER_LEN;
            let body_end = body_start
                .checked_add(size)
                .filter(|&body_end| body_end <= end)
                .ok_or(WaveError::InvalidHeader)?;
            let body = &data[body_start..body_end];

            if magic == FMT_MAGIC {
                if fmt.is_some() {
                    return Err(WaveError::DuplicateSections);
                }
                fmt = Some(FmtChunk::parse(body)?);
            } else if magic == DATA_MAGIC {
                if pcm.is_some() {
                    return Err(WaveError::DuplicateSections);
                }
                pcm = Some(body);
            }

            off = body_end;
        }

        let (fmt, pcm) = match (fmt, pcm) {
            (Some(fmt), Some(pcm)) => (fmt, pcm),
            _ => return Err(WaveError::MissingSection),
        };

        let stride = fmt.block_align as usize;
        let sample_count = pcm.len() / stride;

        Ok(Self {
            samples: pcm[..sample_count * stride].to_vec(),
            channels: fmt.channels as usize,
            bytes_per_sample: (fmt.bits_per_sample / 8) as usize,
            sample_rate: fmt.sample_rate as usize,
            sample_count,
            loop_sample: 0,
            target: SoundTarget::Both,
        })
    }

    /// Encode as a RIFF/WAVE file.
    ///
    /// The total-size field is back-patched once the buffer is complete.
    pub fn to_wave(&self) -> Vec<u8> {
        let data_len = self.data_size();
        let mut out = Vec::with_capacity(
            RIFF_HEADER_LEN + 2 * CHUNK_HEADER_LEN + FMT_CHUNK_LEN + data_len,
        );

        out.extend_from_slice(RIFF_MAGIC);
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(WAVE_MAGIC);

        out.extend_from_slice(FMT_MAGIC);
        out.extend_from_slice(&(FMT_CHUNK_LEN as u32).to_le_bytes());
        out.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&(self.sample_rate as u32).to_le_bytes());
        out.extend_from_slice(&((self.sample_stride() * self.sample_rate) as u32).to_le_bytes());
        out.extend_from_slice(&(self.sample_stride() as u16).to_le_bytes());
        out.extend_from_slice(&((self.bytes_per_sample * 8) as u16).to_le_bytes());

        out.extend_from_slice(DATA_MAGIC);
        out.extend_from_slice(&(data_len as u32).to_le_bytes());
        out.extend_from_slice(&self.samples[..data_len]);

        let total = (out.len() - 8) as u32;
        out[4..8].copy_from_slice(&total.to_le_bytes());
        out
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bytes_per_sample
    }

    pub fn bits_per_sample(&self) -> usize {
        self.bytes_per_sample * 8
    }

    pub fn sample_rate(&self) -> usize {
        self.sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn loop_sample(&self) -> usize {
        self.loop_sample
    }

    pub fn set_loop_sample(&mut self, sample: usize) {
        self.loop_sample = sample;
    }

    pub fn target(&self) -> SoundTarget {
        self.target
    }

    pub fn set_target(&mut self, target: SoundTarget) {
        self.target = target;
    }

    /// Bytes per frame across all channels.
    pub fn sample_stride(&self) -> usize {
        self.bytes_per_sample * self.channels
    }

    /// Total PCM payload size in bytes.
    pub fn data_size(&self) -> usize {
        self.sample_stride() * self.sample_count
    }

    pub fn duration_secs(&self) -> f32 {
        self.sample_count as f32 / self.sample_rate as f32
    }

    /// Human-readable layout, e.g. "2ch 48000hz 16bit".
    pub fn format_name(&self) -> String {
        format!(
            "{}ch {}hz {}bit",
            self.channels,
            self.sample_rate,
            self.bits_per_sample()
        )
    }

    /// Offset of one sample; an out-of-range index wraps to 0 for looped
    /// playback display.
    fn sample_offset(&self, idx: usize, channel: usize) -> usize {
        let idx = if idx >= self.sample_count { 0 } else { idx };
        idx * self.sample_stride() + channel * self.bytes_per_sample
    }

    /// One 16-bit sample; only meaningful for 16-bit sounds.
    pub fn sample_i16(&self, idx: usize, channel: usize) -> i16 {
        let off = self.sample_offset(idx, channel);
        i16::from_le_bytes([self.samples[off], self.samples[off + 1]])
    }

    /// One sample scaled to [-1.0, 1.0).
    pub fn sample_normalized(&self, idx: usize, channel: usize) -> f32 {
        let off = self.sample_offset(idx, channel);
        let s = &self.samples;
        match self.bytes_per_sample {
            1 => s[off] as i8 as f32 / 128.0,
            2 => i16::from_le_bytes([s[off], s[off + 1]]) as f32 / 32_768.0,
            4 => {
                i32::from_le_bytes([s[off], s[off + 1], s[off + 2], s[off + 3]]) as f32
                    / 2_147_483_648.0
            }
            // Parse-time validation keeps every other depth out.
            _ => unreachable!("unsupported sample depth"),
        }
    }
}

struct FmtChunk {
    channels: u16,
    sample_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
}

impl FmtChunk {
    fn parse(body: &[u8]) -> Result<Self, WaveError> {
        if body.len() < FMT_CHUNK_LEN {
            return Err(WaveError::InvalidHeader);
        }
        let format = u16::from_le_bytes([body[0], body[1]]);
        let channels = u16::from_le_bytes([body[2], body[3]]);
        let sample_rate = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
        let block_align = u16::from_le_bytes([body[12], body[13]]);
        let bits_per_sample = u16::from_le_bytes([body[14], body[15]]);

        if format != WAVE_FORMAT_PCM {
            return Err(WaveError::UnsupportedFormat);
        }
        if !matches!(bits_per_sample, 8 | 16 | 32) {
            return Err(WaveError::UnsupportedFormat);
        }
        // The stride must agree with the sample layout, and neither may
        // be zero; sample math divides by both.
        if channels == 0 || block_align != channels * (bits_per_sample / 8) {
            return Err(WaveError::UnsupportedFormat);
        }

        Ok(Self {
            channels,
            sample_rate,
            block_align,
            bits_per_sample,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btsnd(target: u32, loop_sample: u32, samples: &[i16]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&target.to_be_bytes());
        data.extend_from_slice(&loop_sample.to_be_bytes());
        for s in samples {
            data.extend_from_slice(&s.to_be_bytes());
        }
        data
    }

    fn wave(sample_rate: u32, bits: u16, channels: u16, pcm: &[u8]) -> Vec<u8> {
        let stride = channels * (bits / 8);
        let mut data = Vec::new();
        data.extend_from_slice(b"RIFF");
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(b"WAVE");
        data.extend_from_slice(b"fmt ");
        data.extend_from_slice(&16u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&channels.to_le_bytes());
        data.extend_from_slice(&sample_rate.to_le_bytes());
        data.extend_from_slice(&(sample_rate * stride as u32).to_le_bytes());
        data.extend_from_slice(&stride.to_le_bytes());
        data.extend_from_slice(&bits.to_le_bytes());
        data.extend_from_slice(b"data");
        data.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
        data.extend_from_slice(pcm);
        let total = (data.len() - 8) as u32;
        data[4..8].copy_from_slice(&total.to_le_bytes());
        data
    }

    #[test]
    fn test_btsnd_roundtrip() {
        let data = btsnd(1, 7, &[100, -200, 300, -400]);
        let sound = Sound::from_btsnd(&data).unwrap();
        assert_eq!(sound.target(), SoundTarget::Drc);
        assert_eq!(sound.loop_sample(), 7);
        assert_eq!(sound.sample_count(), 2);
        assert_eq!(sound.sample_rate(), 48_000);
        assert_eq!(sound.sample_i16(0, 1), -200);
        assert_eq!(sound.to_btsnd(), data);
    }

    #[test]
    fn test_btsnd_empty_payload() {
        let sound = Sound::from_btsnd(&btsnd(2, 0, &[])).unwrap();
        assert_eq!(sound.sample_count(), 0);
        assert_eq!(sound.target(), SoundTarget::Both);
    }

    #[test]
    fn test_btsnd_rejects_bad_target() {
        assert_eq!(
            Sound::from_btsnd(&btsnd(3, 0, &[])),
            Err(SoundError::InvalidBtsnd)
        );
    }

    #[test]
    fn test_btsnd_rejects_short_buffer() {
        assert_eq!(Sound::from_btsnd(&[0u8; 7]), Err(SoundError::InvalidBtsnd));
    }

    #[test]
    fn test_wave_roundtrip() {
        let pcm: Vec<u8> = (0..32).collect();
        let data = wave(44_100, 16, 2, &pcm);
        let sound = Sound::from_wave(&data).unwrap();
        assert_eq!(sound.channels(), 2);
        assert_eq!(sound.sample_rate(), 44_100);
        assert_eq!(sound.bits_per_sample(), 16);
        assert_eq!(sound.sample_count(), 8);
        assert_eq!(sound.to_wave(), data);
    }

    #[test]
    fn test_wave_too_small() {
        assert_eq!(Sound::from_wave(&[0u8; 11]), Err(WaveError::TooSmall));
    }

    #[test]
    fn test_wave_bad_magic() {
        let mut data = wave(48_000, 16, 2, &[0u8; 8]);
        data[0] = b'X';
        assert_eq!(Sound::from_wave(&data), Err(WaveError::InvalidHeader));

        let mut data = wave(48_000, 16, 2, &[0u8; 8]);
        data[8..12].copy_from_slice(b"AVI ");
        assert_eq!(Sound::from_wave(&data), Err(WaveError::InvalidHeader));
    }

    #[test]
    fn test_wave_declared_size_exceeds_buffer() {
        let mut data = wave(48_000, 16, 2, &[0u8; 8]);
        let lie = (data.len() as u32).to_le_bytes();
        data[4..8].copy_from_slice(&lie);
        assert_eq!(Sound::from_wave(&data), Err(WaveError::InvalidHeader));
    }

    #[test]
    fn test_wave_duplicate_chunks() {
        let mut data = wave(48_000, 16, 2, &[0u8; 4]);
        // Append a second data chunk and grow the declared size to match.
        data.extend_from_slice(b"data");
        data.extend_from_slice(&0u32.to_le_bytes());
        let total = (data.len() - 8) as u32;
        data[4..8].copy_from_slice(&total.to_le_bytes());
        assert_eq!(Sound::from_wave(&data), Err(WaveError::DuplicateSections));
    }

    #[test]
    fn test_wave_missing_data_chunk() {
        let full = wave(48_000, 16, 2, &[]);
        // Keep only the RIFF header and the fmt chunk.
        let mut data = full[..RIFF_HEADER_LEN + CHUNK_HEADER_LEN + FMT_CHUNK_LEN].to_vec();
        let total = (data.len() - 8) as u32;
        data[4..8].copy_from_slice(&total.to_le_bytes());
        assert_eq!(Sound::from_wave(&data), Err(WaveError::MissingSection));
    }

    #[test]
    fn test_wave_skips_unknown_chunks() {
        let mut data = Vec::new();
        data.extend_from_slice(b"RIFF");
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(b"WAVE");
        data.extend_from_slice(b"LIST");
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(b"INFO");
        let rest = wave(48_000, 16, 2, &[1, 2, 3, 4]);
        data.extend_from_slice(&rest[RIFF_HEADER_LEN..]);
        let total = (data.len() - 8) as u32;
        data[4..8].copy_from_slice(&total.to_le_bytes());

        let sound = Sound::from_wave(&data).unwrap();
        assert_eq!(sound.sample_count(), 1);
    }

    #[test]
    fn test_wave_rejects_non_pcm() {
        let mut data = wave(48_000, 16, 2, &[0u8; 4]);
        // format code lives at the start of the fmt body
        data[RIFF_HEADER_LEN + CHUNK_HEADER_LEN] = 3;
        assert_eq!(Sound::from_wave(&data), Err(WaveError::UnsupportedFormat));
    }

    #[test]
    fn test_sample_normalized_wraps_to_start() {
        let sound = Sound::from_btsnd(&btsnd(0, 0, &[16_384, 0, -8_192, 0])).unwrap();
        assert_eq!(sound.sample_count(), 2);
        assert_eq!(
            sound.sample_normalized(sound.sample_count(), 0),
            sound.sample_normalized(0, 0)
        );
        assert!((sound.sample_normalized(0, 0) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_format_name() {
        let sound = Sound::from_btsnd(&btsnd(0, 0, &[0, 0])).unwrap();
        assert_eq!(sound.format_name(), "2ch 48000hz 16bit");
    }
}
