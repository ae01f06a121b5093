//! Mono 16-bit PCM buffers and their raw little-endian byte form.

mod error;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use error::PcmError;

/// A single signed 16-bit amplitude value.
pub type PcmSample = i16;

/// Bytes per sample in a raw s16le stream.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Bit depth of every stream handled by this crate.
pub const BITS_PER_SAMPLE: u16 = 16;

const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Target parameters for a raw PCM stream.
///
/// Bit depth and byte order are fixed at 16-bit little-endian. Only mono
/// streams reach the mixer, so `channels` is 1 unless a caller builds the
/// struct by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmParams {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmParams {
    /// Mono parameters at the given sample rate.
    pub fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
        }
    }
}

impl Default for PcmParams {
    fn default() -> Self {
        Self::mono(DEFAULT_SAMPLE_RATE)
    }
}

/// An ordered, immutable run of mono PCM samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PcmBuffer {
    samples: Vec<PcmSample>,
}

impl PcmBuffer {
    pub fn new(samples: Vec<PcmSample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[PcmSample] {
        &self.samples
    }

    pub fn into_inner(self) -> Vec<PcmSample> {
        self.samples
    }

    /// Interpret a raw byte stream as little-endian int16 samples.
    ///
    /// # Errors
    /// Returns [`PcmError::OddLength`] if a trailing partial sample is present.
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, PcmError> {
        if bytes.len() % BYTES_PER_SAMPLE != 0 {
            return Err(PcmError::OddLength(bytes.len()));
        }

        let samples = bytes
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|pair| PcmSample::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(Self { samples })
    }

    /// Serialize the samples as a raw s16le byte stream.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.samples.len() * BYTES_PER_SAMPLE);
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    /// Read a headerless s16le file.
    pub fn read_raw(path: impl AsRef<Path>) -> Result<Self, PcmError> {
        let bytes = fs::read(path)?;
        Self::from_le_bytes(&bytes)
    }

    /// Write the buffer as a headerless s16le file.
    pub fn write_raw(&self, path: impl AsRef<Path>) -> Result<(), PcmError> {
        fs::write(path, self.to_le_bytes())?;
        Ok(())
    }

    /// Length of the buffer in milliseconds at `sample_rate`.
    pub fn duration_ms(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 * 1000.0 / sample_rate as f64
    }
}

impl From<Vec<PcmSample>> for PcmBuffer {
    fn from(samples: Vec<PcmSample>) -> Self {
        Self::new(samples)
    }
}

impl AsRef<[PcmSample]> for PcmBuffer {
    fn as_ref(&self) -> &[PcmSample] {
        self.as_slice()
    }
}
