//! Conversion between container files and raw mono PCM.
//!
//! The mixer only ever sees [`PcmBuffer`]s. Anything that reads or writes a
//! real audio file goes through a [`Transcoder`], so the mixer can be driven
//! from memory in tests and from ffmpeg or the in-process codecs in the CLI.

mod error;
mod ffmpeg;
#[cfg(feature = "native")]
mod native;

use std::path::Path;

use crate::pcm::{PcmBuffer, PcmParams};

pub use error::TranscodeError;
pub use ffmpeg::{FfmpegTranscoder, FFMPEG_ENV};
#[cfg(feature = "native")]
pub use native::NativeTranscoder;

/// What a decode should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeRequest {
    pub params: PcmParams,
    /// Audio to drop from the start of the source, in milliseconds.
    pub trim_start_ms: u64,
}

impl DecodeRequest {
    pub fn new(params: PcmParams) -> Self {
        Self {
            params,
            trim_start_ms: 0,
        }
    }

    pub fn with_trim_start_ms(mut self, trim_start_ms: u64) -> Self {
        self.trim_start_ms = trim_start_ms;
        self
    }

    /// Number of leading samples covered by `trim_start_ms`.
    pub fn trim_samples(&self) -> usize {
        (self.trim_start_ms as f64 / 1000.0 * self.params.sample_rate as f64).floor() as usize
    }

    pub(crate) fn ensure_mono(&self) -> Result<(), TranscodeError> {
        ensure_mono(&self.params)
    }
}

/// Capability for getting audio in and out of container files.
pub trait Transcoder {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Decode `input` into mono s16 samples at the requested sample rate.
    fn decode(&self, input: &Path, request: &DecodeRequest) -> Result<PcmBuffer, TranscodeError>;

    /// Wrap `pcm` into a container file at `output`.
    fn encode(
        &self,
        pcm: &PcmBuffer,
        params: &PcmParams,
        output: &Path,
    ) -> Result<(), TranscodeError>;
}

pub(crate) fn ensure_mono(params: &PcmParams) -> Result<(), TranscodeError> {
    if params.channels != 1 {
        return Err(TranscodeError::UnsupportedParams(format!(
            "expected 1 channel, got {}",
            params.channels
        )));
    }
    if params.sample_rate == 0 {
        return Err(TranscodeError::UnsupportedParams(
            "sample rate must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
