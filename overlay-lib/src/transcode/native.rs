//! In-process transcoding: symphonia for decode, hound for WAV output.

use std::fs::File;
use std::path::Path;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::{ensure_mono, DecodeRequest, TranscodeError, Transcoder};
use crate::pcm::{PcmBuffer, PcmParams, PcmSample, BITS_PER_SAMPLE};

/// Transcoder that needs no external tools.
///
/// Decodes anything symphonia's default codecs can probe and writes 16-bit
/// WAV, so output paths must end in `.wav`. Multi-channel sources are averaged down to mono. There is no
/// resampler, so the source must already be at the requested rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTranscoder;

impl NativeTranscoder {
    pub fn new() -> Self {
        Self
    }
}

impl Transcoder for NativeTranscoder {
    fn name(&self) -> &'static str {
        "native"
    }

    fn decode(&self, input: &Path, request: &DecodeRequest) -> Result<PcmBuffer, TranscodeError> {
        request.ensure_mono()?;
        let expected_rate = request.params.sample_rate;

        let src = File::open(input)?;
        let mss = MediaSourceStream::new(Box::new(src), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = input.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();
        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|err| TranscodeError::Decode(err.to_string()))?;
        let mut format = probed.format;

        let (track_id, codec_params) = format
            .tracks()
            .iter()
            .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
            .map(|track| (track.id, track.codec_params.clone()))
            .ok_or_else(|| TranscodeError::Decode("no supported audio tracks".to_string()))?;

        if let Some(found) = codec_params.sample_rate {
            check_rate(expected_rate, found)?;
        }

        let dec_opts: DecoderOptions = Default::default();
        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &dec_opts)
            .map_err(|err| TranscodeError::Decode(err.to_string()))?;

        let mut samples: Vec<PcmSample> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(Error::ResetRequired) => {
                    return Err(TranscodeError::Decode(
                        "decoder reset required".to_string(),
                    ));
                }
                Err(err) => return Err(TranscodeError::Decode(err.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    check_rate(expected_rate, spec.rate)?;
                    let channels = spec.channels.count().max(1);
                    let mut interleaved =
                        SampleBuffer::<PcmSample>::new(decoded.capacity() as u64, spec);
                    interleaved.copy_interleaved_ref(decoded);
                    downmix_into(interleaved.samples(), channels, &mut samples);
                }
                Err(Error::DecodeError(err)) => {
                    warn!("decode error in {}: {}", input.display(), err);
                }
                Err(err) => return Err(TranscodeError::Decode(err.to_string())),
            }
        }

        let trim = request.trim_samples().min(samples.len());
        samples.drain(..trim);
        debug!(
            "decoded {} samples from {} (trimmed {})",
            samples.len(),
            input.display(),
            trim
        );

        Ok(PcmBuffer::new(samples))
    }

    fn encode(
        &self,
        pcm: &PcmBuffer,
        params: &PcmParams,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        ensure_mono(params)?;
        ensure_wav_output(output)?;
        let spec = hound::WavSpec {
            channels: params.channels,
            sample_rate: params.sample_rate,
            bits_per_sample: BITS_PER_SAMPLE,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(output, spec).map_err(encode_error)?;
        for &sample in pcm.as_slice() {
            writer.write_sample(sample).map_err(encode_error)?;
        }
        writer.finalize().map_err(encode_error)?;
        Ok(())
    }
}

fn ensure_wav_output(output: &Path) -> Result<(), TranscodeError> {
    match output.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("wav") => Ok(()),
        _ => Err(TranscodeError::UnsupportedOutput(format!(
            "native transcoder only writes .wav files, got {}",
            output.display()
        ))),
    }
}

fn check_rate(expected: u32, found: u32) -> Result<(), TranscodeError> {
    if expected != found {
        return Err(TranscodeError::SampleRateMismatch { expected, found });
    }
    Ok(())
}

fn downmix_into(interleaved: &[PcmSample], channels: usize, out: &mut Vec<PcmSample>) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.reserve(interleaved.len() / channels);
    for frame in interleaved.chunks_exact(channels) {
        let sum: i32 = frame.iter().map(|&sample| sample as i32).sum();
        out.push((sum / channels as i32) as PcmSample);
    }
}

fn encode_error(err: hound::Error) -> TranscodeError {
    match err {
        hound::Error::IoError(err) => TranscodeError::Io(err),
        other => TranscodeError::Encode(other.to_string()),
    }
}
