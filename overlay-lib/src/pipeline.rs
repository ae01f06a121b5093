//! Decode → mix → encode, for one overlay job.
//!
//! Stages run strictly in order and the first failure aborts the job. The
//! encoder writes into a temporary file next to the requested output, which
//! is only renamed into place once encoding succeeded, so a failed job never
//! leaves an output file behind.

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::mix::{mix_with_report, MixConfig, MixError, MixReport};
use crate::pcm::{PcmBuffer, PcmParams};
use crate::transcode::{DecodeRequest, TranscodeError, Transcoder};

const DEFAULT_OVERLAY_TRIM_MS: u64 = 1_000;

/// Everything needed to render one overlaid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayJob {
    pub base: PathBuf,
    pub overlay: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub mix: MixConfig,
    /// Audio dropped from the start of the overlay source before mixing.
    #[serde(default)]
    pub overlay_trim_ms: u64,
}

impl Default for OverlayJob {
    fn default() -> Self {
        Self {
            base: PathBuf::from("base_audio.wav"),
            overlay: PathBuf::from("overlay_audio.wav"),
            output: PathBuf::from("out.wav"),
            mix: MixConfig::default(),
            overlay_trim_ms: DEFAULT_OVERLAY_TRIM_MS,
        }
    }
}

impl OverlayJob {
    /// Load a job from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, JobError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, JobError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Error type for loading job files.
#[derive(Debug)]
pub enum JobError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for JobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Parse(err) => write!(f, "invalid job file: {}", err),
        }
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for JobError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for JobError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Pipeline stage, reported with any failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    DecodeBase,
    DecodeOverlay,
    Mix,
    Encode,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Validate => "validate config",
            Self::DecodeBase => "decode base",
            Self::DecodeOverlay => "decode overlay",
            Self::Mix => "mix",
            Self::Encode => "encode output",
        };
        f.write_str(label)
    }
}

/// Error type for a pipeline run.
#[derive(Debug)]
pub enum PipelineError {
    Mix { stage: Stage, source: MixError },
    Transcode { stage: Stage, source: TranscodeError },
    Io { stage: Stage, source: std::io::Error },
}

impl PipelineError {
    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Mix { stage, .. } | Self::Transcode { stage, .. } | Self::Io { stage, .. } => {
                *stage
            }
        }
    }
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mix { stage, source } => write!(f, "{} failed: {}", stage, source),
            Self::Transcode { stage, source } => write!(f, "{} failed: {}", stage, source),
            Self::Io { stage, source } => write!(f, "{} failed: {}", stage, source),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Mix { source, .. } => Some(source),
            Self::Transcode { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Run `job` end to end with `transcoder`.
///
/// # Errors
/// Returns the first failing stage. The mix config is validated before any
/// decoding starts.
pub fn run(job: &OverlayJob, transcoder: &dyn Transcoder) -> Result<MixReport, PipelineError> {
    job.mix.validate().map_err(|source| PipelineError::Mix {
        stage: Stage::Validate,
        source,
    })?;

    let params = PcmParams::mono(job.mix.sample_rate);

    info!(
        "decoding base {} with {}",
        job.base.display(),
        transcoder.name()
    );
    let base = transcoder
        .decode(&job.base, &DecodeRequest::new(params))
        .map_err(|source| PipelineError::Transcode {
            stage: Stage::DecodeBase,
            source,
        })?;
    debug!(
        "base: {} samples ({:.1} ms)",
        base.len(),
        base.duration_ms(params.sample_rate)
    );

    info!(
        "decoding overlay {} with {}",
        job.overlay.display(),
        transcoder.name()
    );
    let overlay_request = DecodeRequest::new(params).with_trim_start_ms(job.overlay_trim_ms);
    let overlay = transcoder
        .decode(&job.overlay, &overlay_request)
        .map_err(|source| PipelineError::Transcode {
            stage: Stage::DecodeOverlay,
            source,
        })?;
    debug!(
        "overlay: {} samples ({:.1} ms) after trimming {} ms",
        overlay.len(),
        overlay.duration_ms(params.sample_rate),
        job.overlay_trim_ms
    );

    info!(
        "mixing at {} ms, loop x{}, {}",
        job.mix.position_ms,
        job.mix.loop_count,
        if job.mix.silent_base {
            "base silenced".to_string()
        } else {
            format!("{} blend", job.mix.blend)
        }
    );
    let (mixed, report) =
        mix_with_report(&base, &overlay, &job.mix).map_err(|source| PipelineError::Mix {
            stage: Stage::Mix,
            source,
        })?;
    log_report(&report, base.len());

    info!("encoding {}", job.output.display());
    encode_atomically(transcoder, &mixed, &params, &job.output)?;

    Ok(report)
}

fn log_report(report: &MixReport, base_len: usize) {
    if report.position_samples >= base_len && report.window_len > 0 {
        warn!(
            "overlay position (sample {}) is past the end of the base track ({} samples)",
            report.position_samples, base_len
        );
    }
    if report.out_of_range_samples > 0 {
        warn!(
            "{} mixed samples were out of 16-bit range",
            report.out_of_range_samples
        );
    }
    debug!(
        "used {} of {} overlay window samples",
        report.overlay_samples_used, report.window_len
    );
    if report.window_exhausted() {
        debug!(
            "overlay ran out at sample {}, rest of the base passes through",
            report.position_samples + report.overlay_samples_used
        );
    } else if report.overlay_samples_used > 0 {
        debug!("base track ended before the overlay window");
    }
}

fn encode_atomically(
    transcoder: &dyn Transcoder,
    pcm: &PcmBuffer,
    params: &PcmParams,
    output: &Path,
) -> Result<(), PipelineError> {
    let io_error = |source| PipelineError::Io {
        stage: Stage::Encode,
        source,
    };

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // Keep the extension so tools that pick a container from it still can.
    let suffix = output
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let staging = tempfile::Builder::new()
        .prefix(".overlay-")
        .suffix(&suffix)
        .tempfile_in(dir)
        .map_err(io_error)?
        .into_temp_path();

    transcoder
        .encode(pcm, params, &staging)
        .map_err(|source| PipelineError::Transcode {
            stage: Stage::Encode,
            source,
        })?;

    staging.persist(output).map_err(|err| io_error(err.error))?;
    Ok(())
}
