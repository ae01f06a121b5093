//! Mixer configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::MixError;
use crate::level::deserialize_linear_gain;
use crate::pcm::PcmSample;

const DEFAULT_POSITION_MS: u64 = 61_700;
const DEFAULT_LOOP_COUNT: u32 = 1;
const DEFAULT_GAIN_BASE: f64 = 0.2;
const DEFAULT_GAIN_OVERLAY: f64 = 1.0;
const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// What to do with a mixed value that does not fit in a [`PcmSample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Saturate to `[-32768, 32767]`.
    #[default]
    Clamp,
    /// Keep the low 16 bits of the rounded mix result (gains applied and,
    /// for [`BlendMode::Average`], already halved). Loud passages wrap
    /// around instead of saturating.
    Wrap,
}

impl OverflowPolicy {
    /// Round `value` half away from zero and narrow it to a sample.
    ///
    /// The flag is true when the rounded value was outside the sample range,
    /// whatever the policy did with it.
    pub fn narrow(self, value: f64) -> (PcmSample, bool) {
        let rounded = value.round();
        let out_of_range = rounded < PcmSample::MIN as f64 || rounded > PcmSample::MAX as f64;
        let sample = match self {
            Self::Clamp => rounded.clamp(PcmSample::MIN as f64, PcmSample::MAX as f64) as PcmSample,
            Self::Wrap => rounded as i64 as PcmSample,
        };
        (sample, out_of_range)
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clamp => f.write_str("clamp"),
            Self::Wrap => f.write_str("wrap"),
        }
    }
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(Self::Clamp),
            "wrap" => Ok(Self::Wrap),
            other => Err(format!("unknown overflow policy \"{}\"", other)),
        }
    }
}

/// How base and overlay combine while the overlay is active and the base is
/// not silenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// `(base * gain_base + overlay * gain_overlay) / 2`.
    ///
    /// Unity gains give a half-scale average, not a full-volume mix.
    #[default]
    Average,
    /// `base * gain_base + overlay * gain_overlay`.
    Sum,
}

impl BlendMode {
    pub(crate) fn combine(self, dry: f64, wet: f64) -> f64 {
        match self {
            Self::Average => (dry + wet) / 2.0,
            Self::Sum => dry + wet,
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Average => f.write_str("average"),
            Self::Sum => f.write_str("sum"),
        }
    }
}

impl FromStr for BlendMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "average" | "avg" => Ok(Self::Average),
            "sum" => Ok(Self::Sum),
            other => Err(format!("unknown blend mode \"{}\"", other)),
        }
    }
}

/// Parameters for a single overlay mix.
///
/// Gains are linear multipliers and are applied as given, without bounds
/// checks. When deserialized they may also be written as dB strings
/// (`"-6db"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    /// Offset into the base track, in milliseconds, where the overlay starts.
    pub position_ms: u64,
    /// Number of back-to-back copies of the overlay to play.
    pub loop_count: u32,
    #[serde(deserialize_with = "deserialize_linear_gain")]
    pub gain_base: f64,
    #[serde(deserialize_with = "deserialize_linear_gain")]
    pub gain_overlay: f64,
    /// Replace the base with the overlay instead of blending while active.
    pub silent_base: bool,
    pub sample_rate: u32,
    pub overflow: OverflowPolicy,
    pub blend: BlendMode,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            position_ms: DEFAULT_POSITION_MS,
            loop_count: DEFAULT_LOOP_COUNT,
            gain_base: DEFAULT_GAIN_BASE,
            gain_overlay: DEFAULT_GAIN_OVERLAY,
            silent_base: true,
            sample_rate: DEFAULT_SAMPLE_RATE,
            overflow: OverflowPolicy::default(),
            blend: BlendMode::default(),
        }
    }
}

impl MixConfig {
    /// Check the preconditions of a mix.
    ///
    /// # Errors
    /// Returns [`MixError::InvalidConfig`] if `sample_rate` or `loop_count`
    /// is zero.
    pub fn validate(&self) -> Result<(), MixError> {
        if self.sample_rate == 0 {
            return Err(MixError::InvalidConfig(
                "sample_rate must be greater than zero".to_string(),
            ));
        }
        if self.loop_count == 0 {
            return Err(MixError::InvalidConfig(
                "loop_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Sample index at which the overlay becomes active:
    /// `floor(position_ms / 1000 * sample_rate)`.
    pub fn position_samples(&self) -> usize {
        (self.position_ms as f64 / 1000.0 * self.sample_rate as f64).floor() as usize
    }
}
