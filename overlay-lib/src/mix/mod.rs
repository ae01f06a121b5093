//! The overlay mixer.
//!
//! A mix is a single pass over the base track. Before the overlay position,
//! and again once the looped overlay window has been used up, base samples
//! pass through untouched. In between, each output sample is either the
//! gain-scaled overlay sample (silent base) or a blend of both gain-scaled
//! samples, rounded and narrowed back to 16 bits according to the
//! configured [`OverflowPolicy`].

mod config;
mod error;
mod window;

use log::debug;

use crate::pcm::{PcmBuffer, PcmSample};

pub use config::{BlendMode, MixConfig, OverflowPolicy};
pub use error::MixError;
pub use window::OverlayWindow;

/// Summary of what a mix did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixReport {
    /// Base index at which the overlay became eligible.
    pub position_samples: usize,
    /// Length of the looped overlay window, saturated at `usize::MAX`.
    pub window_len: usize,
    /// Output samples that were taken from the overlay window.
    pub overlay_samples_used: usize,
    /// Mixed values that fell outside the 16-bit range before narrowing.
    pub out_of_range_samples: usize,
}

impl MixReport {
    /// True if every sample of a non-empty overlay window reached the output.
    pub fn window_exhausted(&self) -> bool {
        self.window_len > 0 && self.overlay_samples_used == self.window_len
    }
}

/// Overlay `overlay` onto `base` and return a buffer of the same length as
/// `base`.
///
/// # Errors
/// Returns [`MixError::InvalidConfig`] before touching any sample if the
/// config fails [`MixConfig::validate`].
pub fn mix(
    base: &PcmBuffer,
    overlay: &PcmBuffer,
    config: &MixConfig,
) -> Result<PcmBuffer, MixError> {
    mix_with_report(base, overlay, config).map(|(output, _)| output)
}

/// Same as [`mix`], also returning a [`MixReport`].
pub fn mix_with_report(
    base: &PcmBuffer,
    overlay: &PcmBuffer,
    config: &MixConfig,
) -> Result<(PcmBuffer, MixReport), MixError> {
    config.validate()?;

    let position_samples = config.position_samples();
    // The cursor can never pass the samples left after the overlay position.
    let reachable = base.len().saturating_sub(position_samples);
    let window = OverlayWindow::build(overlay, config.loop_count, reachable);
    debug!(
        "mixing {} base samples, overlay window {} samples from index {}",
        base.len(),
        window.len(),
        position_samples
    );

    let mut output = Vec::with_capacity(base.len());
    let mut cursor = 0_usize;
    let mut out_of_range_samples = 0_usize;

    for (n, &base_sample) in base.as_slice().iter().enumerate() {
        let active = if n >= position_samples {
            window.get(cursor)
        } else {
            None
        };

        let Some(overlay_sample) = active else {
            output.push(base_sample);
            continue;
        };

        let (sample, out_of_range) = config
            .overflow
            .narrow(mix_sample(base_sample, overlay_sample, config));
        if out_of_range {
            out_of_range_samples += 1;
        }
        output.push(sample);
        cursor += 1;
    }

    let report = MixReport {
        position_samples,
        window_len: window.len(),
        overlay_samples_used: cursor,
        out_of_range_samples,
    };

    Ok((PcmBuffer::new(output), report))
}

fn mix_sample(base: PcmSample, overlay: PcmSample, config: &MixConfig) -> f64 {
    let wet = overlay as f64 * config.gain_overlay;
    if config.silent_base {
        return wet;
    }
    let dry = base as f64 * config.gain_base;
    config.blend.combine(dry, wet)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: PcmSample, len: usize) -> PcmBuffer {
        PcmBuffer::new(vec![value; len])
    }

    fn config() -> MixConfig {
        MixConfig {
            position_ms: 0,
            loop_count: 1,
            gain_base: 1.0,
            gain_overlay: 1.0,
            silent_base: true,
            sample_rate: 1_000,
            ..MixConfig::default()
        }
    }

    fn ramp(len: usize) -> PcmBuffer {
        PcmBuffer::new((0..len).map(|i| (i as PcmSample) * 7 - 300).collect())
    }

    #[test]
    fn silent_mode_replaces_base_until_overlay_runs_out() {
        let base = constant(1_000, 100);
        let overlay = constant(2_000, 10);
        let output = mix(&base, &overlay, &config()).expect("mix");

        let mut expected = vec![2_000; 10];
        expected.extend(vec![1_000; 90]);
        assert_eq!(output.as_slice(), expected.as_slice());
    }

    #[test]
    fn blended_mode_averages_gain_scaled_samples() {
        let base = constant(1_000, 100);
        let overlay = constant(2_000, 10);
        let config = MixConfig {
            silent_base: false,
            gain_base: 0.5,
            ..config()
        };
        let output = mix(&base, &overlay, &config).expect("mix");

        let mut expected = vec![1_250; 10];
        expected.extend(vec![1_000; 90]);
        assert_eq!(output.as_slice(), expected.as_slice());
    }

    #[test]
    fn sum_blend_skips_the_halving() {
        let base = constant(1_000, 20);
        let overlay = constant(2_000, 10);
        let config = MixConfig {
            silent_base: false,
            gain_base: 0.5,
            blend: BlendMode::Sum,
            ..config()
        };
        let output = mix(&base, &overlay, &config).expect("mix");
        assert_eq!(&output.as_slice()[..10], &[2_500; 10]);
        assert_eq!(&output.as_slice()[10..], &[1_000; 10]);
    }

    #[test]
    fn looped_window_covers_loop_count_repetitions() {
        let base = constant(1_000, 100);
        let overlay = PcmBuffer::new((1..=10).collect());
        let config = MixConfig {
            loop_count: 3,
            ..config()
        };
        let (output, report) = mix_with_report(&base, &overlay, &config).expect("mix");

        assert_eq!(report.window_len, 30);
        assert_eq!(report.overlay_samples_used, 30);
        assert!(report.window_exhausted());
        for n in 0..30 {
            assert_ne!(output.as_slice()[n], base.as_slice()[n], "index {}", n);
            assert_eq!(output.as_slice()[n], (n % 10 + 1) as PcmSample);
        }
        assert_eq!(&output.as_slice()[30..], &base.as_slice()[30..]);
    }

    #[test]
    fn huge_loop_count_only_covers_the_base() {
        let base = constant(0, 10);
        let overlay = constant(1, 44_100);
        let config = MixConfig {
            loop_count: u32::MAX,
            ..config()
        };
        let (output, report) = mix_with_report(&base, &overlay, &config).expect("mix");
        assert_eq!(output.as_slice(), &[1; 10]);
        assert_eq!(report.window_len, 44_100usize.saturating_mul(u32::MAX as usize));
        assert!(!report.window_exhausted());
        assert_eq!(report.overlay_samples_used, 10);
    }

    #[test]
    fn overlay_starts_at_position_and_cursor_starts_at_zero() {
        let base = constant(0, 10);
        let overlay = PcmBuffer::new(vec![5, 6, 7]);
        let config = MixConfig {
            position_ms: 4,
            ..config()
        };
        let (output, report) = mix_with_report(&base, &overlay, &config).expect("mix");
        assert_eq!(report.position_samples, 4);
        assert_eq!(output.as_slice(), &[0, 0, 0, 0, 5, 6, 7, 0, 0, 0]);
    }

    #[test]
    fn position_past_base_leaves_base_unchanged() {
        let base = ramp(50);
        let overlay = constant(2_000, 10);
        let config = MixConfig {
            position_ms: 50,
            gain_base: 3.0,
            ..config()
        };
        let (output, report) = mix_with_report(&base, &overlay, &config).expect("mix");
        assert_eq!(output, base);
        assert_eq!(report.overlay_samples_used, 0);
        assert!(!report.window_exhausted());
    }

    #[test]
    fn empty_overlay_leaves_base_unchanged() {
        let base = ramp(64);
        for silent_base in [true, false] {
            let config = MixConfig {
                silent_base,
                gain_base: 0.1,
                loop_count: 5,
                ..config()
            };
            let (output, report) =
                mix_with_report(&base, &PcmBuffer::default(), &config).expect("mix");
            assert_eq!(output, base);
            assert!(!report.window_exhausted());
        }
    }

    #[test]
    fn empty_base_gives_empty_output() {
        let output = mix(&PcmBuffer::default(), &constant(1, 10), &config()).expect("mix");
        assert!(output.is_empty());
    }

    #[test]
    fn output_length_always_matches_base() {
        let base = ramp(37);
        for overlay_len in [0_usize, 1, 5, 36, 37, 80] {
            for loop_count in [1_u32, 2, 9] {
                for position_ms in [0_u64, 3, 36, 37, 500] {
                    let config = MixConfig {
                        loop_count,
                        position_ms,
                        silent_base: position_ms % 2 == 0,
                        ..config()
                    };
                    let output = mix(&base, &constant(-12, overlay_len), &config).expect("mix");
                    assert_eq!(output.len(), base.len());
                }
            }
        }
    }

    #[test]
    fn samples_before_position_are_untouched() {
        let base = ramp(40);
        let overlay = constant(9_000, 40);
        for silent_base in [true, false] {
            let config = MixConfig {
                position_ms: 15,
                gain_base: 4.0,
                gain_overlay: -2.5,
                silent_base,
                ..config()
            };
            let output = mix(&base, &overlay, &config).expect("mix");
            assert_eq!(&output.as_slice()[..15], &base.as_slice()[..15]);
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_mixing() {
        let base = constant(1, 4);
        let overlay = constant(2, 4);

        let zero_rate = MixConfig {
            sample_rate: 0,
            ..config()
        };
        assert!(matches!(
            mix(&base, &overlay, &zero_rate),
            Err(MixError::InvalidConfig(_))
        ));

        let zero_loops = MixConfig {
            loop_count: 0,
            ..config()
        };
        assert!(matches!(
            mix(&base, &overlay, &zero_loops),
            Err(MixError::InvalidConfig(_))
        ));
    }

    #[test]
    fn loud_overlay_is_clamped_and_counted() {
        let base = constant(0, 4);
        let overlay = constant(30_000, 2);
        let config = MixConfig {
            gain_overlay: 2.0,
            ..config()
        };
        let (output, report) = mix_with_report(&base, &overlay, &config).expect("mix");
        assert_eq!(output.as_slice(), &[32_767, 32_767, 0, 0]);
        assert_eq!(report.out_of_range_samples, 2);
    }

    #[test]
    fn wrap_policy_wraps_the_rounded_mix() {
        let base = constant(0, 2);
        let overlay = constant(30_000, 2);
        let config = MixConfig {
            gain_overlay: 2.0,
            overflow: OverflowPolicy::Wrap,
            ..config()
        };
        let (output, report) = mix_with_report(&base, &overlay, &config).expect("mix");
        assert_eq!(output.as_slice(), &[-5_536, -5_536]);
        assert_eq!(report.out_of_range_samples, 2);
    }

    #[test]
    fn wrap_applies_after_blend_halving() {
        let base = constant(30_000, 2);
        let overlay = constant(30_000, 2);
        let config = MixConfig {
            silent_base: false,
            overflow: OverflowPolicy::Wrap,
            ..config()
        };
        let (output, report) = mix_with_report(&base, &overlay, &config).expect("mix");
        assert_eq!(output.as_slice(), &[30_000, 30_000]);
        assert_eq!(report.out_of_range_samples, 0);
    }

    #[test]
    fn blended_values_are_rounded() {
        let base = constant(3, 1);
        let overlay = constant(0, 1);
        let config = MixConfig {
            silent_base: false,
            gain_base: 1.0,
            ..config()
        };
        // (3 + 0) / 2 = 1.5
        assert_eq!(mix(&base, &overlay, &config).expect("mix").as_slice(), &[2]);

        let negative = constant(-3, 1);
        assert_eq!(mix(&negative, &overlay, &config).expect("mix").as_slice(), &[-2]);
    }

    #[test]
    fn inputs_are_not_modified() {
        let base = ramp(20);
        let overlay = constant(100, 5);
        let base_before = base.clone();
        let overlay_before = overlay.clone();
        let _ = mix(&base, &overlay, &config()).expect("mix");
        assert_eq!(base, base_before);
        assert_eq!(overlay, overlay_before);
    }
}
