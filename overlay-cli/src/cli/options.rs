//! Turning mixer flags into a [`MixConfig`].

use std::str::FromStr;

use clap::ArgMatches;
use overlay_lib::level::parse_gain;
use overlay_lib::mix::{BlendMode, MixConfig, OverflowPolicy};

use super::CliError;

/// Parse an optional flag with [`FromStr`].
pub fn parse_value<T>(matches: &ArgMatches, name: &'static str) -> Result<Option<T>, CliError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = matches.get_one::<String>(name) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|err| CliError::InvalidArgument {
            name,
            value: raw.clone(),
            reason: err.to_string(),
        })
}

fn parse_gain_value(matches: &ArgMatches, name: &'static str) -> Result<Option<f64>, CliError> {
    let Some(raw) = matches.get_one::<String>(name) else {
        return Ok(None);
    };
    parse_gain(raw)
        .map(Some)
        .ok_or_else(|| CliError::InvalidArgument {
            name,
            value: raw.clone(),
            reason: "expected a number or a value like \"-6db\"".to_string(),
        })
}

/// Apply every mixer flag that was given on the command line to `config`.
pub fn apply_mix_overrides(matches: &ArgMatches, config: &mut MixConfig) -> Result<(), CliError> {
    if let Some(position_ms) = parse_value::<u64>(matches, "position-ms")? {
        config.position_ms = position_ms;
    }
    if let Some(loop_count) = parse_value::<u32>(matches, "loop")? {
        config.loop_count = loop_count;
    }
    if let Some(gain) = parse_gain_value(matches, "gain-base")? {
        config.gain_base = gain;
    }
    if let Some(gain) = parse_gain_value(matches, "gain-overlay")? {
        config.gain_overlay = gain;
    }
    if matches.get_flag("silent") {
        config.silent_base = true;
    }
    if matches.get_flag("no-silent") {
        config.silent_base = false;
    }
    if let Some(sample_rate) = parse_value::<u32>(matches, "sample-rate")? {
        config.sample_rate = sample_rate;
    }
    if let Some(overflow) = parse_value::<OverflowPolicy>(matches, "overflow")? {
        config.overflow = overflow;
    }
    if let Some(blend) = parse_value::<BlendMode>(matches, "blend-mode")? {
        config.blend = blend;
    }
    Ok(())
}
