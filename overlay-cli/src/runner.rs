use std::path::PathBuf;

use clap::ArgMatches;
use log::{debug, info, warn};
use overlay_lib::mix::{mix_with_report, MixConfig, MixReport};
use overlay_lib::pcm::PcmBuffer;
use overlay_lib::pipeline::{self, OverlayJob};
#[cfg(feature = "native")]
use overlay_lib::transcode::NativeTranscoder;
use overlay_lib::transcode::{FfmpegTranscoder, Transcoder};

use crate::cli::{options, CliError};

/// Dispatch the parsed command line. Returns the process exit code.
pub fn run(args: &ArgMatches) -> Result<i32, CliError> {
    match args.subcommand() {
        Some(("mix", matches)) => run_mix(matches),
        Some(("mix-raw", matches)) => run_mix_raw(matches),
        Some(("create", matches)) => run_create(matches),
        _ => Err(CliError::MissingArgument("<COMMAND>")),
    }
}

fn load_job(matches: &ArgMatches) -> Result<OverlayJob, CliError> {
    match matches.get_one::<String>("config") {
        Some(path) => {
            debug!("loading job from {}", path);
            Ok(OverlayJob::from_json_file(path)?)
        }
        None => Ok(OverlayJob::default()),
    }
}

fn path_arg(matches: &ArgMatches, name: &str) -> Option<PathBuf> {
    matches.get_one::<String>(name).map(PathBuf::from)
}

fn run_mix(matches: &ArgMatches) -> Result<i32, CliError> {
    let mut job = load_job(matches)?;
    if let Some(base) = path_arg(matches, "BASE") {
        job.base = base;
    }
    if let Some(overlay) = path_arg(matches, "OVERLAY") {
        job.overlay = overlay;
    }
    if let Some(output) = path_arg(matches, "output") {
        job.output = output;
    }
    if let Some(trim) = options::parse_value::<u64>(matches, "overlay-trim-ms")? {
        job.overlay_trim_ms = trim;
    }
    options::apply_mix_overrides(matches, &mut job.mix)?;

    let transcoder = select_transcoder(matches)?;
    let report = pipeline::run(&job, transcoder.as_ref())?;
    log_summary(&report);
    info!("wrote {}", job.output.display());
    Ok(0)
}

fn run_mix_raw(matches: &ArgMatches) -> Result<i32, CliError> {
    let mut config: MixConfig = load_job(matches)?.mix;
    options::apply_mix_overrides(matches, &mut config)?;
    config.validate()?;

    let base_path = path_arg(matches, "BASE").ok_or(CliError::MissingArgument("BASE"))?;
    let overlay_path = path_arg(matches, "OVERLAY").ok_or(CliError::MissingArgument("OVERLAY"))?;
    let output_path = path_arg(matches, "output").ok_or(CliError::MissingArgument("--output"))?;

    info!("reading {}", base_path.display());
    let base = PcmBuffer::read_raw(&base_path)?;
    info!("reading {}", overlay_path.display());
    let overlay = PcmBuffer::read_raw(&overlay_path)?;

    let (mixed, report) = mix_with_report(&base, &overlay, &config)?;
    log_summary(&report);
    if report.out_of_range_samples > 0 {
        warn!(
            "{} mixed samples were out of 16-bit range",
            report.out_of_range_samples
        );
    }

    mixed.write_raw(&output_path)?;
    info!("wrote {}", output_path.display());
    Ok(0)
}

fn run_create(matches: &ArgMatches) -> Result<i32, CliError> {
    match matches.subcommand() {
        Some(("job-json", _)) => {
            println!("{}", OverlayJob::default().to_json_pretty()?);
            Ok(0)
        }
        _ => Err(CliError::MissingArgument("<PAYLOAD>")),
    }
}

fn select_transcoder(matches: &ArgMatches) -> Result<Box<dyn Transcoder>, CliError> {
    let name = matches
        .get_one::<String>("transcoder")
        .map(String::as_str)
        .unwrap_or("ffmpeg");

    match name {
        "ffmpeg" => {
            let transcoder = match matches.get_one::<String>("ffmpeg") {
                Some(binary) => FfmpegTranscoder::new(binary),
                None => FfmpegTranscoder::from_env(),
            };
            debug!("using ffmpeg at {}", transcoder.binary().display());
            Ok(Box::new(transcoder))
        }
        #[cfg(feature = "native")]
        "native" => Ok(Box::new(NativeTranscoder::new())),
        other => Err(CliError::Unsupported(format!(
            "transcoder \"{}\" is not available in this build",
            other
        ))),
    }
}

fn log_summary(report: &MixReport) {
    info!(
        "overlay active for {} samples from sample {}",
        report.overlay_samples_used, report.position_samples
    );
}
