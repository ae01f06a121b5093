//! CLI argument definitions for `overlay`.

use clap::{Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("overlay")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Overlay one audio track onto another at a fixed offset")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Only print errors"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .short('d')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Show debug output"),
        )
        .subcommand(mix_args(
            Command::new("mix")
                .about("Decode two audio files, overlay them and encode the result")
                .arg(
                    Arg::new("BASE")
                        .help("The base audio file (defaults to the job file's base)")
                        .index(1),
                )
                .arg(
                    Arg::new("OVERLAY")
                        .help("The overlay audio file (defaults to the job file's overlay)")
                        .index(2),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("PATH")
                        .help("Output audio file; the extension selects the container for ffmpeg"),
                )
                .arg(
                    Arg::new("overlay-trim-ms")
                        .long("overlay-trim-ms")
                        .value_name("MS")
                        .help("Drop this much audio from the start of the overlay before mixing"),
                )
                .arg(
                    Arg::new("transcoder")
                        .long("transcoder")
                        .short('t')
                        .value_name("NAME")
                        .value_parser(["ffmpeg", "native"])
                        .default_value("ffmpeg")
                        .help("How to decode and encode audio files"),
                )
                .arg(
                    Arg::new("ffmpeg")
                        .long("ffmpeg")
                        .value_name("PATH")
                        .help("Path to the ffmpeg binary (defaults to $OVERLAY_FFMPEG, then ffmpeg)"),
                ),
        ))
        .subcommand(mix_args(
            Command::new("mix-raw")
                .about("Overlay two headerless mono s16le files without transcoding")
                .arg(
                    Arg::new("BASE")
                        .help("The base raw PCM file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("OVERLAY")
                        .help("The overlay raw PCM file")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("PATH")
                        .required(true)
                        .help("Output raw PCM file"),
                ),
        ))
        .subcommand(
            Command::new("create")
                .about("Emit default JSON payloads")
                .subcommand_required(true)
                .subcommand(
                    Command::new("job-json").about("Print a default overlay job JSON payload"),
                ),
        )
}

/// Mixer flags shared by `mix` and `mix-raw`. Anything left unset falls back
/// to the job file, then to the built-in defaults.
fn mix_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .help("Path to an overlay job JSON file"),
        )
        .arg(
            Arg::new("position-ms")
                .long("position-ms")
                .short('p')
                .value_name("MS")
                .help("Offset into the base track where the overlay starts"),
        )
        .arg(
            Arg::new("loop")
                .long("loop")
                .short('l')
                .value_name("COUNT")
                .help("Number of back-to-back copies of the overlay"),
        )
        .arg(
            Arg::new("gain-base")
                .long("gain-base")
                .value_name("GAIN")
                .allow_hyphen_values(true)
                .help("Base gain while blending, linear or in dB (e.g. 0.2 or -14db)"),
        )
        .arg(
            Arg::new("gain-overlay")
                .long("gain-overlay")
                .value_name("GAIN")
                .allow_hyphen_values(true)
                .help("Overlay gain, linear or in dB"),
        )
        .arg(
            Arg::new("silent")
                .long("silent")
                .action(ArgAction::SetTrue)
                .conflicts_with("no-silent")
                .help("Replace the base with the overlay while the overlay plays"),
        )
        .arg(
            Arg::new("no-silent")
                .long("no-silent")
                .action(ArgAction::SetTrue)
                .help("Blend the base with the overlay while the overlay plays"),
        )
        .arg(
            Arg::new("sample-rate")
                .long("sample-rate")
                .short('r')
                .value_name("HZ")
                .help("Sample rate of both tracks and of the output"),
        )
        .arg(
            Arg::new("overflow")
                .long("overflow")
                .value_name("POLICY")
                .value_parser(["clamp", "wrap"])
                .help("What to do with mixed values outside the 16-bit range"),
        )
        .arg(
            Arg::new("blend-mode")
                .long("blend-mode")
                .value_name("MODE")
                .value_parser(["average", "sum"])
                .help("How base and overlay combine when not silenced"),
        )
}
