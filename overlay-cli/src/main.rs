//! # Overlay
//!
//! A command-line tool for overlaying one audio file onto another.

use clap::ArgMatches;
use log::error;

mod cli;
mod logging;
mod runner;

fn main() {
    // Optional .env, mainly for OVERLAY_FFMPEG.
    dotenv::dotenv().ok();

    let args = cli::args::build_cli().get_matches();
    let leaf = leaf_matches(&args);
    logging::init(logging::resolve_level(
        leaf.get_flag("quiet"),
        leaf.get_flag("debug"),
    ));

    let code = match runner::run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            1
        }
    };

    std::process::exit(code)
}

/// Global flags are readable from the innermost subcommand that was used.
fn leaf_matches(matches: &ArgMatches) -> &ArgMatches {
    match matches.subcommand() {
        Some((_, sub)) => leaf_matches(sub),
        None => matches,
    }
}
