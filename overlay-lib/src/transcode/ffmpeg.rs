//! Transcoding through an external `ffmpeg` binary.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;

use log::debug;

use super::{ensure_mono, DecodeRequest, TranscodeError, Transcoder};
use crate::pcm::{PcmBuffer, PcmParams};

/// Environment variable naming the ffmpeg binary to run.
pub const FFMPEG_ENV: &str = "OVERLAY_FFMPEG";

const DEFAULT_BINARY: &str = "ffmpeg";
const STDERR_TAIL_LINES: usize = 8;

/// Runs ffmpeg as a black box, streaming raw s16le through its stdio.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Use `$OVERLAY_FFMPEG` if set, otherwise `ffmpeg` from `PATH`.
    pub fn from_env() -> Self {
        match std::env::var_os(FFMPEG_ENV) {
            Some(binary) if !binary.is_empty() => Self::new(binary),
            _ => Self::new(DEFAULT_BINARY),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn program(&self) -> String {
        self.binary.display().to_string()
    }

    fn decode_args(input: &Path, request: &DecodeRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-nostdin".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            input.as_os_str().to_os_string(),
        ];
        if request.trim_start_ms > 0 {
            args.push("-af".into());
            args.push(
                format!(
                    "atrim=start={:.3}",
                    request.trim_start_ms as f64 / 1000.0
                )
                .into(),
            );
        }
        args.extend(
            [
                "-f".to_string(),
                "s16le".to_string(),
                "-acodec".to_string(),
                "pcm_s16le".to_string(),
                "-ac".to_string(),
                request.params.channels.to_string(),
                "-ar".to_string(),
                request.params.sample_rate.to_string(),
                "pipe:1".to_string(),
            ]
            .map(OsString::from),
        );
        args
    }

    fn encode_args(params: &PcmParams, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-nostdin".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-f".to_string(),
            "s16le".to_string(),
            "-ar".to_string(),
            params.sample_rate.to_string(),
            "-ac".to_string(),
            params.channels.to_string(),
            "-i".to_string(),
            "pipe:0".to_string(),
        ]
        .map(OsString::from)
        .to_vec();
        args.push(output.as_os_str().to_os_string());
        args
    }

    fn check_status(&self, output: &Output) -> Result<(), TranscodeError> {
        if output.status.success() {
            return Ok(());
        }
        Err(TranscodeError::ToolFailed {
            program: self.program(),
            status: output.status.code(),
            stderr: stderr_tail(&output.stderr),
        })
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn decode(&self, input: &Path, request: &DecodeRequest) -> Result<PcmBuffer, TranscodeError> {
        request.ensure_mono()?;
        let args = Self::decode_args(input, request);
        debug!("running {} {:?}", self.program(), args);

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| TranscodeError::Spawn {
                program: self.program(),
                source,
            })?;
        self.check_status(&output)?;

        Ok(PcmBuffer::from_le_bytes(&output.stdout)?)
    }

    fn encode(
        &self,
        pcm: &PcmBuffer,
        params: &PcmParams,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        ensure_mono(params)?;
        let args = Self::encode_args(params, output);
        debug!("running {} {:?}", self.program(), args);

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TranscodeError::Spawn {
                program: self.program(),
                source,
            })?;

        // Feed stdin from a separate thread so a chatty stderr cannot stall
        // the pipe while we are still writing.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TranscodeError::Encode("ffmpeg stdin was not captured".to_string()))?;
        let bytes = pcm.to_le_bytes();
        let writer = thread::spawn(move || stdin.write_all(&bytes));

        let result = child.wait_with_output()?;
        let written = writer
            .join()
            .map_err(|_| TranscodeError::Encode("stdin writer thread panicked".to_string()))?;

        // A failed tool usually also breaks the pipe; report the tool.
        self.check_status(&result)?;
        written?;
        Ok(())
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
