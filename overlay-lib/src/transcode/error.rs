use std::fmt::{Display, Formatter};

use crate::pcm::PcmError;

/// Error type for moving audio between container files and raw PCM.
#[derive(Debug)]
pub enum TranscodeError {
    Io(std::io::Error),
    Pcm(PcmError),
    /// The external tool could not be started.
    Spawn {
        program: String,
        source: std::io::Error,
    },
    /// The external tool ran and reported failure.
    ToolFailed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
    Decode(String),
    Encode(String),
    SampleRateMismatch {
        expected: u32,
        found: u32,
    },
    UnsupportedParams(String),
    /// The transcoder cannot write the container the output path asks for.
    UnsupportedOutput(String),
}

impl Display for TranscodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Pcm(err) => write!(f, "pcm error: {}", err),
            Self::Spawn { program, source } => {
                write!(f, "failed to start {}: {}", program, source)
            }
            Self::ToolFailed {
                program,
                status,
                stderr,
            } => {
                match status {
                    Some(code) => write!(f, "{} exited with status {}", program, code)?,
                    None => write!(f, "{} was terminated by a signal", program)?,
                }
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
            Self::Decode(err) => write!(f, "decode error: {}", err),
            Self::Encode(err) => write!(f, "encode error: {}", err),
            Self::SampleRateMismatch { expected, found } => write!(
                f,
                "source sample rate {} Hz does not match requested {} Hz",
                found, expected
            ),
            Self::UnsupportedParams(err) => write!(f, "unsupported pcm parameters: {}", err),
            Self::UnsupportedOutput(err) => write!(f, "unsupported output format: {}", err),
        }
    }
}

impl std::error::Error for TranscodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Pcm(err) => Some(err),
            Self::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TranscodeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<PcmError> for TranscodeError {
    fn from(value: PcmError) -> Self {
        Self::Pcm(value)
    }
}
