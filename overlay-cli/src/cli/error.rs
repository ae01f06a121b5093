use std::fmt::{Display, Formatter};

use overlay_lib::mix::MixError;
use overlay_lib::pcm::PcmError;
use overlay_lib::pipeline::{JobError, PipelineError};

/// Error type for a CLI run.
#[derive(Debug)]
pub enum CliError {
    InvalidArgument {
        name: &'static str,
        value: String,
        reason: String,
    },
    MissingArgument(&'static str),
    Unsupported(String),
    Job(JobError),
    Pipeline(PipelineError),
    Pcm(PcmError),
    Mix(MixError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument {
                name,
                value,
                reason,
            } => write!(f, "invalid value \"{}\" for --{}: {}", value, name, reason),
            Self::MissingArgument(name) => write!(f, "missing required argument {}", name),
            Self::Unsupported(err) => write!(f, "{}", err),
            Self::Job(err) => write!(f, "{}", err),
            Self::Pipeline(err) => write!(f, "{}", err),
            Self::Pcm(err) => write!(f, "{}", err),
            Self::Mix(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CliError {}

impl From<JobError> for CliError {
    fn from(value: JobError) -> Self {
        Self::Job(value)
    }
}

impl From<PipelineError> for CliError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl From<PcmError> for CliError {
    fn from(value: PcmError) -> Self {
        Self::Pcm(value)
    }
}

impl From<MixError> for CliError {
    fn from(value: MixError) -> Self {
        Self::Mix(value)
    }
}
