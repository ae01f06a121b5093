use std::fmt::{Display, Formatter};

/// Error type for the mixer.
///
/// The mixer performs no IO, so configuration is the only thing that can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MixError {
    InvalidConfig(String),
}

impl Display for MixError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(err) => write!(f, "invalid mix config: {}", err),
        }
    }
}

impl std::error::Error for MixError {}
