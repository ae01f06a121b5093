use std::fmt::{Display, Formatter};

/// Error type for raw PCM conversion and file IO.
#[derive(Debug)]
pub enum PcmError {
    Io(std::io::Error),
    /// The byte stream does not hold a whole number of 16-bit samples.
    OddLength(usize),
}

impl Display for PcmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::OddLength(len) => write!(
                f,
                "raw pcm stream of {} bytes is not a whole number of 16-bit samples",
                len
            ),
        }
    }
}

impl std::error::Error for PcmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::OddLength(_) => None,
        }
    }
}

impl From<std::io::Error> for PcmError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
