pub mod args;
mod error;
pub mod options;

pub use error::CliError;
