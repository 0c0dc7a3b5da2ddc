//! CLI command implementations

pub mod download;
pub mod error;
pub mod export;
pub mod validate;

pub use download::{Cli, Commands, DownloadArgs};
pub use error::CliError;
pub use export::ExportCommand;
pub use validate::ValidateCommand;
