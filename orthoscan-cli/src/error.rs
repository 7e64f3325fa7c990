//! CLI error type.

use thiserror::Error;

use orthoscan::area::AreaError;
use orthoscan::config::ConfigError;
use orthoscan::detect::DetectError;
use orthoscan::download::DownloadError;
use orthoscan::logging::LoggingError;
use orthoscan::provider::ProviderError;

/// Errors surfaced to the user by any command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("Failed to load area of interest: {0}")]
    Area(#[from] AreaError),

    #[error("Tile provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Detection failed: {0}")]
    Detect(#[from] DetectError),
}
