//! Provider error types.

use thiserror::Error;

use crate::coord::TileCoord;

/// Errors raised while talking to a tile server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The URL template is unusable.
    #[error("Invalid tile URL template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
}

/// A failed tile fetch, tagged with the tile it was for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to fetch tile {tile}: {source}")]
pub struct FetchError {
    pub tile: TileCoord,
    #[source]
    pub source: ProviderError,
}

impl FetchError {
    pub fn new(tile: TileCoord, source: ProviderError) -> Self {
        Self { tile, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_names_tile_and_reason() {
        let err = FetchError::new(
            TileCoord {
                x: 3,
                y: 4,
                zoom: 5,
            },
            ProviderError::HttpStatus {
                status: 404,
                url: "http://tiles/5/3/4".to_string(),
            },
        );
        let message = err.to_string();
        assert!(message.contains("5/3/4"));
        assert!(message.contains("404"));
    }
}
