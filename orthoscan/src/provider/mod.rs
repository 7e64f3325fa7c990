//! Tile server access.
//!
//! This module provides the [`TileFetcher`] abstraction used by the stitcher
//! and its HTTP implementation, [`TemplateProvider`], which addresses any XYZ
//! tile server through a URL template.
//!
//! ```ignore
//! use orthoscan::provider::{ReqwestClient, TemplateProvider, TileUrlTemplate};
//!
//! let http_client = ReqwestClient::with_timeout(10)?;
//! let template = TileUrlTemplate::parse("https://tiles.example/{z}/{x}/{y}.jpg")?;
//! let provider = TemplateProvider::new(http_client, template);
//! ```

mod http;
mod template;
mod types;

pub use http::{HttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use template::{TemplateProvider, TileFetcher, TileUrlTemplate, DEFAULT_TILE_URL};
pub use types::{FetchError, ProviderError};

#[cfg(test)]
pub use http::tests::MockHttpClient;
