//! URL-template tile provider.
//!
//! Any XYZ tile server can be addressed through a template containing the
//! `{z}`, `{x}` and `{y}` placeholders, for example Esri World Imagery:
//!
//! `https://services.arcgisonline.com/arcgis/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}`
//!
//! - X: Column (0 to 2^zoom - 1, west to east)
//! - Y: Row (0 to 2^zoom - 1, north to south)
//! - Z: Zoom level

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::{FetchError, HttpClient, ProviderError};
use crate::coord::TileCoord;

/// Esri World Imagery, used when no template is configured.
pub const DEFAULT_TILE_URL: &str =
    "https://services.arcgisonline.com/arcgis/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";

const REQUIRED_PLACEHOLDERS: [&str; 3] = ["z", "x", "y"];

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder regex is valid"))
}

/// A validated tile URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileUrlTemplate(String);

impl TileUrlTemplate {
    /// Parses a template, requiring `{z}`, `{x}` and `{y}` and rejecting any
    /// other placeholder.
    pub fn parse(template: &str) -> Result<Self, ProviderError> {
        let invalid = |reason: String| ProviderError::InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        let found: Vec<&str> = placeholder_pattern()
            .captures_iter(template)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();

        if let Some(unknown) = found.iter().find(|p| !REQUIRED_PLACEHOLDERS.contains(p)) {
            return Err(invalid(format!("unknown placeholder {{{}}}", unknown)));
        }
        for required in REQUIRED_PLACEHOLDERS {
            if !found.contains(&required) {
                return Err(invalid(format!("missing placeholder {{{}}}", required)));
            }
        }

        Ok(Self(template.to_string()))
    }

    /// Substitutes the tile's coordinates into the template.
    pub fn url_for(&self, tile: &TileCoord) -> String {
        self.0
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TileUrlTemplate {
    fn default() -> Self {
        Self(DEFAULT_TILE_URL.to_string())
    }
}

impl fmt::Display for TileUrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of raw tile bytes.
///
/// One attempt per call, no retries and no disk writes. Closures of the form
/// `Fn(TileCoord) -> Result<Vec<u8>, ProviderError>` implement this trait,
/// which is how tests stand in a fake tile server.
pub trait TileFetcher {
    fn fetch(&self, tile: TileCoord) -> Result<Vec<u8>, FetchError>;
}

impl<F> TileFetcher for F
where
    F: Fn(TileCoord) -> Result<Vec<u8>, ProviderError>,
{
    fn fetch(&self, tile: TileCoord) -> Result<Vec<u8>, FetchError> {
        self(tile).map_err(|source| FetchError::new(tile, source))
    }
}

/// Tile provider backed by an HTTP client and a URL template.
///
/// # Example
///
/// ```ignore
/// use orthoscan::provider::{ReqwestClient, TemplateProvider, TileFetcher, TileUrlTemplate};
///
/// let client = ReqwestClient::new()?;
/// let provider = TemplateProvider::new(client, TileUrlTemplate::default());
/// let bytes = provider.fetch(tile)?;
/// ```
pub struct TemplateProvider<C: HttpClient> {
    http_client: C,
    template: TileUrlTemplate,
}

impl<C: HttpClient> TemplateProvider<C> {
    pub fn new(http_client: C, template: TileUrlTemplate) -> Self {
        Self {
            http_client,
            template,
        }
    }

    pub fn template(&self) -> &TileUrlTemplate {
        &self.template
    }
}

impl<C: HttpClient> TileFetcher for TemplateProvider<C> {
    fn fetch(&self, tile: TileCoord) -> Result<Vec<u8>, FetchError> {
        let url = self.template.url_for(&tile);
        self.http_client
            .get(&url)
            .map_err(|source| FetchError::new(tile, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockHttpClient;

    fn sample_jpeg_response() -> Vec<u8> {
        // Minimal valid JPEG header
        vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46]
    }

    fn tile(x: u32, y: u32, zoom: u8) -> TileCoord {
        TileCoord { x, y, zoom }
    }

    #[test]
    fn test_default_template_url() {
        let template = TileUrlTemplate::default();
        assert_eq!(
            template.url_for(&tile(200, 100, 15)),
            "https://services.arcgisonline.com/arcgis/rest/services/World_Imagery/MapServer/tile/15/100/200"
        );
    }

    #[test]
    fn test_placeholders_in_any_order() {
        let template = TileUrlTemplate::parse("https://tiles.example/{x}-{y}@{z}.jpg").unwrap();
        assert_eq!(
            template.url_for(&tile(7, 9, 4)),
            "https://tiles.example/7-9@4.jpg"
        );
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let err = TileUrlTemplate::parse("https://tiles.example/{z}/{x}.png").unwrap_err();
        match err {
            ProviderError::InvalidTemplate { reason, .. } => assert!(reason.contains("{y}")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = TileUrlTemplate::parse("https://{s}.tiles.example/{z}/{x}/{y}.png").unwrap_err();
        match err {
            ProviderError::InvalidTemplate { reason, .. } => assert!(reason.contains("{s}")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fetch_success() {
        let provider = TemplateProvider::new(
            MockHttpClient::new(Ok(sample_jpeg_response())),
            TileUrlTemplate::parse("http://t/{z}/{x}/{y}").unwrap(),
        );

        let bytes = provider.fetch(tile(1, 2, 3)).unwrap();
        assert_eq!(bytes, sample_jpeg_response());
        assert_eq!(provider.http_client.urls(), vec!["http://t/3/1/2".to_string()]);
    }

    #[test]
    fn test_fetch_failure_is_tagged_with_tile() {
        let provider = TemplateProvider::new(
            MockHttpClient::new(Err(ProviderError::HttpStatus {
                status: 503,
                url: "http://t/3/1/2".to_string(),
            })),
            TileUrlTemplate::parse("http://t/{z}/{x}/{y}").unwrap(),
        );

        let err = provider.fetch(tile(1, 2, 3)).unwrap_err();
        assert_eq!(err.tile, tile(1, 2, 3));
        assert!(matches!(err.source, ProviderError::HttpStatus { status: 503, .. }));
        assert_eq!(provider.http_client.urls().len(), 1, "no retry");
    }

    #[test]
    fn test_closure_fetcher() {
        let fetcher = |t: TileCoord| -> Result<Vec<u8>, ProviderError> {
            if t.x == 0 {
                Ok(vec![1])
            } else {
                Err(ProviderError::HttpError("boom".to_string()))
            }
        };

        assert_eq!(fetcher.fetch(tile(0, 0, 1)).unwrap(), vec![1]);
        assert_eq!(fetcher.fetch(tile(1, 0, 1)).unwrap_err().tile, tile(1, 0, 1));
    }
}
