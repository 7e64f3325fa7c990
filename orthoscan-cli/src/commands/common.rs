//! Arguments and settings resolution shared across run commands.
//!
//! Every setting resolves CLI flag first, then config file, then the
//! built-in default.

use std::path::{Path, PathBuf};

use clap::Args;
use orthoscan::config::ConfigFile;
use orthoscan::detect::DetectionRequest;
use orthoscan::output::ProjectLayout;

use crate::error::CliError;

/// Where a run writes its results.
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Project name; results go under <output-dir>/<output-name>/
    #[arg(long)]
    pub output_name: String,

    /// Parent directory for the project (default: config, else current directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// Tile download settings.
#[derive(Debug, Clone, Args)]
pub struct DownloadOptions {
    /// GeoJSON file with the polygons to cover
    #[arg(long)]
    pub geojson: PathBuf,

    /// Tile zoom level, 1-22 [default: 18]
    #[arg(long)]
    pub zoom: Option<u8>,

    /// Tile URL template with {z}, {x} and {y} placeholders
    #[arg(long)]
    pub tile_url: Option<String>,

    /// HTTP timeout in seconds [default: 10]
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Object detection settings.
#[derive(Debug, Clone, Args)]
pub struct DetectOptions {
    /// Detection model identifier, e.g. "my-project/3"
    #[arg(long)]
    pub model: Option<String>,

    /// Detection service API key
    #[arg(long, env = "ORTHOSCAN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Minimum confidence for reported detections, 0.0-1.0 [default: 0.05]
    #[arg(long)]
    pub confidence: Option<f32>,
}

/// Loads the config file named on the command line, or the default one.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Directory that holds project folders.
pub fn resolve_output_root(output: &OutputArgs, config: &ConfigFile) -> PathBuf {
    output
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output.directory.clone())
}

/// Resolves the project layout for a run.
pub fn resolve_layout(output: &OutputArgs, config: &ConfigFile) -> ProjectLayout {
    ProjectLayout::new(&resolve_output_root(output, config), &output.output_name)
}

/// Resolved download settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    pub zoom: u8,
    pub tile_url: String,
    pub timeout: u64,
}

pub fn resolve_download(options: &DownloadOptions, config: &ConfigFile) -> DownloadSettings {
    DownloadSettings {
        zoom: options.zoom.unwrap_or(config.download.zoom),
        tile_url: options
            .tile_url
            .clone()
            .unwrap_or_else(|| config.download.tile_url.clone()),
        timeout: options.timeout.unwrap_or(config.download.timeout),
    }
}

/// Builds the detection request for a project.
pub fn resolve_detection(
    options: &DetectOptions,
    layout: &ProjectLayout,
    config: &ConfigFile,
) -> DetectionRequest {
    DetectionRequest {
        tiles_dir: layout.tiles_dir(),
        detections_dir: layout.detections_dir(),
        model_id: options
            .model
            .clone()
            .or_else(|| config.detection.model.clone()),
        api_key: options.api_key.clone(),
        confidence: options.confidence.unwrap_or(config.detection.confidence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(dir: Option<&str>) -> OutputArgs {
        OutputArgs {
            output_name: "harbour".to_string(),
            output_dir: dir.map(PathBuf::from),
        }
    }

    fn detect(model: Option<&str>, confidence: Option<f32>) -> DetectOptions {
        DetectOptions {
            model: model.map(str::to_string),
            api_key: Some("key".to_string()),
            confidence,
        }
    }

    #[test]
    fn test_layout_prefers_cli_over_config() {
        let mut config = ConfigFile::default();
        config.output.directory = PathBuf::from("/from/config");

        let layout = resolve_layout(&output(Some("/from/cli")), &config);
        assert_eq!(layout.tiles_dir(), PathBuf::from("/from/cli/harbour/tiles"));

        let layout = resolve_layout(&output(None), &config);
        assert_eq!(layout.tiles_dir(), PathBuf::from("/from/config/harbour/tiles"));
    }

    #[test]
    fn test_download_defaults() {
        let options = DownloadOptions {
            geojson: PathBuf::from("area.geojson"),
            zoom: None,
            tile_url: None,
            timeout: None,
        };
        let settings = resolve_download(&options, &ConfigFile::default());
        assert_eq!(settings.zoom, 18);
        assert_eq!(settings.tile_url, orthoscan::provider::DEFAULT_TILE_URL);
        assert_eq!(settings.timeout, 10);
    }

    #[test]
    fn test_download_cli_overrides_config() {
        let mut config = ConfigFile::default();
        config.download.zoom = 15;
        config.download.timeout = 60;
        let options = DownloadOptions {
            geojson: PathBuf::from("area.geojson"),
            zoom: Some(17),
            tile_url: None,
            timeout: None,
        };
        let settings = resolve_download(&options, &config);
        assert_eq!(settings.zoom, 17);
        assert_eq!(settings.timeout, 60);
    }

    #[test]
    fn test_detection_resolution() {
        let mut config = ConfigFile::default();
        config.detection.model = Some("config/1".to_string());
        config.detection.confidence = 0.3;
        let layout = resolve_layout(&output(Some("/out")), &config);

        let request = resolve_detection(&detect(None, None), &layout, &config);
        assert_eq!(request.model_id.as_deref(), Some("config/1"));
        assert_eq!(request.confidence, 0.3);
        assert_eq!(request.tiles_dir, PathBuf::from("/out/harbour/tiles"));
        assert_eq!(
            request.detections_dir,
            PathBuf::from("/out/harbour/detections")
        );

        let request = resolve_detection(&detect(Some("cli/2"), Some(0.6)), &layout, &config);
        assert_eq!(request.model_id.as_deref(), Some("cli/2"));
        assert_eq!(request.confidence, 0.6);
    }
}
