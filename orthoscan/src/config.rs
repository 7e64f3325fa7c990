//! INI configuration file.
//!
//! ```ini
//! [download]
//! tile_url = https://services.arcgisonline.com/.../tile/{z}/{y}/{x}
//! zoom = 18
//! timeout = 10
//!
//! [detection]
//! model = my-project/3
//! confidence = 0.05
//! api_url = https://api.roboflow.com
//! detect_url = https://detect.roboflow.com
//!
//! [output]
//! directory = /data/orthoscan
//! ```
//!
//! Every key is optional. The API key is deliberately not a config key.

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::detect::{DEFAULT_CONFIDENCE, ROBOFLOW_API_URL, ROBOFLOW_DETECT_URL};
use crate::provider::{DEFAULT_TILE_URL, DEFAULT_TIMEOUT_SECS};

/// Default zoom level for downloads.
pub const DEFAULT_ZOOM: u8 = 18;

const CONFIG_DIR_NAME: &str = "orthoscan";
const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("Invalid value for [{section}] {key}: '{value}'")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
    },
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    pub tile_url: String,
    pub zoom: u8,
    pub timeout: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            tile_url: DEFAULT_TILE_URL.to_string(),
            zoom: DEFAULT_ZOOM,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `[detection]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSettings {
    pub model: Option<String>,
    pub confidence: f32,
    pub api_url: String,
    pub detect_url: String,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            model: None,
            confidence: DEFAULT_CONFIDENCE,
            api_url: ROBOFLOW_API_URL.to_string(),
            detect_url: ROBOFLOW_DETECT_URL.to_string(),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub directory: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

/// Parsed configuration with defaults filled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub download: DownloadSettings,
    pub detection: DetectionSettings,
    pub output: OutputSettings,
}

/// Default config location, `<config dir>/orthoscan/config.ini`.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl ConfigFile {
    /// Loads the default config file, or defaults if it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        match config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Loads an explicit config file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parses config text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("download")) {
            if let Some(v) = non_empty(section.get("tile_url")) {
                config.download.tile_url = v.to_string();
            }
            if let Some(v) = non_empty(section.get("zoom")) {
                config.download.zoom = parse_value("download", "zoom", v)?;
            }
            if let Some(v) = non_empty(section.get("timeout")) {
                config.download.timeout = parse_value("download", "timeout", v)?;
            }
        }

        if let Some(section) = ini.section(Some("detection")) {
            config.detection.model = non_empty(section.get("model")).map(str::to_string);
            if let Some(v) = non_empty(section.get("confidence")) {
                config.detection.confidence = parse_value("detection", "confidence", v)?;
            }
            if let Some(v) = non_empty(section.get("api_url")) {
                config.detection.api_url = v.to_string();
            }
            if let Some(v) = non_empty(section.get("detect_url")) {
                config.detection.detect_url = v.to_string();
            }
        }

        if let Some(section) = ini.section(Some("output")) {
            if let Some(v) = non_empty(section.get("directory")) {
                config.output.directory = expand_tilde(v);
            }
        }

        Ok(config)
    }

    /// Renders the effective configuration as INI text.
    pub fn to_ini_string(&self) -> io::Result<String> {
        let mut ini = Ini::new();
        ini.with_section(Some("download"))
            .set("tile_url", self.download.tile_url.as_str())
            .set("zoom", self.download.zoom.to_string())
            .set("timeout", self.download.timeout.to_string());
        ini.with_section(Some("detection"))
            .set("model", self.detection.model.clone().unwrap_or_default())
            .set("confidence", self.detection.confidence.to_string())
            .set("api_url", self.detection.api_url.as_str())
            .set("detect_url", self.detection.detect_url.as_str());
        ini.with_section(Some("output"))
            .set("directory", self.output.directory.to_string_lossy());

        let mut buffer = Vec::new();
        ini.write_to(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_value<T: FromStr>(
    section: &'static str,
    key: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        section,
        key,
        value: value.to_string(),
    })
}

fn expand_tilde(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(value)),
        None => PathBuf::from(value),
    }
}
