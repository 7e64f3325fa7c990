//! Object detection over stitched composites.
//!
//! Every composite in a tiles directory is decoded, sent to a
//! [`DetectionBackend`], annotated with the returned detections and written
//! under the same filename into a detections directory, so each annotated
//! image traces back to its tile and to its metadata record.
//!
//! The backend is built once per run by an injected `connect` function.
//! Preconditions are checked in order before it is called; after that, a
//! failing image is logged and counted and the run moves on.

mod annotate;
mod backend;
mod error;
mod roboflow;

pub use annotate::{annotate, class_color};
pub use backend::{BoundingBox, Detection, DetectionBackend};
pub use error::{BackendError, DetectError, ProcessError};
pub use roboflow::{RoboflowBackend, ROBOFLOW_API_URL, ROBOFLOW_DETECT_URL};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::naming::is_composite_filename;
use crate::output::write_atomic;
use crate::progress::{is_progress_due, ProgressEvent, ProgressObserver};
use crate::stitch::encode_jpeg;
use crate::summary::{RunSummary, Stage};

/// Default minimum confidence for reported detections.
pub const DEFAULT_CONFIDENCE: f32 = 0.05;

/// Credentials handed to a backend's `connect` function.
#[derive(Clone)]
pub struct Credentials {
    pub model_id: String,
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("model_id", &self.model_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Inputs of one detection run.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub tiles_dir: PathBuf,
    pub detections_dir: PathBuf,
    pub model_id: Option<String>,
    pub api_key: Option<String>,
    pub confidence: f32,
}

impl DetectionRequest {
    /// Checks model, key and threshold, the preconditions that need no
    /// filesystem access.
    pub fn credentials(&self) -> Result<Credentials, DetectError> {
        let model_id = non_empty(&self.model_id).ok_or(DetectError::MissingModelId)?;
        let api_key = non_empty(&self.api_key).ok_or(DetectError::MissingApiKey)?;
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(DetectError::InvalidConfidence(self.confidence));
        }
        Ok(Credentials {
            model_id: model_id.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Outcome of a completed detection run.
#[derive(Debug, Clone)]
pub struct DetectionSummary {
    pub detections_dir: PathBuf,
    pub images: RunSummary,
    /// Detections across all successfully processed images.
    pub total_detections: usize,
}

impl fmt::Display for DetectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; {} detection(s)",
            self.images, self.total_detections
        )
    }
}

/// Runs detection over every composite in `request.tiles_dir`.
///
/// `connect` is called at most once, after all preconditions pass. Its
/// failure aborts the run; failures on individual images do not.
pub fn run_detection_pipeline<B, C, O>(
    request: &DetectionRequest,
    connect: C,
    observer: &O,
) -> Result<DetectionSummary, DetectError>
where
    B: DetectionBackend,
    C: FnOnce(&Credentials) -> Result<B, BackendError>,
    O: ProgressObserver + ?Sized,
{
    info!("OBJECT DETECTION PIPELINE");

    let credentials = request.credentials()?;
    let images = list_composites(&request.tiles_dir)?;

    info!("Connecting to detection model: {}", credentials.model_id);
    let backend = connect(&credentials).map_err(DetectError::Backend)?;

    fs::create_dir_all(&request.detections_dir).map_err(|source| DetectError::CreateDir {
        path: request.detections_dir.clone(),
        source,
    })?;
    info!("Output directory: {}", request.detections_dir.display());
    info!(
        "Processing {} image(s) with {} at confidence {}...",
        images.len(),
        backend.name(),
        request.confidence
    );

    let mut summary = RunSummary::new(Stage::Detection, images.len());
    let mut total_detections = 0;

    for path in &images {
        let filename = file_name(path);
        match process_image(&backend, path, &request.detections_dir, request.confidence) {
            Ok(count) => {
                summary.record_success();
                total_detections += count;
                if count > 0 {
                    observer.on_event(&ProgressEvent::Detections {
                        filename,
                        count,
                        done: summary.attempted,
                        total: summary.total,
                    });
                }
            }
            Err(e) => {
                warn!(image = %filename, error = %e, "Image failed");
                summary.record_failure();
            }
        }

        if is_progress_due(summary.attempted, summary.total) {
            observer.on_event(&ProgressEvent::Progress {
                stage: Stage::Detection,
                done: summary.attempted,
                total: summary.total,
                percent: summary.progress_percent(),
            });
        }
    }

    let result = DetectionSummary {
        detections_dir: request.detections_dir.clone(),
        images: summary,
        total_detections,
    };

    if result.images.has_failures() {
        warn!("{}", result);
    } else {
        info!("{}", result);
    }
    info!(
        "Saved annotated images to: {}",
        request.detections_dir.display()
    );

    Ok(result)
}

/// Composite images in `dir`, sorted by filename.
fn list_composites(dir: &Path) -> Result<Vec<PathBuf>, DetectError> {
    if !dir.is_dir() {
        return Err(DetectError::TilesDirMissing(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|source| DetectError::ReadTilesDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DetectError::ReadTilesDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_composite_filename);
        if is_file && matches {
            images.push(path);
        } else {
            debug!(path = %path.display(), "Skipping non-composite entry");
        }
    }

    if images.is_empty() {
        return Err(DetectError::NoImages(dir.to_path_buf()));
    }
    images.sort();
    Ok(images)
}

/// Detects, annotates and writes one image. Returns the detection count.
fn process_image<B: DetectionBackend>(
    backend: &B,
    path: &Path,
    detections_dir: &Path,
    confidence: f32,
) -> Result<usize, ProcessError> {
    let image = image::open(path).map_err(ProcessError::Read)?.to_rgb8();
    let detections = backend
        .infer(&image, confidence)
        .map_err(ProcessError::Infer)?;

    let annotated = annotate(&image, &detections);
    let encoded = encode_jpeg(&annotated).map_err(ProcessError::Encode)?;

    let out = detections_dir.join(file_name(path));
    write_atomic(&out, &encoded).map_err(|source| ProcessError::Write {
        path: out.clone(),
        source,
    })?;

    debug!(image = %out.display(), count = detections.len(), "Annotated image written");
    Ok(detections.len())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
