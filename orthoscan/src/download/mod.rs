//! Tile download pipeline.
//!
//! Drives area resolution, tile fetching and stitching over a whole area:
//!
//! ```text
//! AreaOfInterest ──resolve──► tiles ──groups_for──► TileGroups
//!                                                       │
//!                          ┌────────────────────────────┘
//!                          ▼
//!                 Stitcher::stitch (all-or-nothing per group)
//!                    │ ok                    │ err
//!                    ▼                       ▼
//!           MetadataCollection        warn! + failure count
//!                    │
//!                    ▼
//!          tiles/tile_metadata.geojson
//! ```
//!
//! A failed group never stops the run; the summary carries the counts.

mod error;

pub use error::DownloadError;

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{info, warn};

use crate::area::{resolve, AreaOfInterest};
use crate::coord::{CoordError, MAX_ZOOM, MIN_ZOOM};
use crate::metadata::MetadataCollection;
use crate::naming::METADATA_FILENAME;
use crate::output::ProjectLayout;
use crate::progress::{is_progress_due, ProgressEvent, ProgressObserver};
use crate::provider::TileFetcher;
use crate::stitch::{groups_for, Stitcher};
use crate::summary::{RunSummary, Stage};

/// Inputs of one download run.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub area: AreaOfInterest,
    pub zoom: u8,
    pub output_root: PathBuf,
    pub output_name: String,
}

/// Outcome of a completed download run.
#[derive(Debug, Clone)]
pub struct DownloadReport {
    /// Directory holding the composites; returned even if none were written.
    pub tiles_dir: PathBuf,
    /// Location of the metadata collection.
    pub metadata_path: PathBuf,
    pub summary: RunSummary,
}

/// Downloads and stitches every tile group covering the requested area.
///
/// Returns an error only for precondition failures; a run in which every
/// group fails still completes and reports zero successes.
pub fn download_tiles_pipeline<F, O>(
    request: &DownloadRequest,
    fetcher: &F,
    observer: &O,
) -> Result<DownloadReport, DownloadError>
where
    F: TileFetcher + ?Sized,
    O: ProgressObserver + ?Sized,
{
    info!("TILE DOWNLOAD PIPELINE");

    check_zoom(request.zoom)?;
    check_output_name(&request.output_name)?;

    info!("Loaded {} polygon(s)", request.area.len());
    info!("Calculating tiles at zoom level {}...", request.zoom);

    let tiles = resolve(&request.area, request.zoom).map_err(DownloadError::InvalidZoom)?;
    let groups = groups_for(&tiles).map_err(DownloadError::InvalidZoom)?;
    info!(
        "Tiles in area: {}, composites to build: {}",
        tiles.len(),
        groups.len()
    );

    let layout = ProjectLayout::new(&request.output_root, &request.output_name);
    let tiles_dir = layout.tiles_dir();
    fs::create_dir_all(&tiles_dir).map_err(|source| DownloadError::CreateDir {
        path: tiles_dir.clone(),
        source,
    })?;
    info!("Output directory: {}", tiles_dir.display());

    let stitcher = Stitcher::new(&tiles_dir);
    let mut metadata = MetadataCollection::new();
    let mut summary = RunSummary::new(Stage::Download, groups.len());

    info!("Downloading and stitching tiles...");
    for group in &groups {
        match stitcher.stitch(group, fetcher) {
            Ok(composite) => {
                metadata.record(&composite);
                summary.record_success();
            }
            Err(e) => {
                let failed: Vec<String> = e.failed_tiles().iter().map(|t| t.to_string()).collect();
                warn!(
                    group = %group.anchor(),
                    tiles = ?failed,
                    error = %e,
                    "Tile group failed"
                );
                summary.record_failure();
            }
        }

        if is_progress_due(summary.attempted, summary.total) {
            observer.on_event(&ProgressEvent::Progress {
                stage: Stage::Download,
                done: summary.attempted,
                total: summary.total,
                percent: summary.progress_percent(),
            });
        }
    }

    let metadata_path = tiles_dir.join(METADATA_FILENAME);
    metadata
        .write(&metadata_path)
        .map_err(|source| DownloadError::WriteMetadata {
            path: metadata_path.clone(),
            source,
        })?;
    info!(
        "Saved metadata for {} composite(s) to: {}",
        metadata.len(),
        metadata_path.display()
    );

    if summary.has_failures() {
        warn!("{}", summary);
    } else {
        info!("{}", summary);
    }

    Ok(DownloadReport {
        tiles_dir,
        metadata_path,
        summary,
    })
}

fn check_zoom(zoom: u8) -> Result<(), DownloadError> {
    if (MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
        Ok(())
    } else {
        Err(DownloadError::InvalidZoom(CoordError::InvalidZoom(zoom)))
    }
}

fn check_output_name(name: &str) -> Result<(), DownloadError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(DownloadError::InvalidOutputName(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{block_bounds, TileCoord};
    use crate::progress::SilentObserver;
    use crate::provider::ProviderError;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Area covering exactly the `width × height` tiles starting at `origin`.
    fn block_area(origin: TileCoord, width: u32, height: u32) -> AreaOfInterest {
        let b = block_bounds(&origin, width, height);
        let inset = 1e-7;
        let (w, s, e, n) = (b.west + inset, b.south + inset, b.east - inset, b.north - inset);
        let doc = format!(
            r#"{{"type":"Polygon","coordinates":[[[{w},{s}],[{e},{s}],[{e},{n}],[{w},{n}],[{w},{s}]]]}}"#
        );
        AreaOfInterest::from_geojson_str(&doc).unwrap()
    }

    fn request(root: &Path, area: AreaOfInterest, zoom: u8) -> DownloadRequest {
        DownloadRequest {
            area,
            zoom,
            output_root: root.to_path_buf(),
            output_name: "project".to_string(),
        }
    }

    fn failing_fetcher(_: TileCoord) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::HttpError("connection refused".to_string()))
    }

    #[test]
    fn test_all_failures_still_returns_tiles_dir() {
        let dir = TempDir::new().unwrap();
        let area = block_area(TileCoord { x: 40, y: 60, zoom: 8 }, 4, 2);

        let report =
            download_tiles_pipeline(&request(dir.path(), area, 8), &failing_fetcher, &SilentObserver)
                .unwrap();

        assert_eq!(report.tiles_dir, dir.path().join("project").join("tiles"));
        assert!(report.tiles_dir.is_dir());
        assert_eq!(report.summary.succeeded, 0);
        assert_eq!(report.summary.failed, 2);
        assert!(report.metadata_path.is_file());
    }

    #[test]
    fn test_existing_directory_is_reused() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("project").join("tiles")).unwrap();
        let area = block_area(TileCoord { x: 40, y: 60, zoom: 8 }, 2, 2);

        let result =
            download_tiles_pipeline(&request(dir.path(), area, 8), &failing_fetcher, &SilentObserver);
        assert!(result.is_ok());
    }

    #[test]
    fn test_zoom_zero_rejected_before_any_fetch() {
        let dir = TempDir::new().unwrap();
        let area = block_area(TileCoord { x: 0, y: 0, zoom: 1 }, 1, 1);
        let calls = RefCell::new(0);
        let fetcher = |tile: TileCoord| {
            *calls.borrow_mut() += 1;
            failing_fetcher(tile)
        };

        let err = download_tiles_pipeline(&request(dir.path(), area, 0), &fetcher, &SilentObserver)
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidZoom(_)));
        assert_eq!(*calls.borrow(), 0);
        assert!(!dir.path().join("project").exists());
    }

    #[test]
    fn test_output_name_must_be_single_component() {
        let dir = TempDir::new().unwrap();
        for name in ["", "..", "a/b", "/abs"] {
            let area = block_area(TileCoord { x: 40, y: 60, zoom: 8 }, 2, 2);
            let mut req = request(dir.path(), area, 8);
            req.output_name = name.to_string();
            let err = download_tiles_pipeline(&req, &failing_fetcher, &SilentObserver).unwrap_err();
            assert!(matches!(err, DownloadError::InvalidOutputName(_)), "{name}");
        }
    }

    #[test]
    fn test_progress_events_every_five_groups() {
        let dir = TempDir::new().unwrap();
        // 12 × 2 tiles -> 6 groups
        let area = block_area(TileCoord { x: 40, y: 60, zoom: 8 }, 12, 2);
        let events = RefCell::new(Vec::new());
        let observer = |event: &ProgressEvent| events.borrow_mut().push(event.clone());

        download_tiles_pipeline(&request(dir.path(), area, 8), &failing_fetcher, &observer).unwrap();

        let done: Vec<usize> = events
            .borrow()
            .iter()
            .map(|e| match e {
                ProgressEvent::Progress { done, .. } => *done,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(done, vec![5, 6]);
    }
}
