//! Pipeline commands: `download`, `detect` and `both`.

use clap::Args;
use tracing::info;

use orthoscan::area::AreaOfInterest;
use orthoscan::config::ConfigFile;
use orthoscan::detect::{
    run_detection_pipeline, BackendError, Credentials, DetectionRequest, DetectionSummary,
    RoboflowBackend,
};
use orthoscan::download::{download_tiles_pipeline, DownloadReport, DownloadRequest};
use orthoscan::progress::LogObserver;
use orthoscan::provider::{ReqwestClient, TemplateProvider, TileUrlTemplate};

use super::common::{
    resolve_detection, resolve_download, resolve_layout, resolve_output_root, DetectOptions,
    DownloadOptions, OutputArgs,
};
use crate::error::CliError;

/// Arguments for `download`.
#[derive(Debug, Clone, Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub download: DownloadOptions,
}

/// Arguments for `detect`.
#[derive(Debug, Clone, Args)]
pub struct DetectArgs {
    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub detect: DetectOptions,
}

/// Arguments for `both`.
#[derive(Debug, Clone, Args)]
pub struct BothArgs {
    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub download: DownloadOptions,

    #[command(flatten)]
    pub detect: DetectOptions,
}

/// Run the download command.
pub fn run_download(args: DownloadArgs, config: &ConfigFile) -> Result<(), CliError> {
    let report = download_stage(&args.output, &args.download, config)?;
    log_download_outcome(&report);
    Ok(())
}

/// Run the detect command.
pub fn run_detect(args: DetectArgs, config: &ConfigFile) -> Result<(), CliError> {
    let layout = resolve_layout(&args.output, config);
    let request = resolve_detection(&args.detect, &layout, config);
    let summary = detect_stage(&request, config.download.timeout, config)?;
    log_detection_outcome(&summary);
    Ok(())
}

/// Run download followed by detection on the same project.
///
/// The download stage always runs. Missing or invalid detection arguments
/// fail only the detection stage, after the composites are on disk.
pub fn run_both(args: BothArgs, config: &ConfigFile) -> Result<(), CliError> {
    let report = download_stage(&args.output, &args.download, config)?;
    log_download_outcome(&report);

    let layout = resolve_layout(&args.output, config);
    let mut request = resolve_detection(&args.detect, &layout, config);
    request.tiles_dir = report.tiles_dir.clone();
    let timeout = resolve_download(&args.download, config).timeout;
    let summary = detect_stage(&request, timeout, config)?;

    info!("PIPELINE COMPLETE");
    info!("Tiles: {}", report.tiles_dir.display());
    info!("Metadata: {}", report.metadata_path.display());
    info!("Detections: {}", summary.detections_dir.display());
    log_detection_outcome(&summary);
    Ok(())
}

fn download_stage(
    output: &OutputArgs,
    options: &DownloadOptions,
    config: &ConfigFile,
) -> Result<DownloadReport, CliError> {
    let settings = resolve_download(options, config);
    let template = TileUrlTemplate::parse(&settings.tile_url)?;
    let area = AreaOfInterest::from_path(&options.geojson)?;

    let request = DownloadRequest {
        area,
        zoom: settings.zoom,
        output_root: resolve_output_root(output, config),
        output_name: output.output_name.clone(),
    };

    let client = ReqwestClient::with_timeout(settings.timeout)?;
    let provider = TemplateProvider::new(client, template);

    Ok(download_tiles_pipeline(&request, &provider, &LogObserver)?)
}

fn detect_stage(
    request: &DetectionRequest,
    timeout: u64,
    config: &ConfigFile,
) -> Result<DetectionSummary, CliError> {
    let api_url = config.detection.api_url.clone();
    let detect_url = config.detection.detect_url.clone();

    let connect = move |credentials: &Credentials| -> Result<_, BackendError> {
        let client = ReqwestClient::with_timeout(timeout).map_err(BackendError::Request)?;
        RoboflowBackend::connect_to(client, credentials, &api_url, &detect_url)
    };

    Ok(run_detection_pipeline(request, connect, &LogObserver)?)
}

fn log_download_outcome(report: &DownloadReport) {
    let summary = &report.summary;
    info!(
        "Download complete: {}/{} composites written to {}",
        summary.succeeded,
        summary.total,
        report.tiles_dir.display()
    );
}

fn log_detection_outcome(summary: &DetectionSummary) {
    info!(
        "Detection complete: {}/{} images processed, {} detection(s)",
        summary.images.succeeded, summary.images.total, summary.total_detections
    );
}
