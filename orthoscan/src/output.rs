//! Output directory layout and all-or-nothing file writes.
//!
//! ```text
//! {output_root}/{output_name}/
//!   tiles/
//!     {x}_{y}_{z}.jpg
//!     tile_metadata.geojson
//!   detections/
//!     {x}_{y}_{z}.jpg
//! ```

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory holding composites and their metadata.
pub const TILES_DIR: &str = "tiles";

/// Directory holding annotated detection images.
pub const DETECTIONS_DIR: &str = "detections";

/// Suffix of in-progress files; they are renamed into place once complete.
const PARTIAL_SUFFIX: &str = ".part";

/// Paths of one project's output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(output_root: &Path, output_name: &str) -> Self {
        Self {
            root: output_root.join(output_name),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tiles_dir(&self) -> PathBuf {
        self.root.join(TILES_DIR)
    }

    pub fn detections_dir(&self) -> PathBuf {
        self.root.join(DETECTIONS_DIR)
    }
}

/// Writes `bytes` to `path` so that readers only ever see the complete file.
///
/// The data goes to a sibling `.part` file first and is renamed over `path`
/// afterwards; an existing file at `path` is replaced.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let partial = partial_path(path);

    if let Err(e) = fs::write(&partial, bytes) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    fs::rename(&partial, path).inspect_err(|_| {
        let _ = fs::remove_file(&partial);
    })
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}
