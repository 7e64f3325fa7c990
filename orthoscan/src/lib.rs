//! Orthoscan - satellite imagery download and object detection
//!
//! This library turns a GeoJSON area of interest into 512×512 composites of
//! Web Mercator tiles plus a GeoJSON footprint index, then runs an object
//! detection model over those composites and writes annotated copies.
//!
//! # Pipeline
//!
//! ```text
//! area ──► coord ──► stitch ◄── provider
//!                      │
//!                      ▼
//!              download (composites + metadata)
//!                      │
//!                      ▼
//!               detect ◄── backend (Roboflow)
//! ```
//!
//! Both stages are single-threaded and blocking. A failing unit (tile group
//! or image) is logged and counted; only precondition failures abort a run.

pub mod area;
pub mod config;
pub mod coord;
pub mod detect;
pub mod download;
pub mod logging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod progress;
pub mod provider;
pub mod stitch;
pub mod summary;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
