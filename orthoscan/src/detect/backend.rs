//! Detection backend contract.

use std::fmt;

use image::RgbImage;

use super::error::BackendError;

/// Axis-aligned box in pixel space, corners inclusive of `min`, exclusive of
/// `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    pub fn from_xyxy(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Builds a box from its centre and size, the convention most hosted
    /// detection APIs use.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x_min: cx - width / 2.0,
            y_min: cy - height / 2.0,
            x_max: cx + width / 2.0,
            y_max: cy + height / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x_max - self.x_min).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y_max - self.y_min).max(0.0)
    }

    /// Integer pixel rectangle `(x, y, width, height)` clipped to an image of
    /// the given size, or `None` if nothing of the box is visible.
    pub fn clip(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x_min.floor().max(0.0) as u32;
        let y0 = self.y_min.floor().max(0.0) as u32;
        let x1 = (self.x_max.ceil().max(0.0) as u32).min(image_width);
        let y1 = (self.y_max.ceil().max(0.0) as u32).min(image_height);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0, y0, x1 - x0, y1 - y0))
    }
}

/// One detected object.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub class_id: Option<u32>,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.label, self.confidence)
    }
}

/// An external object-detection service.
///
/// The backend is opaque: the pipeline hands it a decoded image and the
/// confidence threshold and gets back the detections at or above that
/// threshold.
pub trait DetectionBackend {
    /// Short human-readable name for logs.
    fn name(&self) -> &str;

    fn infer(&self, image: &RgbImage, confidence: f32) -> Result<Vec<Detection>, BackendError>;
}

impl<B: DetectionBackend + ?Sized> DetectionBackend for &B {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn infer(&self, image: &RgbImage, confidence: f32) -> Result<Vec<Detection>, BackendError> {
        (**self).infer(image, confidence)
    }
}

impl<B: DetectionBackend + ?Sized> DetectionBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn infer(&self, image: &RgbImage, confidence: f32) -> Result<Vec<Detection>, BackendError> {
        (**self).infer(image, confidence)
    }
}
