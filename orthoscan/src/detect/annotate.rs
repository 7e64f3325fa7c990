//! Detection overlays.
//!
//! Each detection is drawn as a hollow box with a filled label tag above it
//! carrying the class name and confidence. Colours are picked per class so
//! the same class keeps the same colour across images.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use super::backend::Detection;

/// Box outline thickness in pixels.
const BOX_THICKNESS: u32 = 2;

const GLYPH_SIZE: u32 = 8;
const LABEL_PADDING: u32 = 2;
const LABEL_HEIGHT: u32 = GLYPH_SIZE + 2 * LABEL_PADDING;

const PALETTE: [[u8; 3]; 10] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [207, 210, 49],
    [72, 249, 10],
    [26, 147, 52],
    [0, 212, 187],
    [44, 153, 168],
    [0, 194, 255],
];

/// Colour for a detection: by class id when known, otherwise by label.
pub fn class_color(detection: &Detection) -> Rgb<u8> {
    let index = match detection.class_id {
        Some(id) => id as usize,
        None => detection
            .label
            .bytes()
            .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize)),
    };
    Rgb(PALETTE[index % PALETTE.len()])
}

/// Returns a copy of `image` with every detection drawn on it.
pub fn annotate(image: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut canvas = image.clone();
    for detection in detections {
        draw_detection(&mut canvas, detection);
    }
    canvas
}

fn draw_detection(canvas: &mut RgbImage, detection: &Detection) {
    let (width, height) = canvas.dimensions();
    let Some((x, y, w, h)) = detection.bbox.clip(width, height) else {
        return;
    };
    let color = class_color(detection);

    for inset in 0..BOX_THICKNESS {
        if w <= 2 * inset || h <= 2 * inset {
            break;
        }
        let rect = Rect::at((x + inset) as i32, (y + inset) as i32)
            .of_size(w - 2 * inset, h - 2 * inset);
        draw_hollow_rect_mut(canvas, rect, color);
    }

    draw_label(canvas, &detection.to_string(), x, y, color);
}

/// Draws a filled tag with `text` above the box at `(x, y)`, or just inside
/// it when there is no room above.
fn draw_label(canvas: &mut RgbImage, text: &str, x: u32, y: u32, color: Rgb<u8>) {
    let (width, height) = canvas.dimensions();
    let chars = text.chars().count() as u32;
    let tag_width = (chars * GLYPH_SIZE + 2 * LABEL_PADDING).min(width - x);
    let tag_y = if y >= LABEL_HEIGHT { y - LABEL_HEIGHT } else { y };
    let tag_height = LABEL_HEIGHT.min(height - tag_y);
    if tag_width == 0 || tag_height == 0 {
        return;
    }

    draw_filled_rect_mut(
        canvas,
        Rect::at(x as i32, tag_y as i32).of_size(tag_width, tag_height),
        color,
    );

    let ink = text_color(color);
    let mut pen_x = x + LABEL_PADDING;
    for ch in text.chars() {
        draw_glyph(canvas, ch, pen_x, tag_y + LABEL_PADDING, ink);
        pen_x += GLYPH_SIZE;
    }
}

fn draw_glyph(canvas: &mut RgbImage, ch: char, x: u32, y: u32, ink: Rgb<u8>) {
    let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
        return;
    };
    let (width, height) = canvas.dimensions();

    for (row, bits) in glyph.iter().enumerate() {
        let py = y + row as u32;
        if py >= height {
            break;
        }
        for col in 0..GLYPH_SIZE {
            let px = x + col;
            if px >= width {
                break;
            }
            // Least significant bit is the leftmost pixel.
            if bits & (1 << col) != 0 {
                canvas.put_pixel(px, py, ink);
            }
        }
    }
}

/// Black or white, whichever reads better on `background`.
fn text_color(background: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = background.0;
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma > 140.0 {
        Rgb([0, 0, 0])
    } else {
        Rgb([255, 255, 255])
    }
}
