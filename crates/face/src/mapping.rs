//! Coordinate remapping for detection consumers.
//!
//! Two consuming surfaces use two different vertical-flip conventions, and
//! they are kept as distinct transforms on purpose:
//!
//! - [`to_ui_rect`] targets a center-origin, Y-up display surface: the UI
//!   widget places the box by its center, so `y = (0.5 - cy) * display_h`.
//! - [`to_crop_rect`] targets a bottom-left-origin pixel image: the crop
//!   anchor is the box's bottom edge flipped, `py = round((1 - y2) * src_h)`.
//!
//! Crop rectangles that would leave the image are clamped back inside and
//! never shrink below 1x1; clamping is local recovery, not a fault.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Box placement in display coordinates: center offset from the display
/// midpoint, Y axis pointing up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UiRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Pixel crop rectangle against a bottom-left-origin source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Map a normalized box into UI coordinates for a display of the given
/// pixel dimensions.
///
/// Assumes the display surface has its origin at the center with Y up
/// (widget anchor convention), so a box centered in the model frame lands
/// at `(0, 0)`.
#[must_use]
pub fn to_ui_rect(bbox: &BoundingBox, display_w: f32, display_h: f32) -> UiRect {
    let (cx, cy) = bbox.center();
    UiRect {
        x: (cx - 0.5) * display_w,
        y: (0.5 - cy) * display_h,
        width: bbox.width() * display_w,
        height: bbox.height() * display_h,
    }
}

/// Map a normalized box into a pixel crop rectangle against the source
/// image the frame was captured from.
///
/// Assumes a bottom-left image origin, so the crop anchor row comes from
/// the flipped bottom edge: `py = round((1 - y2) * src_h)`. The rectangle
/// is clamped so it never exceeds the image bounds and always spans at
/// least one pixel in each direction.
#[must_use]
pub fn to_crop_rect(bbox: &BoundingBox, src_w: u32, src_h: u32) -> CropRect {
    let x = (bbox.x1 * src_w as f32)
        .round()
        .clamp(0.0, (src_w - 1) as f32) as u32;
    let y = ((1.0 - bbox.y2) * src_h as f32)
        .round()
        .clamp(0.0, (src_h - 1) as f32) as u32;

    let width = (bbox.width() * src_w as f32).round().max(1.0) as u32;
    let height = (bbox.height() * src_h as f32).round().max(1.0) as u32;

    CropRect {
        x,
        y,
        width: width.min(src_w - x),
        height: height.min(src_h - y),
    }
}
