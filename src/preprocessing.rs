// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Letterbox preprocessing for the pose model.
//!
//! Frames are resized to fit the model input while keeping aspect ratio,
//! centered on a gray canvas, and packed into a normalized NCHW tensor.

use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbImage;
use ndarray::Array4;

use crate::error::{Result, RigError};

/// Fill value of letterbox padding.
pub const PAD_VALUE: u8 = 114;

/// Letterboxed tensor and the transform needed to map detections back.
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    /// Input tensor in NCHW layout, values in `[0, 1]`.
    pub tensor: Array4<f32>,
    /// Source frame dimensions (height, width).
    pub orig_shape: (u32, u32),
    /// Scale factors applied (`scale_y`, `scale_x`).
    pub scale: (f32, f32),
    /// Padding applied (`pad_top`, `pad_left`).
    pub padding: (f32, f32),
}

/// Letterbox geometry for a source size and a target size.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Letterbox {
    new_width: u32,
    new_height: u32,
    pad_left: u32,
    pad_top: u32,
    scale: (f32, f32),
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn letterbox_params(orig_width: u32, orig_height: u32, target_size: (usize, usize)) -> Letterbox {
    let (target_h, target_w) = (target_size.0 as f32, target_size.1 as f32);
    let (orig_h, orig_w) = (orig_height as f32, orig_width as f32);

    let ratio = (target_h / orig_h).min(target_w / orig_w);
    let new_width = ((orig_w * ratio).round() as u32).max(1);
    let new_height = ((orig_h * ratio).round() as u32).max(1);

    let pad_left = (target_size.1 as u32).saturating_sub(new_width) / 2;
    let pad_top = (target_size.0 as u32).saturating_sub(new_height) / 2;

    Letterbox {
        new_width,
        new_height,
        pad_left,
        pad_top,
        scale: (new_height as f32 / orig_h, new_width as f32 / orig_w),
    }
}

/// Letterbox `frame` into a `(1, 3, h, w)` tensor for `target_size` = (h, w).
///
/// # Errors
///
/// Returns [`RigError::InvalidDimensions`] for an empty frame, or
/// [`RigError::ImageError`] if resizing fails.
#[allow(clippy::cast_possible_truncation)]
pub fn preprocess_frame(frame: &RgbImage, target_size: (usize, usize)) -> Result<PreprocessResult> {
    let (orig_width, orig_height) = frame.dimensions();
    if orig_width == 0 || orig_height == 0 {
        return Err(RigError::InvalidDimensions {
            width: orig_width,
            height: orig_height,
        });
    }

    let lb = letterbox_params(orig_width, orig_height, target_size);

    let src = Image::from_vec_u8(orig_width, orig_height, frame.as_raw().clone(), PixelType::U8x3)
        .map_err(|e| RigError::ImageError(format!("Failed to wrap frame: {e}")))?;
    let mut dst = Image::new(lb.new_width, lb.new_height, PixelType::U8x3);
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|e| RigError::ImageError(format!("Failed to resize frame: {e}")))?;

    let (th, tw) = target_size;
    let fill = f32::from(PAD_VALUE) / 255.0;
    let mut tensor = Array4::from_elem((1, 3, th, tw), fill);

    let resized = dst.buffer();
    let (nw, nh) = (lb.new_width as usize, lb.new_height as usize);
    let (left, top) = (lb.pad_left as usize, lb.pad_top as usize);
    for y in 0..nh.min(th.saturating_sub(top)) {
        for x in 0..nw.min(tw.saturating_sub(left)) {
            let i = (y * nw + x) * 3;
            for c in 0..3 {
                tensor[[0, c, top + y, left + x]] = f32::from(resized[i + c]) / 255.0;
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let padding = (lb.pad_top as f32, lb.pad_left as f32);

    Ok(PreprocessResult {
        tensor,
        orig_shape: (orig_height, orig_width),
        scale: lb.scale,
        padding,
    })
}

/// Map a model-space point back to source frame pixels.
#[must_use]
pub fn scale_point(x: f32, y: f32, scale: (f32, f32), padding: (f32, f32)) -> (f32, f32) {
    let (scale_y, scale_x) = scale;
    let (pad_top, pad_left) = padding;
    ((x - pad_left) / scale_x, (y - pad_top) / scale_y)
}

/// Map a model-space box `[x1, y1, x2, y2]` back to source frame pixels.
#[must_use]
pub fn scale_coords(coords: &[f32; 4], scale: (f32, f32), padding: (f32, f32)) -> [f32; 4] {
    let (x1, y1) = scale_point(coords[0], coords[1], scale, padding);
    let (x2, y2) = scale_point(coords[2], coords[3], scale, padding);
    [x1, y1, x2, y2]
}

/// Clip box coordinates to a (height, width) frame.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub const fn clip_coords(coords: &[f32; 4], shape: (u32, u32)) -> [f32; 4] {
    let (h, w) = (shape.0 as f32, shape.1 as f32);
    [
        coords[0].clamp(0.0, w),
        coords[1].clamp(0.0, h),
        coords[2].clamp(0.0, w),
        coords[3].clamp(0.0, h),
    ]
}
