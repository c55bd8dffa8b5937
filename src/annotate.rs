// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Skeleton rendering onto RGB canvases.
//!
//! Drawing is additive: [`draw_skeleton`] never clears or allocates the canvas,
//! so the same routine serves the overlay stream (drawn on the source frame)
//! and the skeleton-only stream (drawn on a [`blank_canvas`]).

use image::RgbImage;
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::error::{Result, RigError};
use crate::keypoints::{FrameKeypoints, Keypoint};
use crate::visualizer::Color;
use crate::visualizer::skeleton::connections;

/// How joints and bones are drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderStyle {
    /// Radius of the joint markers in pixels.
    pub marker_radius: i32,
    /// Joint marker color.
    pub marker_color: Color,
    /// Bone line color.
    pub line_color: Color,
    /// Bone line thickness in pixels.
    pub line_thickness: u32,
    /// Fill color of skeleton-only canvases.
    pub background: Color,
    /// Skip markers of joints with non-positive confidence.
    ///
    /// Off by default: every marker is drawn, whatever its confidence.
    pub gate_markers_on_confidence: bool,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            marker_radius: 5,
            marker_color: Color::GREEN,
            line_color: Color::BLUE,
            line_thickness: 2,
            background: Color::WHITE,
            gate_markers_on_confidence: false,
        }
    }
}

impl RenderStyle {
    /// Create the default style.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the joint marker radius.
    #[must_use]
    pub const fn with_marker_radius(mut self, radius: i32) -> Self {
        self.marker_radius = radius;
        self
    }

    /// Set the bone line thickness.
    #[must_use]
    pub const fn with_line_thickness(mut self, thickness: u32) -> Self {
        self.line_thickness = thickness;
        self
    }

    /// Set the skeleton-only background color.
    #[must_use]
    pub const fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Only draw markers for joints with positive confidence.
    #[must_use]
    pub const fn with_marker_confidence_gate(mut self, gate: bool) -> Self {
        self.gate_markers_on_confidence = gate;
        self
    }
}

/// Allocate a canvas filled with the style's background color.
#[must_use]
pub fn blank_canvas(width: u32, height: u32, style: &RenderStyle) -> RgbImage {
    RgbImage::from_pixel(width, height, style.background.to_rgb())
}

/// Pixel position of a normalized keypoint on a `width` x `height` canvas.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn to_pixel(k: &Keypoint, width: u32, height: u32) -> (i32, i32) {
    ((k.x * width as f32) as i32, (k.y * height as f32) as i32)
}

/// Draw the skeleton of one normalized keypoint set onto `canvas`.
///
/// Markers are drawn for all 17 joints (unless the style gates them on
/// confidence). A bone is drawn only when both of its joints have strictly
/// positive `x` and `y`; confidence plays no part in that test.
///
/// # Errors
///
/// Returns [`RigError::UnsetCanvas`] if the canvas has no pixels.
pub fn draw_skeleton(canvas: &mut RgbImage, keypoints: &FrameKeypoints, style: &RenderStyle) -> Result<()> {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return Err(RigError::UnsetCanvas);
    }

    let marker = style.marker_color.to_rgb();
    for k in keypoints {
        if style.gate_markers_on_confidence && k.confidence <= 0.0 {
            continue;
        }
        draw_filled_circle_mut(canvas, to_pixel(k, width, height), style.marker_radius, marker);
    }

    let line = style.line_color.to_rgb();
    for (j1, j2) in connections() {
        let (a, b) = (keypoints[j1], keypoints[j2]);
        if a.has_positive_coords() && b.has_positive_coords() {
            draw_thick_line(
                canvas,
                to_pixel(&a, width, height),
                to_pixel(&b, width, height),
                style.line_thickness,
                line,
            );
        }
    }

    Ok(())
}

/// Draw the skeleton over a copy of `frame`.
///
/// # Errors
///
/// Returns [`RigError::UnsetCanvas`] if the frame has no pixels.
pub fn render_overlay(frame: &RgbImage, keypoints: &FrameKeypoints, style: &RenderStyle) -> Result<RgbImage> {
    let mut canvas = frame.clone();
    draw_skeleton(&mut canvas, keypoints, style)?;
    Ok(canvas)
}

/// Draw the skeleton on a fresh background canvas.
///
/// # Errors
///
/// Returns [`RigError::UnsetCanvas`] if either dimension is zero.
pub fn render_skeleton_only(
    width: u32,
    height: u32,
    keypoints: &FrameKeypoints,
    style: &RenderStyle,
) -> Result<RgbImage> {
    let mut canvas = blank_canvas(width, height, style);
    draw_skeleton(&mut canvas, keypoints, style)?;
    Ok(canvas)
}

/// Line of `thickness` pixels made of parallel one-pixel segments.
#[allow(clippy::cast_precision_loss)]
fn draw_thick_line(
    canvas: &mut RgbImage,
    start: (i32, i32),
    end: (i32, i32),
    thickness: u32,
    color: image::Rgb<u8>,
) {
    let (x0, y0) = (start.0 as f32, start.1 as f32);
    let (x1, y1) = (end.0 as f32, end.1 as f32);

    let (dx, dy) = (x1 - x0, y1 - y0);
    let len = dx.hypot(dy);
    if thickness <= 1 || len == 0.0 {
        draw_line_segment_mut(canvas, (x0, y0), (x1, y1), color);
        return;
    }

    // unit normal
    let (nx, ny) = (-dy / len, dx / len);
    let half = (thickness - 1) as f32 / 2.0;
    for i in 0..thickness {
        let offset = i as f32 - half;
        draw_line_segment_mut(
            canvas,
            (x0 + nx * offset, y0 + ny * offset),
            (x1 + nx * offset, y1 + ny * offset),
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::Joint;

    fn keypoints_with(points: &[(Joint, Keypoint)]) -> FrameKeypoints {
        let mut triples = [[0.0_f32, 0.0, 0.9]; 17];
        for (joint, k) in points {
            triples[joint.index()] = [k.x, k.y, k.confidence];
        }
        FrameKeypoints::from_triples(&triples).unwrap()
    }

    fn column_has_color(canvas: &RgbImage, x: u32, rows: std::ops::RangeInclusive<u32>, color: Color) -> bool {
        rows.into_iter().any(|y| *canvas.get_pixel(x, y) == color.to_rgb())
    }

    #[test]
    fn test_unset_canvas() {
        let mut canvas = RgbImage::new(0, 0);
        let kps = FrameKeypoints::default();
        let err = draw_skeleton(&mut canvas, &kps, &RenderStyle::default()).unwrap_err();
        assert!(matches!(err, RigError::UnsetCanvas));
    }

    #[test]
    fn test_line_drawn_between_visible_joints() {
        let style = RenderStyle::default();
        let kps = keypoints_with(&[
            (Joint::Nose, Keypoint::new(0.2, 0.5, 0.9)),
            (Joint::LeftEye, Keypoint::new(0.8, 0.5, 0.9)),
        ]);
        let canvas = render_skeleton_only(100, 100, &kps, &style).unwrap();
        assert!(column_has_color(&canvas, 50, 48..=52, style.line_color));
    }

    #[test]
    fn test_no_line_when_joint_at_origin() {
        let style = RenderStyle::default();
        // nose stays at (0, 0) with high confidence
        let kps = keypoints_with(&[(Joint::LeftEye, Keypoint::new(0.5, 0.5, 0.9))]);
        let canvas = render_skeleton_only(100, 100, &kps, &style).unwrap();
        assert_eq!(*canvas.get_pixel(25, 25), style.background.to_rgb());
        assert!(!column_has_color(&canvas, 25, 0..=99, style.line_color));
    }

    #[test]
    fn test_line_ignores_confidence() {
        let style = RenderStyle::default();
        let kps = keypoints_with(&[
            (Joint::Nose, Keypoint::new(0.2, 0.5, 0.0)),
            (Joint::LeftEye, Keypoint::new(0.8, 0.5, 0.0)),
        ]);
        let canvas = render_skeleton_only(100, 100, &kps, &style).unwrap();
        assert!(column_has_color(&canvas, 50, 48..=52, style.line_color));
    }

    #[test]
    fn test_markers_drawn_unconditionally() {
        let style = RenderStyle::default();
        let kps = keypoints_with(&[(Joint::RightAnkle, Keypoint::new(0.5, 0.5, 0.0))]);
        let canvas = render_skeleton_only(100, 100, &kps, &style).unwrap();
        assert_eq!(*canvas.get_pixel(50, 50), style.marker_color.to_rgb());
    }

    #[test]
    fn test_marker_confidence_gate() {
        let style = RenderStyle::default().with_marker_confidence_gate(true);
        let kps = keypoints_with(&[(Joint::RightAnkle, Keypoint::new(0.5, 0.5, 0.0))]);
        let canvas = render_skeleton_only(100, 100, &kps, &style).unwrap();
        assert_eq!(*canvas.get_pixel(50, 50), style.background.to_rgb());
    }

    #[test]
    fn test_overlay_keeps_source_pixels() {
        let style = RenderStyle::default();
        let frame = RgbImage::from_pixel(64, 48, image::Rgb([10, 20, 30]));
        let kps = keypoints_with(&[(Joint::Nose, Keypoint::new(0.5, 0.5, 0.9))]);
        let out = render_overlay(&frame, &kps, &style).unwrap();
        assert_eq!(out.dimensions(), (64, 48));
        assert_eq!(*out.get_pixel(60, 10), image::Rgb([10, 20, 30]));
        assert_eq!(*out.get_pixel(32, 24), style.marker_color.to_rgb());
        // source untouched
        assert_eq!(*frame.get_pixel(32, 24), image::Rgb([10, 20, 30]));
    }
}
