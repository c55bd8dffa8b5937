// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The pose detector seam.
//!
//! The pipeline only needs "give me the people in this frame"; anything that
//! can answer that (the ONNX model, a replayed recording, a test double)
//! implements [`PoseOracle`].

use image::RgbImage;

use crate::error::Result;
use crate::keypoints::FrameKeypoints;

/// One detected person, in source frame pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box `[x1, y1, x2, y2]`.
    pub bbox: [f32; 4],
    /// Box confidence.
    pub confidence: f32,
    /// Pixel-space keypoints, when the detector produced them.
    pub keypoints: Option<FrameKeypoints>,
}

impl Detection {
    /// Detection with keypoints attached.
    #[must_use]
    pub const fn with_keypoints(bbox: [f32; 4], confidence: f32, keypoints: FrameKeypoints) -> Self {
        Self {
            bbox,
            confidence,
            keypoints: Some(keypoints),
        }
    }
}

/// Detects people and their keypoints in RGB frames.
pub trait PoseOracle {
    /// Detections ordered from most to least confident.
    ///
    /// # Errors
    ///
    /// Returns an error if detection fails for this frame.
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>>;
}

impl<O: PoseOracle + ?Sized> PoseOracle for &mut O {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>> {
        (**self).detect(frame)
    }
}

impl<O: PoseOracle + ?Sized> PoseOracle for Box<O> {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>> {
        (**self).detect(frame)
    }
}

/// First detection that carries keypoints.
#[must_use]
pub fn first_person(detections: &[Detection]) -> Option<&FrameKeypoints> {
    detections.iter().find_map(|d| d.keypoints.as_ref())
}
