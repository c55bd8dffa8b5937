// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Append-only sequence of per-frame poses.

use crate::keypoints::FrameKeypoints;

/// Frame rate that maps frame numbers to animation time.
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Normalized keypoint sets, one per frame that produced a pose.
///
/// Frames are only ever appended; the exporter consumes the whole sequence
/// once the video is exhausted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationSequence {
    frames: Vec<FrameKeypoints>,
}

impl AnimationSequence {
    /// Create an empty sequence.
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Append the next frame.
    pub fn push(&mut self, keypoints: FrameKeypoints) {
        self.frames.push(keypoints);
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames in order.
    #[must_use]
    pub fn frames(&self) -> &[FrameKeypoints] {
        &self.frames
    }

    /// Duration in seconds at `frame_rate`, measured to the last keyframe.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self, frame_rate: f64) -> f64 {
        self.frames.len().saturating_sub(1) as f64 / frame_rate
    }
}

impl From<Vec<FrameKeypoints>> for AnimationSequence {
    fn from(frames: Vec<FrameKeypoints>) -> Self {
        Self { frames }
    }
}

impl FromIterator<FrameKeypoints> for AnimationSequence {
    fn from_iter<I: IntoIterator<Item = FrameKeypoints>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AnimationSequence {
    type Item = &'a FrameKeypoints;
    type IntoIter = std::slice::Iter<'a, FrameKeypoints>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::Keypoint;

    #[test]
    fn test_push_preserves_order() {
        let mut seq = AnimationSequence::new();
        assert!(seq.is_empty());
        for i in 0..3 {
            seq.push(FrameKeypoints::splat(Keypoint::new(i as f32, 0.0, 1.0)));
        }
        assert_eq!(seq.len(), 3);
        let xs: Vec<f32> = seq.frames().iter().map(|f| f[0].x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_duration() {
        let seq: AnimationSequence = (0..31).map(|_| FrameKeypoints::default()).collect();
        assert!((seq.duration(DEFAULT_FRAME_RATE) - 1.0).abs() < 1e-12);
        assert!(AnimationSequence::new().duration(DEFAULT_FRAME_RATE).abs() < f64::EPSILON);
    }
}
