// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Keypoint types and resolution normalization.
//!
//! A pose is always 17 COCO keypoints. The index of a keypoint is its joint
//! identity, so [`FrameKeypoints`] is a fixed-size array addressed through
//! [`Joint`] rather than a free-form list.

use std::ops::Index;

use crate::error::{Result, RigError};

/// Number of keypoints in a COCO pose.
pub const NUM_KEYPOINTS: usize = 17;

/// Values per keypoint (x, y, confidence).
pub const KEYPOINT_DIM: usize = 3;

/// A single body-joint detection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    /// Horizontal position (pixels, or `[0, 1]` once normalized).
    pub x: f32,
    /// Vertical position (pixels, or `[0, 1]` once normalized).
    pub y: f32,
    /// Detection confidence.
    pub confidence: f32,
}

impl Keypoint {
    /// Create a new keypoint.
    #[must_use]
    pub const fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// Whether both coordinates are strictly positive.
    ///
    /// This is the gate used for drawing bones.
    #[must_use]
    pub fn has_positive_coords(&self) -> bool {
        self.x > 0.0 && self.y > 0.0
    }
}

impl From<[f32; 3]> for Keypoint {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// COCO body joints, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Joint {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl Joint {
    /// All joints in index order.
    pub const ALL: [Self; NUM_KEYPOINTS] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    /// Position of this joint in a keypoint set.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Joint for a keypoint index, if in range.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Snake-case joint name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

const _: () = assert!(Joint::ALL.len() == NUM_KEYPOINTS);
const _: () = assert!(Joint::RightAnkle.index() == NUM_KEYPOINTS - 1);

/// The 17 keypoints of one pose in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameKeypoints([Keypoint; NUM_KEYPOINTS]);

impl FrameKeypoints {
    /// Wrap a full keypoint array.
    #[must_use]
    pub const fn new(points: [Keypoint; NUM_KEYPOINTS]) -> Self {
        Self(points)
    }

    /// Build from raw `[x, y, conf]` triples.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::KeypointCount`] unless exactly 17 triples are given.
    pub fn from_triples(triples: &[[f32; 3]]) -> Result<Self> {
        if triples.len() != NUM_KEYPOINTS {
            return Err(RigError::KeypointCount {
                expected: NUM_KEYPOINTS,
                found: triples.len(),
            });
        }
        let mut points = [Keypoint::default(); NUM_KEYPOINTS];
        for (slot, triple) in points.iter_mut().zip(triples) {
            *slot = Keypoint::from(*triple);
        }
        Ok(Self(points))
    }

    /// Same keypoint repeated for every joint.
    #[must_use]
    pub const fn splat(point: Keypoint) -> Self {
        Self([point; NUM_KEYPOINTS])
    }

    /// Keypoint of a joint.
    #[must_use]
    pub const fn joint(&self, joint: Joint) -> Keypoint {
        self.0[joint.index()]
    }

    /// All keypoints in joint order.
    #[must_use]
    pub const fn points(&self) -> &[Keypoint; NUM_KEYPOINTS] {
        &self.0
    }

    /// Iterate keypoints in joint order.
    pub fn iter(&self) -> std::slice::Iter<'_, Keypoint> {
        self.0.iter()
    }

    /// Number of keypoints (always 17).
    #[must_use]
    pub const fn len(&self) -> usize {
        NUM_KEYPOINTS
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Convert pixel coordinates into unit-square coordinates.
    ///
    /// `x' = x / width`, `y' = y / height`, confidence untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::InvalidDimensions`] if either dimension is zero.
    pub fn normalize(&self, width: u32, height: u32) -> Result<Self> {
        let (w, h) = check_dimensions(width, height)?;
        Ok(self.map(|k| Keypoint::new(k.x / w, k.y / h, k.confidence)))
    }

    /// Inverse of [`normalize`](Self::normalize).
    ///
    /// # Errors
    ///
    /// Returns [`RigError::InvalidDimensions`] if either dimension is zero.
    pub fn denormalize(&self, width: u32, height: u32) -> Result<Self> {
        let (w, h) = check_dimensions(width, height)?;
        Ok(self.map(|k| Keypoint::new(k.x * w, k.y * h, k.confidence)))
    }

    fn map(&self, f: impl Fn(&Keypoint) -> Keypoint) -> Self {
        let mut out = self.0;
        for (dst, src) in out.iter_mut().zip(&self.0) {
            *dst = f(src);
        }
        Self(out)
    }
}

#[allow(clippy::cast_precision_loss)]
fn check_dimensions(width: u32, height: u32) -> Result<(f32, f32)> {
    if width == 0 || height == 0 {
        return Err(RigError::InvalidDimensions { width, height });
    }
    Ok((width as f32, height as f32))
}

impl Index<Joint> for FrameKeypoints {
    type Output = Keypoint;

    fn index(&self, joint: Joint) -> &Keypoint {
        &self.0[joint.index()]
    }
}

impl Index<usize> for FrameKeypoints {
    type Output = Keypoint;

    fn index(&self, index: usize) -> &Keypoint {
        &self.0[index]
    }
}

impl TryFrom<&[[f32; 3]]> for FrameKeypoints {
    type Error = RigError;

    fn try_from(triples: &[[f32; 3]]) -> Result<Self> {
        Self::from_triples(triples)
    }
}

impl<'a> IntoIterator for &'a FrameKeypoints {
    type Item = &'a Keypoint;
    type IntoIter = std::slice::Iter<'a, Keypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Normalize a pixel-space keypoint set for a frame of the given size.
///
/// # Errors
///
/// Returns [`RigError::InvalidDimensions`] if either dimension is zero.
pub fn normalize_keypoints(keypoints: &FrameKeypoints, width: u32, height: u32) -> Result<FrameKeypoints> {
    keypoints.normalize(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FrameKeypoints {
        let triples: Vec<[f32; 3]> = (0..NUM_KEYPOINTS)
            .map(|i| [10.0 * i as f32 + 3.0, 7.0 * i as f32 + 1.0, 0.05 * i as f32])
            .collect();
        FrameKeypoints::from_triples(&triples).unwrap()
    }

    #[test]
    fn test_normalize_center() {
        let kps = FrameKeypoints::splat(Keypoint::new(960.0, 540.0, 0.9));
        let norm = kps.normalize(1920, 1080).unwrap();
        for k in &norm {
            assert!((k.x - 0.5).abs() < f32::EPSILON);
            assert!((k.y - 0.5).abs() < f32::EPSILON);
            assert_eq!(k.confidence, 0.9);
        }
    }

    #[test]
    fn test_normalize_roundtrip_preserves_confidence() {
        let kps = sample();
        let back = kps.normalize(1280, 720).unwrap().denormalize(1280, 720).unwrap();
        for (a, b) in kps.iter().zip(back.iter()) {
            assert!((a.x - b.x).abs() < 1e-3);
            assert!((a.y - b.y).abs() < 1e-3);
            assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
        }
    }

    #[test]
    fn test_denormalize_then_normalize_is_identity() {
        let unit: Vec<[f32; 3]> = (0..NUM_KEYPOINTS)
            .map(|i| {
                let t = i as f32 / (NUM_KEYPOINTS - 1) as f32;
                [t, 1.0 - t, 0.1 * (i % 10) as f32]
            })
            .collect();
        let kps = FrameKeypoints::from_triples(&unit).unwrap();

        for (w, h) in [(640, 480), (1920, 1080), (7, 3)] {
            let back = kps.denormalize(w, h).unwrap().normalize(w, h).unwrap();
            for (a, b) in kps.iter().zip(back.iter()) {
                assert!((a.x - b.x).abs() < 1e-6);
                assert!((a.y - b.y).abs() < 1e-6);
                assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
            }
        }
    }

    #[test]
    fn test_normalize_rejects_zero_dimensions() {
        let kps = sample();
        assert!(matches!(
            kps.normalize(0, 1080),
            Err(RigError::InvalidDimensions { width: 0, height: 1080 })
        ));
        assert!(kps.normalize(1920, 0).is_err());
    }

    #[test]
    fn test_from_triples_wrong_length() {
        let triples = vec![[1.0, 2.0, 0.5]; 5];
        let err = FrameKeypoints::from_triples(&triples).unwrap_err();
        assert!(matches!(err, RigError::KeypointCount { expected: 17, found: 5 }));
    }

    #[test]
    fn test_joint_index_mapping() {
        for (i, joint) in Joint::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
            assert_eq!(Joint::from_index(i), Some(*joint));
        }
        assert_eq!(Joint::from_index(17), None);
        assert_eq!(Joint::LeftWrist.name(), "left_wrist");

        let kps = sample();
        assert_eq!(kps[Joint::LeftHip], kps[11]);
    }

    #[test]
    fn test_positive_coords() {
        assert!(Keypoint::new(0.4, 0.2, 0.0).has_positive_coords());
        assert!(!Keypoint::new(0.0, 0.2, 0.7).has_positive_coords());
        assert!(!Keypoint::new(0.3, -0.1, 0.7).has_positive_coords());
    }
}
