// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Skeleton connection table for the 17-joint COCO layout.

use crate::keypoints::Joint;

/// Joint pairs drawn as bones, as `(from, to)` keypoint indices.
///
/// Face and limbs only. The torso is closed through shoulders-to-hips, and
/// there is no hip-to-hip or ear-to-shoulder connection.
pub const SKELETON: [(usize, usize); 15] = [
    (0, 1),   // nose to left eye
    (0, 2),   // nose to right eye
    (1, 3),   // left eye to left ear
    (2, 4),   // right eye to right ear
    (5, 6),   // left shoulder to right shoulder
    (5, 7),   // left shoulder to left elbow
    (6, 8),   // right shoulder to right elbow
    (7, 9),   // left elbow to left wrist
    (8, 10),  // right elbow to right wrist
    (5, 11),  // left shoulder to left hip
    (6, 12),  // right shoulder to right hip
    (11, 13), // left hip to left knee
    (12, 14), // right hip to right knee
    (13, 15), // left knee to left ankle
    (14, 16), // right knee to right ankle
];

/// Iterate the connection table as typed joints.
pub fn connections() -> impl Iterator<Item = (Joint, Joint)> {
    SKELETON.iter().filter_map(|&(a, b)| Some((Joint::from_index(a)?, Joint::from_index(b)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::NUM_KEYPOINTS;

    #[test]
    fn test_connections_in_range() {
        assert!(SKELETON.iter().all(|&(a, b)| a < NUM_KEYPOINTS && b < NUM_KEYPOINTS));
        assert_eq!(connections().count(), SKELETON.len());
    }

    #[test]
    fn test_limb_pairs() {
        let pairs: Vec<_> = connections().collect();
        assert!(pairs.contains(&(Joint::LeftKnee, Joint::LeftAnkle)));
        assert!(pairs.contains(&(Joint::RightShoulder, Joint::RightHip)));
        assert!(!pairs.contains(&(Joint::LeftHip, Joint::RightHip)));
    }
}
