// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Decoding of raw pose model output.
//!
//! YOLO pose heads emit `[1, 4 + nc + 51, N]`: per candidate a `cx, cy, w, h`
//! box, `nc` class scores and 17 `(x, y, conf)` keypoints, all in letterboxed
//! model space. Some exports transpose this to `[1, N, features]`.

use std::cmp::Ordering;

use ndarray::{Array2, ArrayView2, Axis, s};

use crate::error::{Result, RigError};
use crate::inference::InferenceConfig;
use crate::keypoints::{FrameKeypoints, KEYPOINT_DIM, Keypoint, NUM_KEYPOINTS};
use crate::oracle::Detection;
use crate::preprocessing::{PreprocessResult, clip_coords, scale_coords, scale_point};
use crate::utils::nms_per_class;

/// Features per candidate taken by keypoints.
const KPT_FEATURES: usize = NUM_KEYPOINTS * KEYPOINT_DIM;

/// Features per candidate for a head with `num_classes` classes.
const fn feature_count(num_classes: usize) -> usize {
    4 + num_classes + KPT_FEATURES
}

/// Arrange raw output as `[candidates, features]`.
///
/// The feature axis is the one whose length is `features`, axis 1 first.
fn candidate_rows(output: &[f32], shape: &[usize], features: usize) -> Result<Array2<f32>> {
    let (a, b) = match shape {
        [1, a, b] | [a, b] => (*a, *b),
        _ => {
            return Err(RigError::InferenceError(format!(
                "Unexpected pose output shape {shape:?}"
            )));
        }
    };

    let view = ArrayView2::from_shape((a, b), output)
        .map_err(|e| RigError::InferenceError(format!("Pose output does not match its shape: {e}")))?;

    if a == features {
        Ok(view.t().to_owned())
    } else if b == features {
        Ok(view.to_owned())
    } else {
        Err(RigError::InferenceError(format!(
            "Pose output shape {shape:?} has no axis of {features} features"
        )))
    }
}

/// Decode pose output into detections in source frame pixels.
///
/// Candidates below the confidence threshold are dropped, the rest go through
/// per-class NMS, and the survivors are returned by descending score.
///
/// # Errors
///
/// Returns [`RigError::InferenceError`] if the output shape is not a pose
/// head with `num_classes` classes.
pub fn postprocess_pose(
    output: &[f32],
    shape: &[usize],
    num_classes: usize,
    preprocess: &PreprocessResult,
    config: &InferenceConfig,
) -> Result<Vec<Detection>> {
    let rows = candidate_rows(output, shape, feature_count(num_classes))?;
    let (oh, ow) = preprocess.orig_shape;
    #[allow(clippy::cast_precision_loss)]
    let (max_x, max_y) = (ow as f32, oh as f32);

    let mut candidates: Vec<([f32; 4], f32, usize, FrameKeypoints)> = Vec::new();

    for row in rows.axis_iter(Axis(0)) {
        let (class, score) = row
            .slice(s![4..4 + num_classes])
            .iter()
            .copied()
            .enumerate()
            .map(|(i, v)| (i, if v.is_nan() { 0.0 } else { v }))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            .unwrap_or((0, 0.0));

        if score < config.confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        let xyxy = [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0];
        let bbox = clip_coords(&scale_coords(&xyxy, preprocess.scale, preprocess.padding), preprocess.orig_shape);

        let kpt_start = 4 + num_classes;
        let mut points = [Keypoint::default(); NUM_KEYPOINTS];
        for (k, point) in points.iter_mut().enumerate() {
            let offset = kpt_start + k * KEYPOINT_DIM;
            let (x, y) = scale_point(row[offset], row[offset + 1], preprocess.scale, preprocess.padding);
            *point = Keypoint::new(x.clamp(0.0, max_x), y.clamp(0.0, max_y), row[offset + 2]);
        }

        candidates.push((bbox, score, class, FrameKeypoints::new(points)));
    }

    let boxes: Vec<_> = candidates.iter().map(|(b, s, c, _)| (*b, *s, *c)).collect();
    let keep = nms_per_class(&boxes, config.iou_threshold);

    Ok(keep
        .into_iter()
        .take(config.max_detections)
        .map(|i| {
            let (bbox, score, _, kps) = candidates[i];
            Detection::with_keypoints(bbox, score, kps)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURES: usize = feature_count(1);

    fn identity_preprocess() -> PreprocessResult {
        PreprocessResult {
            tensor: ndarray::Array4::zeros((1, 3, 1, 1)),
            orig_shape: (640, 640),
            scale: (1.0, 1.0),
            padding: (0.0, 0.0),
        }
    }

    /// Channel-major output with one filled candidate per `(index, cx, score)`.
    fn mock_output(num_preds: usize, fills: &[(usize, f32, f32)]) -> Vec<f32> {
        let mut output = vec![0.0; num_preds * FEATURES];
        for &(idx, cx, score) in fills {
            output[idx] = cx;
            output[idx + num_preds] = 100.0;
            output[idx + num_preds * 2] = 50.0;
            output[idx + num_preds * 3] = 50.0;
            output[idx + num_preds * 4] = score;
            for k in 0..NUM_KEYPOINTS {
                let offset = 5 + k * 3;
                output[idx + num_preds * offset] = cx;
                output[idx + num_preds * (offset + 1)] = 100.0;
                output[idx + num_preds * (offset + 2)] = 0.8;
            }
        }
        output
    }

    #[test]
    fn test_postprocess_pose_logic() {
        let output = mock_output(100, &[(0, 100.0, 0.9)]);
        let dets = postprocess_pose(&output, &[1, FEATURES, 100], 1, &identity_preprocess(), &InferenceConfig::default())
            .unwrap();

        assert_eq!(dets.len(), 1);
        let kps = dets[0].keypoints.unwrap();
        assert_eq!(kps[0], Keypoint::new(100.0, 100.0, 0.8));
        assert_eq!(dets[0].bbox, [75.0, 75.0, 125.0, 125.0]);
    }

    #[test]
    fn test_confidence_threshold() {
        let output = mock_output(10, &[(0, 100.0, 0.4)]);
        let dets = postprocess_pose(&output, &[1, FEATURES, 10], 1, &identity_preprocess(), &InferenceConfig::default())
            .unwrap();
        assert!(dets.is_empty());
    }

    #[test]
    fn test_sorted_by_score_after_nms() {
        let output = mock_output(10, &[(0, 100.0, 0.6), (1, 102.0, 0.7), (2, 400.0, 0.95)]);
        let dets = postprocess_pose(&output, &[1, FEATURES, 10], 1, &identity_preprocess(), &InferenceConfig::default())
            .unwrap();
        assert_eq!(dets.len(), 2);
        assert!((dets[0].confidence - 0.95).abs() < 1e-6);
        assert!((dets[1].confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_transposed_layout() {
        let channel_major = mock_output(100, &[(3, 200.0, 0.9)]);
        let mut row_major = vec![0.0; channel_major.len()];
        for p in 0..100 {
            for f in 0..FEATURES {
                row_major[p * FEATURES + f] = channel_major[f * 100 + p];
            }
        }
        let dets =
            postprocess_pose(&row_major, &[1, 100, FEATURES], 1, &identity_preprocess(), &InferenceConfig::default())
                .unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].keypoints.unwrap()[5].x, 200.0);
    }

    #[test]
    fn test_fewer_candidates_than_features() {
        let output = mock_output(21, &[(4, 150.0, 0.9)]);
        let dets = postprocess_pose(&output, &[1, FEATURES, 21], 1, &identity_preprocess(), &InferenceConfig::default())
            .unwrap();
        assert_eq!(dets.len(), 1);
        assert!((dets[0].confidence - 0.9).abs() < 1e-6);
        assert_eq!(dets[0].keypoints.unwrap()[0].x, 150.0);
    }

    #[test]
    fn test_square_output_prefers_channel_major() {
        let output = mock_output(FEATURES, &[(7, 300.0, 0.8)]);
        let dets = postprocess_pose(
            &output,
            &[1, FEATURES, FEATURES],
            1,
            &identity_preprocess(),
            &InferenceConfig::default(),
        )
        .unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bbox, [275.0, 75.0, 325.0, 125.0]);
    }

    #[test]
    fn test_class_count_sets_feature_axis() {
        let output = mock_output(10, &[]);
        let err = postprocess_pose(&output, &[1, FEATURES, 10], 2, &identity_preprocess(), &InferenceConfig::default())
            .unwrap_err();
        assert!(matches!(err, RigError::InferenceError(_)));
    }

    #[test]
    fn test_rejects_non_pose_shape() {
        let output = vec![0.0; 84 * 10];
        let err = postprocess_pose(&output, &[1, 84, 10], 1, &identity_preprocess(), &InferenceConfig::default())
            .unwrap_err();
        assert!(matches!(err, RigError::InferenceError(_)));
    }
}
