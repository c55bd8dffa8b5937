// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Box overlap helpers.

use std::cmp::Ordering;

/// `IoU` between two `[x1, y1, x2, y2]` boxes.
#[must_use]
pub fn calculate_iou(box1: &[f32; 4], box2: &[f32; 4]) -> f32 {
    let x1 = box1[0].max(box2[0]);
    let y1 = box1[1].max(box2[1]);
    let x2 = box1[2].min(box2[2]);
    let y2 = box1[3].min(box2[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);

    let area1 = (box1[2] - box1[0]) * (box1[3] - box1[1]);
    let area2 = (box2[2] - box2[0]) * (box2[3] - box2[1]);
    let union = area1 + area2 - intersection;

    if union > 0.0 { intersection / union } else { 0.0 }
}

/// Per-class Non-Maximum Suppression.
///
/// Boxes are `(bbox, score, class_id)`. Returns kept indices ordered by
/// descending score; only boxes of the same class suppress each other.
#[must_use]
pub fn nms_per_class(boxes: &[([f32; 4], f32, usize)], iou_threshold: f32) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..boxes.len()).collect();
    indices.sort_by(|&a, &b| boxes[b].1.partial_cmp(&boxes[a].1).unwrap_or(Ordering::Equal));

    let mut keep = Vec::new();
    let mut suppressed = vec![false; boxes.len()];

    for (pos, &i) in indices.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep.push(i);

        for &j in &indices[pos + 1..] {
            if !suppressed[j] && boxes[j].2 == boxes[i].2 && calculate_iou(&boxes[i].0, &boxes[j].0) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}
