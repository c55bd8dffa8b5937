// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose model metadata.
//!
//! Exported YOLO models carry their configuration as flat `key: value`
//! strings in the ONNX custom metadata. Only the keys that matter for pose
//! decoding are kept.

use std::collections::HashMap;

use crate::error::{Result, RigError};
use crate::keypoints::{KEYPOINT_DIM, NUM_KEYPOINTS};

/// Metadata keys read from the ONNX model.
pub const METADATA_KEYS: [&str; 7] = ["description", "version", "task", "stride", "imgsz", "names", "kpt_shape"];

/// Configuration embedded in a pose model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetadata {
    /// Free-form description.
    pub description: String,
    /// Exporter version.
    pub version: String,
    /// Task name, `pose` for supported models.
    pub task: String,
    /// Model stride.
    pub stride: u32,
    /// Input size (height, width).
    pub imgsz: (usize, usize),
    /// Keypoints per person and values per keypoint.
    pub kpt_shape: (usize, usize),
    /// Class ID to name.
    pub names: HashMap<usize, String>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            version: String::new(),
            task: "pose".to_string(),
            stride: 32,
            imgsz: (640, 640),
            kpt_shape: (NUM_KEYPOINTS, KEYPOINT_DIM),
            names: HashMap::from([(0, "person".to_string())]),
        }
    }
}

impl ModelMetadata {
    /// Build metadata from the custom properties of an ONNX model.
    ///
    /// Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::ModelLoadError`] for malformed values or a model
    /// that is not a 17-keypoint pose model.
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self> {
        let mut metadata = Self::default();

        for (key, raw) in props {
            let value = raw.trim().trim_matches('\'').trim_matches('"');
            match key.as_str() {
                "description" => metadata.description = value.to_string(),
                "version" => metadata.version = value.to_string(),
                "task" => metadata.task = value.to_string(),
                "stride" => {
                    metadata.stride = value
                        .parse()
                        .map_err(|_| RigError::ModelLoadError(format!("Invalid stride value: {value}")))?;
                }
                "imgsz" => metadata.imgsz = parse_pair(key, value)?,
                "kpt_shape" => metadata.kpt_shape = parse_pair(key, value)?,
                "names" => {
                    let names = parse_names(value);
                    if !names.is_empty() {
                        metadata.names = names;
                    }
                }
                _ => {}
            }
        }

        metadata.validate()?;
        Ok(metadata)
    }

    fn validate(&self) -> Result<()> {
        if self.task != "pose" {
            return Err(RigError::ModelLoadError(format!(
                "Expected a pose model, got task '{}'",
                self.task
            )));
        }
        if self.kpt_shape != (NUM_KEYPOINTS, KEYPOINT_DIM) {
            return Err(RigError::ModelLoadError(format!(
                "Expected kpt_shape [{NUM_KEYPOINTS}, {KEYPOINT_DIM}], got [{}, {}]",
                self.kpt_shape.0, self.kpt_shape.1
            )));
        }
        Ok(())
    }

    /// Number of classes.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.names.len().max(1)
    }
}

/// Parse `[a, b]` into a pair.
fn parse_pair(key: &str, value: &str) -> Result<(usize, usize)> {
    let values: Vec<usize> = value
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    match values.as_slice() {
        [a, b, ..] => Ok((*a, *b)),
        [a] => Ok((*a, *a)),
        [] => Err(RigError::ModelLoadError(format!("Invalid {key} value: {value}"))),
    }
}

/// Parse a dict string like `{0: 'person'}`.
fn parse_names(value: &str) -> HashMap<usize, String> {
    value
        .trim_start_matches('{')
        .trim_end_matches('}')
        .split(',')
        .filter_map(|entry| {
            let (id, name) = entry.split_once(':')?;
            let id = id.trim().parse().ok()?;
            Some((id, name.trim().trim_matches('\'').trim_matches('"').to_string()))
        })
        .collect()
}
