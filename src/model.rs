// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ONNX pose model.
//!
//! [`YOLOPoseModel`] wraps an ONNX Runtime session for a YOLO pose export
//! and implements [`PoseOracle`] on top of it.

use std::collections::HashMap;
use std::path::Path;

use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;

use crate::error::{Result, RigError};
use crate::inference::InferenceConfig;
use crate::metadata::{METADATA_KEYS, ModelMetadata};
use crate::oracle::{Detection, PoseOracle};
use crate::postprocessing::postprocess_pose;
use crate::preprocessing::preprocess_frame;

/// YOLO pose model running on ONNX Runtime.
///
/// # Example
///
/// ```no_run
/// use pose_rig::{PoseOracle, YOLOPoseModel};
///
/// let mut model = YOLOPoseModel::load("yolo11n-pose.onnx")?;
/// let frame = image::open("person.jpg")?.to_rgb8();
/// let people = model.detect(&frame)?;
/// println!("Found {} people", people.len());
/// # Ok::<(), pose_rig::RigError>(())
/// ```
pub struct YOLOPoseModel {
    session: Session,
    metadata: ModelMetadata,
    input_name: String,
    output_name: String,
    config: InferenceConfig,
    warmed_up: bool,
}

impl YOLOPoseModel {
    /// Load a pose model with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::ModelLoadError`] if the file is missing, cannot be
    /// loaded, or is not a 17-keypoint pose model.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_config(path, InferenceConfig::default())
    }

    /// Load a pose model with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::ModelLoadError`] if the file is missing, cannot be
    /// loaded, or is not a 17-keypoint pose model.
    pub fn load_with_config<P: AsRef<Path>>(path: P, config: InferenceConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RigError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| RigError::ModelLoadError(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| RigError::ModelLoadError(format!("Failed to set optimization level: {e}")))?
            .with_intra_threads(config.num_threads)
            .map_err(|e| RigError::ModelLoadError(format!("Failed to set intra-thread count: {e}")))?
            .commit_from_file(path)
            .map_err(|e| RigError::ModelLoadError(format!("Failed to load model: {e}")))?;

        let metadata = Self::extract_metadata(&session)?;

        let input_name = session
            .inputs
            .first()
            .map_or_else(|| "images".to_string(), |i| i.name.clone());
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| RigError::ModelLoadError("Model has no outputs".to_string()))?;

        let config = InferenceConfig {
            imgsz: config.imgsz.or(Some(metadata.imgsz)),
            ..config
        };

        Ok(Self {
            session,
            metadata,
            input_name,
            output_name,
            config,
            warmed_up: false,
        })
    }

    fn extract_metadata(session: &Session) -> Result<ModelMetadata> {
        let model_metadata = session
            .metadata()
            .map_err(|e| RigError::ModelLoadError(format!("Failed to get model metadata: {e}")))?;

        let props: HashMap<String, String> = METADATA_KEYS
            .iter()
            .filter_map(|key| match model_metadata.custom(key) {
                Ok(Some(value)) => Some(((*key).to_string(), value)),
                _ => None,
            })
            .collect();

        ModelMetadata::from_properties(&props)
    }

    /// Run one dummy inference so the first real frame is not slowed down.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::InferenceError`] if the session fails.
    pub fn warmup(&mut self) -> Result<()> {
        if self.warmed_up {
            return Ok(());
        }
        let (h, w) = self.input_size();
        let dummy = Array4::<f32>::zeros((1, 3, h, w));
        self.run_inference(&dummy)?;
        self.warmed_up = true;
        Ok(())
    }

    fn run_inference(&mut self, input: &Array4<f32>) -> Result<(Vec<f32>, Vec<usize>)> {
        let input = input.as_standard_layout();
        let tensor = TensorRef::from_array_view(&input)
            .map_err(|e| RigError::InferenceError(format!("Failed to create input tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| RigError::InferenceError(format!("Inference failed: {e}")))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| RigError::InferenceError(format!("Output '{}' not found", self.output_name)))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| RigError::InferenceError(format!("Failed to extract output: {e}")))?;

        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        Ok((data.to_vec(), shape))
    }

    /// Model input size (height, width).
    #[must_use]
    pub fn input_size(&self) -> (usize, usize) {
        self.config.imgsz.unwrap_or(self.metadata.imgsz)
    }

    /// Metadata read from the model.
    #[must_use]
    pub const fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &InferenceConfig {
        &self.config
    }
}

impl PoseOracle for YOLOPoseModel {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>> {
        self.warmup()?;
        let preprocess = preprocess_frame(frame, self.input_size())?;
        let (output, shape) = self.run_inference(&preprocess.tensor)?;
        postprocess_pose(&output, &shape, self.metadata.num_classes(), &preprocess, &self.config)
    }
}

impl std::fmt::Debug for YOLOPoseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YOLOPoseModel")
            .field("imgsz", &self.input_size())
            .field("stride", &self.metadata.stride)
            .field("kpt_shape", &self.metadata.kpt_shape)
            .finish_non_exhaustive()
    }
}
