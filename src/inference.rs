// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose model configuration.

/// Default detection confidence threshold.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Configuration for pose inference.
///
/// # Example
///
/// ```rust
/// use pose_rig::InferenceConfig;
///
/// let config = InferenceConfig::new()
///     .with_confidence(0.6)
///     .with_iou(0.45)
///     .with_imgsz(640, 640);
/// assert_eq!(config.max_detections, 300);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceConfig {
    /// Minimum person score (0.0 to 1.0).
    pub confidence_threshold: f32,
    /// `IoU` threshold for Non-Maximum Suppression.
    pub iou_threshold: f32,
    /// Maximum number of people returned per frame.
    pub max_detections: usize,
    /// Input size (height, width). `None` uses the model metadata.
    pub imgsz: Option<(usize, usize)>,
    /// Intra-op threads for ONNX Runtime. `0` lets the runtime decide.
    pub num_threads: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE,
            iou_threshold: 0.45,
            max_detections: 300,
            imgsz: None,
            num_threads: 0,
        }
    }
}

impl InferenceConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence threshold.
    #[must_use]
    pub const fn with_confidence(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the NMS `IoU` threshold.
    #[must_use]
    pub const fn with_iou(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    /// Set the maximum number of detections.
    #[must_use]
    pub const fn with_max_detections(mut self, max: usize) -> Self {
        self.max_detections = max;
        self
    }

    /// Set the input size.
    #[must_use]
    pub const fn with_imgsz(mut self, height: usize, width: usize) -> Self {
        self.imgsz = Some((height, width));
        self
    }

    /// Set the number of inference threads.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }
}
