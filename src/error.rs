// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the pose rig library.

use std::fmt;

/// Result type alias for pose rig operations.
pub type Result<T> = std::result::Result<T, RigError>;

/// Main error type for the pose rig library.
#[derive(Debug)]
pub enum RigError {
    /// Error loading the ONNX pose model.
    ModelLoadError(String),
    /// Error during model inference.
    InferenceError(String),
    /// Error processing images.
    ImageError(String),
    /// Invalid configuration provided.
    ConfigError(String),
    /// IO error (file not found, permission denied, etc.).
    IoError(String),
    /// Wrapped `std::io::Error`
    Io(std::io::Error),
    /// Visualizer error.
    VisualizerError(String),
    /// Video decoding or encoding error.
    VideoError(String),
    /// Feature not enabled.
    FeatureNotEnabled(String),
    /// The renderer was handed a canvas with no pixels.
    UnsetCanvas,
    /// The exporter was handed an animation sequence with no frames.
    EmptySequence,
    /// The export target could not be written.
    ExportIoError(String),
    /// Frame dimensions that cannot be used for normalization.
    InvalidDimensions {
        /// Frame width in pixels.
        width: u32,
        /// Frame height in pixels.
        height: u32,
    },
    /// A keypoint set did not have the expected number of joints.
    KeypointCount {
        /// Expected joint count.
        expected: usize,
        /// Joint count received.
        found: usize,
    },
}

impl fmt::Display for RigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoadError(msg) => write!(f, "Model load error: {msg}"),
            Self::InferenceError(msg) => write!(f, "Inference error: {msg}"),
            Self::ImageError(msg) => write!(f, "Image error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::VisualizerError(msg) => write!(f, "Visualizer error: {msg}"),
            Self::VideoError(msg) => write!(f, "Video error: {msg}"),
            Self::FeatureNotEnabled(msg) => write!(f, "Feature not enabled: {msg}"),
            Self::UnsetCanvas => write!(f, "Unset canvas: nothing to draw the skeleton on"),
            Self::EmptySequence => write!(f, "Empty sequence: no frames to export"),
            Self::ExportIoError(msg) => write!(f, "Export IO error: {msg}"),
            Self::InvalidDimensions { width, height } => {
                write!(f, "Invalid frame dimensions {width}x{height}")
            }
            Self::KeypointCount { expected, found } => {
                write!(f, "Expected {expected} keypoints, found {found}")
            }
        }
    }
}

impl std::error::Error for RigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for RigError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageError(err.to_string())
    }
}
