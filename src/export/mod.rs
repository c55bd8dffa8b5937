// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Bone hierarchy export.
//!
//! The exporter turns an [`AnimationSequence`] into a [`SceneGraph`]: a root
//! node plus one bone per keypoint, chained through a [`BoneTopology`]. Each
//! bone gets one translation key per frame, expressed relative to its parent
//! keypoint in the same frame. The scene is then encoded by a [`SceneWriter`]
//! and written to disk.
//!
//! ```no_run
//! use pose_rig::export::{BoneExporter, ExportConfig};
//! use pose_rig::AnimationSequence;
//!
//! # fn main() -> pose_rig::Result<()> {
//! let sequence = AnimationSequence::new();
//! let exporter = BoneExporter::new(ExportConfig::new().with_scale(20000.0));
//! exporter.export(&sequence, "skeleton.glb")?;
//! # Ok(())
//! # }
//! ```

pub mod bvh;
pub mod gltf;
pub mod scene;
pub mod topology;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, RigError};
use crate::keypoints::NUM_KEYPOINTS;
use crate::sequence::{AnimationSequence, DEFAULT_FRAME_RATE};

pub use bvh::BvhWriter;
pub use gltf::GlbWriter;
pub use scene::{AnimCurve, Axis, Keyframe, NodeId, NodeKind, SceneGraph, SceneNode, TranslationCurves};
pub use topology::{BoneTopology, LinearChain};

/// Default multiplier applied to normalized coordinates.
pub const DEFAULT_SCALE: f64 = 20000.0;

/// Name of the exported scene.
pub const SCENE_NAME: &str = "PoseScene";

/// Name of the synthetic skeleton root.
pub const ROOT_NAME: &str = "Root";

/// Encodes a scene graph into file bytes.
pub trait SceneWriter {
    /// Serialize the whole scene.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene cannot be represented in the format.
    fn encode(&self, scene: &SceneGraph) -> Result<Vec<u8>>;
}

/// Interchange formats the exporter can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Binary glTF 2.0.
    Glb,
    /// Biovision hierarchy.
    Bvh,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Glb => "glb",
            Self::Bvh => "bvh",
        }
    }

    /// Pick the format from a path's extension.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::ConfigError`] for a missing or unsupported extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .ok_or_else(|| {
                RigError::ConfigError(format!(
                    "Export path {} has no extension (expected .glb or .bvh)",
                    path.display()
                ))
            })?;
        ext.parse()
    }

    /// Writer for this format.
    #[must_use]
    pub fn writer(&self) -> Box<dyn SceneWriter> {
        match self {
            Self::Glb => Box::new(GlbWriter),
            Self::Bvh => Box::new(BvhWriter),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "glb" => Ok(Self::Glb),
            "bvh" => Ok(Self::Bvh),
            other => Err(RigError::ConfigError(format!(
                "Unsupported export format '{other}' (expected glb or bvh)"
            ))),
        }
    }
}

/// Configuration for the bone exporter.
///
/// # Example
///
/// ```rust
/// use pose_rig::export::{ExportConfig, ExportFormat};
///
/// let config = ExportConfig::new()
///     .with_scale(10.0)
///     .with_format(ExportFormat::Bvh);
/// assert_eq!(config.frame_rate, 30.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Multiplier applied to normalized x and y before computing offsets.
    pub scale: f64,
    /// Frames per second used to place keys in time.
    pub frame_rate: f64,
    /// Output format. `None` picks it from the target path.
    pub format: Option<ExportFormat>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            frame_rate: DEFAULT_FRAME_RATE,
            format: None,
        }
    }
}

impl ExportConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the coordinate scale factor.
    #[must_use]
    pub const fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the animation frame rate.
    #[must_use]
    pub const fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Force an output format.
    #[must_use]
    pub const fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Builds and writes bone animations.
#[derive(Debug, Clone)]
pub struct BoneExporter<T = LinearChain> {
    config: ExportConfig,
    topology: T,
}

impl BoneExporter<LinearChain> {
    /// Exporter using the keypoint-order chain.
    #[must_use]
    pub const fn new(config: ExportConfig) -> Self {
        Self {
            config,
            topology: LinearChain,
        }
    }
}

impl Default for BoneExporter<LinearChain> {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}

impl<T: BoneTopology> BoneExporter<T> {
    /// Exporter with a custom parent lookup.
    #[must_use]
    pub const fn with_topology(config: ExportConfig, topology: T) -> Self {
        Self { config, topology }
    }

    /// Exporter configuration.
    #[must_use]
    pub const fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Build the node and curve graph for `sequence`.
    ///
    /// For frame `f` and joint `i`, with `s = (x * scale, y * scale)`:
    /// a root-attached bone is keyed at `(s.x, -s.y, 0)`, any other bone at
    /// `(s.x - p.x, -(s.y - p.y), 0)` where `p` is the parent keypoint's scaled
    /// position in the same frame. Keys sit at `f / frame_rate` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::EmptySequence`] for a sequence with no frames, or
    /// [`RigError::ConfigError`] for an invalid frame rate or topology.
    pub fn build_scene(&self, sequence: &AnimationSequence) -> Result<SceneGraph> {
        if sequence.is_empty() {
            return Err(RigError::EmptySequence);
        }
        if !(self.config.frame_rate.is_finite() && self.config.frame_rate > 0.0) {
            return Err(RigError::ConfigError(format!(
                "Frame rate must be positive, got {}",
                self.config.frame_rate
            )));
        }

        let parents = topology::resolve_parents(&self.topology, NUM_KEYPOINTS)?;

        let mut scene = SceneGraph::new(SCENE_NAME, self.config.frame_rate, sequence.len());
        let root = scene.add_node(ROOT_NAME, NodeKind::Root, None);
        let mut bones: Vec<NodeId> = Vec::with_capacity(NUM_KEYPOINTS);
        for (joint, parent) in parents.iter().enumerate() {
            let parent_node = parent.map_or(root, |p| bones[p]);
            bones.push(scene.add_node(format!("Bone_{joint}"), NodeKind::Bone { joint }, Some(parent_node)));
        }

        let scale = self.config.scale;
        let times: Vec<f64> = scene.key_times().collect();
        for (frame, time) in sequence.frames().iter().zip(times) {
            let scaled = |i: usize| (f64::from(frame[i].x) * scale, f64::from(frame[i].y) * scale);

            for (joint, parent) in parents.iter().enumerate() {
                let (sx, sy) = scaled(joint);
                let translation = match parent {
                    Some(p) => {
                        let (px, py) = scaled(*p);
                        [sx - px, -(sy - py), 0.0]
                    }
                    None => [sx, -sy, 0.0],
                };
                if let Some(node) = scene.node_mut(bones[joint]) {
                    node.translation.add_key(time, translation);
                }
            }
        }

        Ok(scene)
    }

    /// Build the scene and write it to `path`.
    ///
    /// The file is encoded in memory, written next to the target and renamed
    /// into place, so a failed export leaves nothing at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::EmptySequence`] for an empty sequence,
    /// [`RigError::ConfigError`] for an unknown format, or
    /// [`RigError::ExportIoError`] if the file cannot be written.
    pub fn export<P: AsRef<Path>>(&self, sequence: &AnimationSequence, path: P) -> Result<ExportSummary> {
        let path = path.as_ref();
        let format = match self.config.format {
            Some(f) => f,
            None => ExportFormat::from_path(path)?,
        };

        let scene = self.build_scene(sequence)?;
        let bytes = format.writer().encode(&scene)?;
        write_atomic(path, &bytes)?;

        Ok(ExportSummary {
            path: path.to_path_buf(),
            format,
            frames: scene.frame_count(),
            bones: scene.nodes().len() - 1,
            bytes: bytes.len(),
            duration: sequence.duration(self.config.frame_rate),
        })
    }
}

/// What an export wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Target file.
    pub path: PathBuf,
    /// Format written.
    pub format: ExportFormat,
    /// Keyframes per curve.
    pub frames: usize,
    /// Bone count, root excluded.
    pub bones: usize,
    /// File size in bytes.
    pub bytes: usize,
    /// Time of the last keyframe in seconds.
    pub duration: f64,
}

/// Write to `<path>.part` then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".part");
    let temp = PathBuf::from(temp);

    fs::write(&temp, bytes).map_err(|e| {
        let _ = fs::remove_file(&temp);
        RigError::ExportIoError(format!("Failed to write {}: {e}", path.display()))
    })?;
    fs::rename(&temp, path).map_err(|e| {
        let _ = fs::remove_file(&temp);
        RigError::ExportIoError(format!("Failed to move export into {}: {e}", path.display()))
    })
}
