// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Pose Rig
//!
//! Runs a YOLO pose model over a video, draws the detected skeleton and
//! exports the joint trajectories as a bone-hierarchy animation.
//!
//! For every frame the first detected person's 17 COCO keypoints are
//! normalized to `[0, 1]`, drawn over the source frame and on a blank canvas,
//! and appended to an [`AnimationSequence`]. When the video ends (or the
//! preview window is closed) the sequence is written once as a binary glTF
//! (`.glb`) or BVH (`.bvh`) scene.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pose_rig::{MemorySink, Outputs, Pipeline, YOLOPoseModel};
//! use pose_rig::source::VideoSource;
//!
//! # fn main() -> pose_rig::Result<()> {
//! let model = YOLOPoseModel::load("yolo11n-pose.onnx")?;
//! let source = VideoSource::open("dance.mp4")?;
//! let mut overlay = MemorySink::new();
//! let mut skeleton = MemorySink::new();
//!
//! let summary = Pipeline::new(model, "dance.glb").run(
//!     source.map(|item| item.map(|(frame, _)| frame)),
//!     Outputs { overlay: &mut overlay, skeleton: &mut skeleton, preview: None },
//! )?;
//! println!("{} frames at {:.1} FPS", summary.frames_read, summary.fps());
//! # Ok(())
//! # }
//! ```
//!
//! ## Exporting a recorded sequence
//!
//! ```
//! use pose_rig::{AnimationSequence, BoneExporter, ExportConfig, ExportFormat, FrameKeypoints, Keypoint};
//!
//! # fn main() -> pose_rig::Result<()> {
//! let mut sequence = AnimationSequence::new();
//! sequence.push(FrameKeypoints::splat(Keypoint::new(0.5, 0.5, 1.0)));
//!
//! let exporter = BoneExporter::new(ExportConfig::new().with_format(ExportFormat::Bvh));
//! let scene = exporter.build_scene(&sequence)?;
//! assert_eq!(scene.nodes().len(), 18);
//! # Ok(())
//! # }
//! ```
//!
//! ## CLI
//!
//! ```bash
//! pose-rig run --source dance.mp4
//! pose-rig run -s dance.mp4 -e dance.bvh --scale 100 --show
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`keypoints`] | Keypoint types and normalization |
//! | [`annotate`] | Skeleton rendering in overlay and skeleton-only modes |
//! | [`sequence`] | Per-frame keypoint accumulation |
//! | [`export`] | Bone hierarchy scene building and `.glb`/`.bvh` writers |
//! | [`oracle`] | The [`PoseOracle`] seam and [`Detection`] |
//! | [`model`] | ONNX Runtime pose model |
//! | [`pipeline`] | The frame loop |
//! | [`source`] / [`io`] | Video decoding and encoding |
//! | [`visualizer`] | Colors, skeleton topology and the preview window |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `visualize` | Real-time preview window (default) |
//! | `video` | Video decoding and encoding through FFmpeg |

pub mod annotate;
pub mod cli;
pub mod download;
pub mod error;
pub mod export;
pub mod inference;
pub mod io;
pub mod keypoints;
pub mod metadata;
pub mod model;
pub mod oracle;
pub mod pipeline;
pub mod postprocessing;
pub mod preprocessing;
pub mod sequence;
pub mod source;
pub mod utils;
pub mod visualizer;

pub use annotate::{RenderStyle, blank_canvas, draw_skeleton, render_overlay, render_skeleton_only};
pub use error::{Result, RigError};
pub use export::{BoneExporter, ExportConfig, ExportFormat, ExportSummary};
pub use inference::InferenceConfig;
pub use io::{FrameSink, MemorySink};
pub use keypoints::{FrameKeypoints, Joint, Keypoint, NUM_KEYPOINTS, normalize_keypoints};
pub use metadata::ModelMetadata;
pub use model::YOLOPoseModel;
pub use oracle::{Detection, PoseOracle};
pub use pipeline::{FrameReport, Outputs, Pipeline, RunSummary};
pub use sequence::AnimationSequence;
pub use source::{SourceMeta, VideoSource};
pub use visualizer::{Color, Preview, SKELETON};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
