// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The frame loop.
//!
//! [`Pipeline::run`] pulls frames one at a time, asks the oracle for people,
//! and for the first person found normalizes the keypoints, appends them to
//! the [`AnimationSequence`] and writes an overlay frame and a skeleton-only
//! frame. After the last frame (or a quit from the preview) the sinks are
//! closed and the sequence is exported once.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::RgbImage;

use crate::annotate::{RenderStyle, render_overlay, render_skeleton_only};
use crate::error::Result;
use crate::export::{BoneExporter, ExportConfig, ExportSummary};
use crate::io::FrameSink;
use crate::oracle::{PoseOracle, first_person};
use crate::sequence::AnimationSequence;
use crate::visualizer::Preview;

/// Per-frame outcome passed to the progress hook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Zero-based frame index.
    pub index: usize,
    /// Number of people the oracle reported.
    pub detections: usize,
    /// Whether a pose was added to the sequence.
    pub pose_found: bool,
    /// Time spent on this frame.
    pub elapsed: Duration,
}

/// Throughput report of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Frames pulled from the source.
    pub frames_read: usize,
    /// Frames that yielded a pose.
    pub frames_with_pose: usize,
    /// Wall-clock time of the frame loop.
    pub elapsed: Duration,
    /// Whether the preview asked to stop early.
    pub stopped_early: bool,
    /// What the exporter wrote.
    pub export: ExportSummary,
}

impl RunSummary {
    /// Average frames per second over the loop.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.frames_read as f64 / secs } else { 0.0 }
    }
}

/// Output streams of a run.
pub struct Outputs<'a> {
    /// Skeleton drawn over the source frame.
    pub overlay: &'a mut dyn FrameSink,
    /// Skeleton drawn on a blank canvas.
    pub skeleton: &'a mut dyn FrameSink,
    /// Live preview, if any.
    pub preview: Option<&'a mut dyn Preview>,
}

type ProgressHook = Box<dyn FnMut(&FrameReport)>;

/// Drives the oracle, renderer and exporter over a frame stream.
pub struct Pipeline<O> {
    oracle: O,
    style: RenderStyle,
    exporter: BoneExporter,
    export_path: PathBuf,
    on_frame: Option<ProgressHook>,
}

impl<O: PoseOracle> Pipeline<O> {
    /// Pipeline with the default style and export configuration.
    pub fn new<P: AsRef<Path>>(oracle: O, export_path: P) -> Self {
        Self {
            oracle,
            style: RenderStyle::default(),
            exporter: BoneExporter::default(),
            export_path: export_path.as_ref().to_path_buf(),
            on_frame: None,
        }
    }

    /// Set the render style.
    #[must_use]
    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the export configuration.
    #[must_use]
    pub fn with_export_config(mut self, config: ExportConfig) -> Self {
        self.exporter = BoneExporter::new(config);
        self
    }

    /// Call `hook` after every frame.
    #[must_use]
    pub fn with_progress(mut self, hook: impl FnMut(&FrameReport) + 'static) -> Self {
        self.on_frame = Some(Box::new(hook));
        self
    }

    /// The oracle.
    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// Run the frame loop, close the outputs and export the sequence.
    ///
    /// # Errors
    ///
    /// Returns the first source, oracle, render or sink error (after closing
    /// the sinks), or the export error. An input with no pose at all ends in
    /// [`RigError::EmptySequence`](crate::RigError::EmptySequence) and writes no export file.
    pub fn run<I>(&mut self, frames: I, outputs: Outputs<'_>) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<RgbImage>>,
    {
        let Outputs {
            overlay,
            skeleton,
            mut preview,
        } = outputs;

        let mut sequence = AnimationSequence::new();
        let start = Instant::now();
        let mut frames_read = 0;
        let mut stopped_early = false;

        let looped = (|| -> Result<()> {
            for frame in frames {
                let frame_start = Instant::now();
                let frame = frame?;
                let index = frames_read;
                frames_read += 1;

                let detections = self.oracle.detect(&frame)?;
                let mut shown = None;

                if let Some(kps) = first_person(&detections) {
                    let (width, height) = frame.dimensions();
                    let normalized = kps.normalize(width, height)?;
                    sequence.push(normalized);

                    let annotated = render_overlay(&frame, &normalized, &self.style)?;
                    overlay.write_frame(&annotated)?;
                    let bare = render_skeleton_only(width, height, &normalized, &self.style)?;
                    skeleton.write_frame(&bare)?;
                    shown = Some(annotated);
                }

                if let Some(hook) = self.on_frame.as_mut() {
                    hook(&FrameReport {
                        index,
                        detections: detections.len(),
                        pose_found: shown.is_some(),
                        elapsed: frame_start.elapsed(),
                    });
                }

                if let Some(preview) = preview.as_deref_mut() {
                    let keep_going = preview.show(shown.as_ref().unwrap_or(&frame))?;
                    if !keep_going {
                        stopped_early = true;
                        break;
                    }
                }
            }
            Ok(())
        })();
        let elapsed = start.elapsed();

        let closed = overlay.finish().and(skeleton.finish());
        looped?;
        closed?;

        let export = self.exporter.export(&sequence, &self.export_path)?;

        Ok(RunSummary {
            frames_read,
            frames_with_pose: sequence.len(),
            elapsed,
            stopped_early,
            export,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RigError;
    use crate::io::MemorySink;
    use crate::keypoints::{FrameKeypoints, Keypoint};
    use crate::oracle::Detection;

    /// Returns a fixed answer per frame index.
    struct ScriptedOracle {
        script: Vec<Vec<Detection>>,
        calls: usize,
    }

    impl PoseOracle for ScriptedOracle {
        fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Detection>> {
            let out = self.script.get(self.calls).cloned().unwrap_or_default();
            self.calls += 1;
            Ok(out)
        }
    }

    struct QuitAfter {
        shown: usize,
        limit: usize,
    }

    impl Preview for QuitAfter {
        fn show(&mut self, _frame: &RgbImage) -> Result<bool> {
            self.shown += 1;
            Ok(self.shown < self.limit)
        }
    }

    fn person_at(x: f32, y: f32) -> Vec<Detection> {
        let kps = FrameKeypoints::splat(Keypoint::new(x, y, 0.9));
        vec![Detection::with_keypoints([0.0, 0.0, 10.0, 10.0], 0.9, kps)]
    }

    fn frames(n: usize) -> Vec<Result<RgbImage>> {
        (0..n).map(|_| Ok(RgbImage::new(40, 20))).collect()
    }

    fn temp_export(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pose-rig-pipeline-{}-{name}.bvh", std::process::id()))
    }

    #[test]
    fn test_only_pose_frames_are_written() {
        let oracle = ScriptedOracle {
            script: vec![person_at(20.0, 10.0), vec![], person_at(10.0, 5.0)],
            calls: 0,
        };
        let path = temp_export("pose-frames");
        let mut overlay = MemorySink::new();
        let mut skeleton = MemorySink::new();
        let mut pipeline = Pipeline::new(oracle, &path);

        let summary = pipeline
            .run(
                frames(3),
                Outputs {
                    overlay: &mut overlay,
                    skeleton: &mut skeleton,
                    preview: None,
                },
            )
            .unwrap();

        assert_eq!(summary.frames_read, 3);
        assert_eq!(summary.frames_with_pose, 2);
        assert_eq!(summary.export.frames, 2);
        assert!(!summary.stopped_early);
        assert_eq!(overlay.frames.len(), 2);
        assert_eq!(skeleton.frames.len(), 2);
        assert!(overlay.finished && skeleton.finished);
        assert_eq!(skeleton.frames[0].dimensions(), (40, 20));
        assert!(path.exists());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_quit_exports_partial_sequence() {
        let oracle = ScriptedOracle {
            script: vec![person_at(20.0, 10.0); 5],
            calls: 0,
        };
        let path = temp_export("quit");
        let mut overlay = MemorySink::new();
        let mut skeleton = MemorySink::new();
        let mut preview = QuitAfter { shown: 0, limit: 2 };
        let mut pipeline = Pipeline::new(oracle, &path);

        let summary = pipeline
            .run(
                frames(5),
                Outputs {
                    overlay: &mut overlay,
                    skeleton: &mut skeleton,
                    preview: Some(&mut preview),
                },
            )
            .unwrap();

        assert!(summary.stopped_early);
        assert_eq!(summary.frames_read, 2);
        assert_eq!(summary.export.frames, 2);
        assert_eq!(pipeline.oracle_mut().calls, 2);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_no_pose_fails_with_empty_sequence() {
        let oracle = ScriptedOracle {
            script: vec![],
            calls: 0,
        };
        let path = temp_export("empty");
        let mut overlay = MemorySink::new();
        let mut skeleton = MemorySink::new();
        let err = Pipeline::new(oracle, &path)
            .run(
                frames(2),
                Outputs {
                    overlay: &mut overlay,
                    skeleton: &mut skeleton,
                    preview: None,
                },
            )
            .unwrap_err();

        assert!(matches!(err, RigError::EmptySequence));
        assert!(overlay.finished);
        assert!(!path.exists());
    }

    #[test]
    fn test_source_error_closes_sinks() {
        let oracle = ScriptedOracle {
            script: vec![person_at(20.0, 10.0)],
            calls: 0,
        };
        let path = temp_export("source-error");
        let mut overlay = MemorySink::new();
        let mut skeleton = MemorySink::new();
        let input = vec![Ok(RgbImage::new(8, 8)), Err(RigError::VideoError("corrupt".to_string()))];

        let err = Pipeline::new(oracle, &path)
            .run(
                input,
                Outputs {
                    overlay: &mut overlay,
                    skeleton: &mut skeleton,
                    preview: None,
                },
            )
            .unwrap_err();

        assert!(matches!(err, RigError::VideoError(_)));
        assert!(overlay.finished && skeleton.finished);
        assert!(!path.exists());
    }

    #[test]
    fn test_progress_hook_sees_every_frame() {
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let oracle = ScriptedOracle {
            script: vec![vec![], person_at(4.0, 4.0)],
            calls: 0,
        };
        let path = temp_export("progress");
        let mut overlay = MemorySink::new();
        let mut skeleton = MemorySink::new();
        Pipeline::new(oracle, &path)
            .with_progress(move |r| sink.lock().unwrap().push((r.index, r.pose_found)))
            .run(
                frames(2),
                Outputs {
                    overlay: &mut overlay,
                    skeleton: &mut skeleton,
                    preview: None,
                },
            )
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(0, false), (1, true)]);
        let _ = std::fs::remove_file(path);
    }
}
