// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::download::DEFAULT_POSE_MODEL;
use crate::export::DEFAULT_SCALE;
use crate::inference::DEFAULT_CONFIDENCE;
use crate::visualizer::Color;

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Run Options:
    --model, -m <MODEL>            Path to pose ONNX model [default: yolo11n-pose.onnx]
    --source, -s <SOURCE>          Input video
    --output, -o <OUTPUT>          Video with the skeleton drawn over each frame
    --skeleton-output <PATH>       Video with the skeleton on a blank canvas
    --export, -e <EXPORT>          Bone animation file (.glb or .bvh)
    --scale <SCALE>                Export scale factor [default: 20000]
    --conf <CONF>                  Confidence threshold [default: 0.5]
    --marker-radius <PX>           Joint marker radius [default: 5]
    --line-thickness <PX>          Bone line thickness [default: 2]
    --background <white|black>     Skeleton-only canvas color [default: white]
    --gate-markers                 Skip markers of joints with zero confidence
    --show                         Display a live preview (q or Esc to stop)
    --verbose                      Show verbose output

Video decoding and encoding need the 'video' feature (FFmpeg):
    cargo install --path . --features video
Without it, `run` stops with a "Feature not enabled" error.

Examples:
    pose-rig run --source dance.mp4
    pose-rig run -s dance.mp4 -e dance.bvh --scale 100
    pose-rig run -m yolo11x-pose.onnx -s dance.mp4 --show"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track a person through a video, draw the skeleton and export the animation
    Run(RunArgs),
}

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to pose ONNX model file
    #[arg(short, long, default_value = DEFAULT_POSE_MODEL)]
    pub model: String,

    /// Input video
    #[arg(short, long)]
    pub source: PathBuf,

    /// Output video with the skeleton drawn over the source frames
    #[arg(short, long, default_value = "output_video_with_skeleton.mp4")]
    pub output: PathBuf,

    /// Output video with the skeleton on a blank canvas
    #[arg(long, default_value = "output_video_skeleton_only.mp4")]
    pub skeleton_output: PathBuf,

    /// Bone animation file; the extension selects the format (.glb or .bvh)
    #[arg(short, long, default_value = "exported_skeleton.glb")]
    pub export: PathBuf,

    /// Multiplier applied to normalized coordinates in the export
    #[arg(long, default_value_t = DEFAULT_SCALE)]
    pub scale: f64,

    /// Confidence threshold
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    pub conf: f32,

    /// `IoU` threshold for NMS
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,

    /// Inference image size
    #[arg(long)]
    pub imgsz: Option<usize>,

    /// Joint marker radius in pixels
    #[arg(long, default_value_t = 5)]
    pub marker_radius: i32,

    /// Bone line thickness in pixels
    #[arg(long, default_value_t = 2)]
    pub line_thickness: u32,

    /// Canvas color of the skeleton-only video
    #[arg(long, value_enum, default_value_t = Background::White)]
    pub background: Background,

    /// Only draw markers for joints with positive confidence
    #[arg(long, default_value_t = false)]
    pub gate_markers: bool,

    /// Display a live preview window
    #[arg(long, default_value_t = false)]
    pub show: bool,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

/// Canvas color of the skeleton-only video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Background {
    /// White canvas.
    White,
    /// Black canvas.
    Black,
}

impl From<Background> for Color {
    fn from(background: Background) -> Self {
        match background {
            Background::White => Self::WHITE,
            Background::Black => Self::BLACK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_args_defaults() {
        let args = Cli::parse_from(["app", "run", "--source", "in.mp4"]);
        let Commands::Run(run) = args.command;
        assert_eq!(run.model, "yolo11n-pose.onnx");
        assert_eq!(run.source, PathBuf::from("in.mp4"));
        assert_eq!(run.export, PathBuf::from("exported_skeleton.glb"));
        assert!((run.scale - 20000.0).abs() < f64::EPSILON);
        assert!((run.conf - 0.5).abs() < f32::EPSILON);
        assert!(!run.show);
        assert!(run.verbose);
        assert_eq!(run.marker_radius, 5);
        assert_eq!(run.line_thickness, 2);
        assert_eq!(run.background, Background::White);
        assert!(!run.gate_markers);
    }

    #[test]
    fn test_run_args_custom() {
        let args = Cli::parse_from([
            "app",
            "run",
            "-m",
            "custom-pose.onnx",
            "-s",
            "clip.mp4",
            "-e",
            "clip.bvh",
            "--scale",
            "10",
            "--show",
            "--marker-radius",
            "3",
            "--background",
            "black",
            "--gate-markers",
            "--verbose",
            "false",
        ]);
        let Commands::Run(run) = args.command;
        assert_eq!(run.model, "custom-pose.onnx");
        assert_eq!(run.export, PathBuf::from("clip.bvh"));
        assert!((run.scale - 10.0).abs() < f64::EPSILON);
        assert!(run.show);
        assert!(!run.verbose);
        assert_eq!(run.marker_radius, 3);
        assert_eq!(Color::from(run.background), Color::BLACK);
        assert!(run.gate_markers);
    }

    #[test]
    fn test_source_required() {
        assert!(Cli::try_parse_from(["app", "run"]).is_err());
    }
}
