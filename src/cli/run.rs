// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::Path;
use std::process;

use crate::cli::args::RunArgs;
use crate::download::try_download_model;
use crate::export::{ExportConfig, ExportFormat};
use crate::io::{FrameSink, open_video_sink};
use crate::pipeline::{Outputs, Pipeline, RunSummary};
use crate::source::VideoSource;
use crate::visualizer::Preview;
use crate::{InferenceConfig, RenderStyle, Result, VERSION, YOLOPoseModel};
use crate::{error, info, section, success, verbose, warn};

/// Run the video pipeline and exit the process on failure.
pub fn run_pipeline(args: &RunArgs) {
    crate::cli::logging::set_verbose(args.verbose);

    match execute(args) {
        Ok(summary) => report(&summary),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}

fn load_model(args: &RunArgs) -> Result<YOLOPoseModel> {
    let model_path = Path::new(&args.model);
    if !model_path.exists() {
        try_download_model(model_path)?;
    }

    let mut config = InferenceConfig::new().with_confidence(args.conf).with_iou(args.iou);
    if let Some(sz) = args.imgsz {
        config = config.with_imgsz(sz, sz);
    }
    YOLOPoseModel::load_with_config(model_path, config)
}

#[cfg(feature = "visualize")]
fn open_preview(show: bool, width: u32, height: u32) -> Result<Option<Box<dyn Preview>>> {
    if !show {
        return Ok(None);
    }
    let viewer = crate::visualizer::Viewer::new(
        crate::visualizer::viewer::WINDOW_TITLE,
        width as usize,
        height as usize,
    )?;
    Ok(Some(Box::new(viewer)))
}

#[cfg(not(feature = "visualize"))]
fn open_preview(show: bool, _width: u32, _height: u32) -> Result<Option<Box<dyn Preview>>> {
    if show {
        warn!("--show requires the 'visualize' feature. Compile with --features visualize to enable the preview.");
    }
    Ok(None)
}

fn render_style(args: &RunArgs) -> RenderStyle {
    RenderStyle::new()
        .with_marker_radius(args.marker_radius)
        .with_line_thickness(args.line_thickness)
        .with_background(args.background.into())
        .with_marker_confidence_gate(args.gate_markers)
}

fn format_people(count: usize) -> String {
    match count {
        0 => "(no detections)".to_string(),
        1 => "1 person".to_string(),
        n => format!("{n} persons"),
    }
}

fn execute(args: &RunArgs) -> Result<RunSummary> {
    // Reject a bad export target before spending time on the video.
    let format = ExportFormat::from_path(&args.export)?;

    let source = VideoSource::open(&args.source)?;
    let (width, height) = source.dimensions();

    let model = load_model(args)?;
    let imgsz = model.input_size();

    println!("Pose Rig {VERSION} 🚀 Rust ONNX FP32 CPU");
    verbose!(
        "{} summary: {} keypoints, imgsz=({}, {})",
        args.model,
        model.metadata().kpt_shape.0,
        imgsz.0,
        imgsz.1
    );
    verbose!(
        "Source {}: {width}x{height}, {} fps, {} frames",
        args.source.display(),
        source.fps().map_or_else(|| "?".to_string(), |f| format!("{f:.2}")),
        source.total_frames().map_or_else(|| "?".to_string(), |n| n.to_string())
    );

    let mut overlay: Box<dyn FrameSink> = open_video_sink(&args.output, width, height)?;
    let mut skeleton: Box<dyn FrameSink> = open_video_sink(&args.skeleton_output, width, height)?;
    let mut preview = open_preview(args.show, width, height)?;

    let total = source.total_frames().map_or_else(|| "?".to_string(), |n| n.to_string());
    let name = args.source.display().to_string();

    let export_config = ExportConfig::new().with_scale(args.scale).with_format(format);
    let mut pipeline = Pipeline::new(model, &args.export)
        .with_style(render_style(args))
        .with_export_config(export_config)
        .with_progress(move |r| {
            verbose!(
                "video 1/1 (frame {}/{total}) {name}: {}x{} {}, {:.1}ms",
                r.index + 1,
                imgsz.0,
                imgsz.1,
                format_people(r.detections),
                r.elapsed.as_secs_f64() * 1000.0
            );
        });

    section!("Processing {}", args.source.display());
    let frames = source.map(|item| item.map(|(frame, _meta)| frame));
    pipeline.run(
        frames,
        Outputs {
            overlay: overlay.as_mut(),
            skeleton: skeleton.as_mut(),
            preview: preview.as_mut().map(|p| -> &mut dyn Preview { p.as_mut() }),
        },
    )
}

fn report(summary: &RunSummary) {
    section!("Summary");
    info!("Frames processed: {}", summary.frames_read);
    info!("Frames with a pose: {}", summary.frames_with_pose);
    info!("Total processing time: {:.2} seconds", summary.elapsed.as_secs_f64());
    info!("Average FPS: {:.2}", summary.fps());
    if summary.stopped_early {
        warn!("Stopped from the preview window; exported the frames processed so far.");
    }
    success!(
        "Exported {} bones x {} frames ({:.2}s) to {} ({}, {} bytes)",
        summary.export.bones,
        summary.export.frames,
        summary.export.duration,
        summary.export.path.display(),
        summary.export.format,
        summary.export.bytes
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_style_from_args() {
        use clap::Parser;

        use crate::cli::args::{Cli, Commands};
        use crate::visualizer::Color;

        let cli = Cli::parse_from([
            "app",
            "run",
            "-s",
            "in.mp4",
            "--marker-radius",
            "8",
            "--line-thickness",
            "4",
            "--background",
            "black",
            "--gate-markers",
        ]);
        let Commands::Run(args) = cli.command;
        let style = render_style(&args);

        assert_eq!(style.marker_radius, 8);
        assert_eq!(style.line_thickness, 4);
        assert_eq!(style.background, Color::BLACK);
        assert!(style.gate_markers_on_confidence);

        let cli = Cli::parse_from(["app", "run", "-s", "in.mp4"]);
        let Commands::Run(args) = cli.command;
        assert_eq!(render_style(&args), RenderStyle::default());
    }

    #[test]
    fn test_format_people() {
        assert_eq!(format_people(0), "(no detections)");
        assert_eq!(format_people(1), "1 person");
        assert_eq!(format_people(3), "3 persons");
    }
}
