// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Output video streams.
//!
//! The pipeline writes to two [`FrameSink`]s: the overlay stream and the
//! skeleton-only stream. [`VideoWriter`] encodes H.264 MP4 through `video-rs`.

use std::path::Path;

#[cfg(feature = "video")]
use std::sync::Once;

use image::RgbImage;
#[cfg(feature = "video")]
use video_rs::{Encoder, Time, encode::Settings as EncoderSettings};

use crate::error::{Result, RigError};

/// Frame rate of the written videos, independent of the source.
pub const OUTPUT_FPS: f32 = 30.0;

#[cfg(feature = "video")]
static INIT: Once = Once::new();

/// Initialize `video-rs` once; FFmpeg output is limited to errors.
#[allow(clippy::missing_const_for_fn)]
pub fn init_logging() {
    #[cfg(feature = "video")]
    INIT.call_once(|| {
        if let Err(e) = video_rs::init() {
            eprintln!("Failed to initialize video-rs: {e}");
        }
    });
}

/// Sequential frame writer.
pub trait FrameSink {
    /// Append one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be written.
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Flush and close the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be finalized.
    fn finish(&mut self) -> Result<()>;
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        (**self).write_frame(frame)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// H.264 MP4 writer with a fixed frame size.
#[cfg(feature = "video")]
pub struct VideoWriter {
    encoder: Encoder,
    frame_duration: Time,
    position: Time,
    width: u32,
    height: u32,
    finished: bool,
}

#[cfg(feature = "video")]
impl VideoWriter {
    /// Create a writer for `width` x `height` frames at `fps`.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::VideoError`] if the encoder cannot be created.
    pub fn new<P: AsRef<Path>>(path: P, width: u32, height: u32, fps: f32) -> Result<Self> {
        init_logging();

        let settings = EncoderSettings::preset_h264_yuv420p(width as usize, height as usize, false);
        let encoder = Encoder::new(path.as_ref(), settings).map_err(|e| {
            RigError::VideoError(format!("Failed to create video encoder for {}: {e}", path.as_ref().display()))
        })?;

        Ok(Self {
            encoder,
            frame_duration: Time::from_secs_f64(1.0 / f64::from(fps)),
            position: Time::zero(),
            width,
            height,
            finished: false,
        })
    }
}

#[cfg(feature = "video")]
impl FrameSink for VideoWriter {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let (width, height) = frame.dimensions();
        if (width, height) != (self.width, self.height) {
            return Err(RigError::VideoError(format!(
                "Frame dimensions {width}x{height} do not match video dimensions {}x{}",
                self.width, self.height
            )));
        }

        let frame_array = video_rs::Frame::from_shape_vec((height as usize, width as usize, 3), frame.as_raw().clone())
            .map_err(|e| RigError::VideoError(e.to_string()))?;

        self.encoder
            .encode(&frame_array, self.position)
            .map_err(|e| RigError::VideoError(format!("Failed to encode frame: {e}")))?;

        self.position = self.position.aligned_with(self.frame_duration).add();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.encoder
            .finish()
            .map_err(|e| RigError::VideoError(format!("Failed to finish video encoding: {e}")))
    }
}

/// Open an MP4 sink at [`OUTPUT_FPS`].
///
/// # Errors
///
/// Returns [`RigError::VideoError`] if the encoder cannot be created, or
/// [`RigError::FeatureNotEnabled`] without the `video` feature.
#[cfg(feature = "video")]
pub fn open_video_sink<P: AsRef<Path>>(path: P, width: u32, height: u32) -> Result<Box<dyn FrameSink>> {
    Ok(Box::new(VideoWriter::new(path, width, height, OUTPUT_FPS)?))
}

/// Open an MP4 sink at [`OUTPUT_FPS`].
///
/// # Errors
///
/// Always returns [`RigError::FeatureNotEnabled`]; build with `video`.
#[cfg(not(feature = "video"))]
pub fn open_video_sink<P: AsRef<Path>>(_path: P, _width: u32, _height: u32) -> Result<Box<dyn FrameSink>> {
    Err(RigError::FeatureNotEnabled(
        "Video encoding requires the 'video' feature".to_string(),
    ))
}

/// Keeps frames in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Frames written so far.
    pub frames: Vec<RgbImage>,
    /// Whether `finish` has been called.
    pub finished: bool,
}

impl MemorySink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if self.finished {
            return Err(RigError::VideoError("Sink already finished".to_string()));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        sink.write_frame(&RgbImage::new(4, 4)).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.frames.len(), 1);
        assert!(sink.write_frame(&RgbImage::new(4, 4)).is_err());
    }

    #[cfg(not(feature = "video"))]
    #[test]
    fn test_video_sink_requires_feature() {
        let err = open_video_sink("out.mp4", 4, 4).err().unwrap();
        assert!(matches!(err, RigError::FeatureNotEnabled(_)));
    }
}
