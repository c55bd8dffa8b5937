// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Video input.
//!
//! [`VideoSource`] opens a video file and yields its frames in order as
//! [`RgbImage`]s at source resolution, together with a [`SourceMeta`].
//! Decoding needs the `video` feature.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::error::{Result, RigError};

/// Metadata about a decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMeta {
    /// Zero-based frame index.
    pub frame_idx: usize,
    /// Total frames, when the container reports a duration.
    pub total_frames: Option<usize>,
    /// Source path.
    pub path: String,
    /// Source frame rate.
    pub fps: Option<f32>,
}

impl Default for SourceMeta {
    fn default() -> Self {
        Self {
            frame_idx: 0,
            total_frames: None,
            path: String::new(),
            fps: None,
        }
    }
}

/// Sequential frame reader over a video file.
pub struct VideoSource {
    path: PathBuf,
    current_frame: usize,
    total_frames: Option<usize>,
    fps: Option<f32>,
    size: (u32, u32),
    finished: bool,
    #[cfg(feature = "video")]
    decoder: video_rs::decode::Decoder,
}

impl VideoSource {
    /// Open `path` for decoding.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::IoError`] if the file does not exist,
    /// [`RigError::VideoError`] if it cannot be decoded, or
    /// [`RigError::FeatureNotEnabled`] without the `video` feature.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(RigError::IoError(format!("Video not found: {}", path.display())));
        }
        Self::open_decoder(path)
    }

    #[cfg(feature = "video")]
    fn open_decoder(path: &Path) -> Result<Self> {
        crate::io::init_logging();

        let decoder = video_rs::decode::Decoder::new(path)
            .map_err(|e| RigError::VideoError(format!("Failed to open {}: {e}", path.display())))?;

        let fps = decoder.frame_rate();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let total_frames = decoder
            .duration()
            .ok()
            .map(|d| (d.as_secs_f64() * f64::from(fps)).round() as usize)
            .filter(|&n| n > 0);
        let size = decoder.size();

        Ok(Self {
            path: path.to_path_buf(),
            current_frame: 0,
            total_frames,
            fps: Some(fps),
            size,
            finished: false,
            decoder,
        })
    }

    #[cfg(not(feature = "video"))]
    fn open_decoder(_path: &Path) -> Result<Self> {
        Err(RigError::FeatureNotEnabled(
            "Video decoding requires the 'video' feature".to_string(),
        ))
    }

    /// Frame size (width, height).
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        self.size
    }

    /// Source frame rate, if known.
    #[must_use]
    pub const fn fps(&self) -> Option<f32> {
        self.fps
    }

    /// Total frame count, if known.
    #[must_use]
    pub const fn total_frames(&self) -> Option<usize> {
        self.total_frames
    }

    /// Path being decoded.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn meta(&self) -> SourceMeta {
        SourceMeta {
            frame_idx: self.current_frame,
            total_frames: self.total_frames,
            path: self.path.to_string_lossy().to_string(),
            fps: self.fps,
        }
    }

    #[cfg(feature = "video")]
    fn next_frame(&mut self) -> Option<Result<RgbImage>> {
        match self.decoder.decode() {
            Ok((_ts, frame)) => Some(video_frame_to_image(&frame)),
            Err(video_rs::Error::DecodeExhausted) => None,
            Err(e) => Some(Err(RigError::VideoError(format!("Failed to decode frame: {e}")))),
        }
    }

    #[cfg(not(feature = "video"))]
    #[allow(clippy::unused_self)]
    const fn next_frame(&mut self) -> Option<Result<RgbImage>> {
        None
    }
}

impl Iterator for VideoSource {
    type Item = Result<(RgbImage, SourceMeta)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_frame() {
            Some(Ok(frame)) => {
                let meta = self.meta();
                self.current_frame += 1;
                Some(Ok((frame, meta)))
            }
            Some(Err(e)) => {
                self.finished = true;
                Some(Err(e))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }
}

impl std::fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSource")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("fps", &self.fps)
            .field("current_frame", &self.current_frame)
            .finish_non_exhaustive()
    }
}

/// Convert a decoded HWC frame into an RGB image.
#[cfg(feature = "video")]
fn video_frame_to_image(frame: &video_rs::Frame) -> Result<RgbImage> {
    let shape = frame.shape();
    let height = u32::try_from(shape[0])
        .map_err(|_| RigError::ImageError("Frame height exceeds u32::MAX".to_string()))?;
    let width = u32::try_from(shape[1])
        .map_err(|_| RigError::ImageError("Frame width exceeds u32::MAX".to_string()))?;

    let raw: Vec<u8> = frame.as_standard_layout().iter().copied().collect();
    RgbImage::from_raw(width, height, raw)
        .ok_or_else(|| RigError::ImageError("Failed to create image from video frame".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_video() {
        let err = VideoSource::open("definitely-missing.mp4").unwrap_err();
        assert!(matches!(err, RigError::IoError(_)));
    }

    #[cfg(not(feature = "video"))]
    #[test]
    fn test_feature_not_enabled() {
        let path = std::env::temp_dir().join(format!("pose-rig-source-{}.mp4", std::process::id()));
        std::fs::write(&path, b"not a video").unwrap();
        let err = VideoSource::open(&path).unwrap_err();
        assert!(matches!(err, RigError::FeatureNotEnabled(_)));
        let _ = std::fs::remove_file(path);
    }
}
