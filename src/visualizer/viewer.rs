// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Preview window for the overlay stream.

use image::RgbImage;
use minifb::{Key, Window, WindowOptions};

use super::{Color, Preview};
use crate::error::{Result, RigError};

/// Window title used by the CLI.
pub const WINDOW_TITLE: &str = "Pose Detection with Skeleton";

/// A simple frame viewer using minifb.
///
/// `q`, `Esc` or closing the window is reported as a quit request.
pub struct Viewer {
    window: Window,
    pub width: usize,
    pub height: usize,
    buffer: Vec<u32>,
}

impl Viewer {
    /// Create a new viewer window.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be created.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| RigError::VisualizerError(format!("Failed to create window: {e}")))?;

        window.limit_update_rate(Some(std::time::Duration::from_micros(16600)));

        Ok(Self {
            window,
            width,
            height,
            buffer: Vec::new(),
        })
    }

    fn quit_requested(&self) -> bool {
        !self.window.is_open()
            || self.window.is_key_down(Key::Escape)
            || self.window.is_key_down(Key::Q)
    }
}

impl Preview for Viewer {
    fn show(&mut self, frame: &RgbImage) -> Result<bool> {
        if self.quit_requested() {
            return Ok(false);
        }

        let (w, h) = (frame.width() as usize, frame.height() as usize);
        self.buffer.clear();
        self.buffer
            .extend(frame.pixels().map(|p| Color::new(p[0], p[1], p[2]).to_u32()));
        self.width = w;
        self.height = h;

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| RigError::VisualizerError(format!("Failed to update window: {e}")))?;

        Ok(!self.quit_requested())
    }
}
