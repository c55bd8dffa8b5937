// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Drawing palette, skeleton layout and the live preview window.

use image::RgbImage;

use crate::error::Result;

/// Color definitions.
pub mod color;

/// Skeleton connection table.
pub mod skeleton;

#[cfg(feature = "visualize")]
pub mod viewer;

pub use color::Color;
pub use skeleton::SKELETON;

#[cfg(feature = "visualize")]
pub use viewer::Viewer;

/// A live display that frames are pushed to while the pipeline runs.
pub trait Preview {
    /// Display a frame.
    ///
    /// Returns `Ok(false)` once the operator asked to stop.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be displayed.
    fn show(&mut self, frame: &RgbImage) -> Result<bool>;
}
