// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use image::Rgb;

/// Color type for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    /// Green color.
    pub const GREEN: Color = Color(0, 255, 0);
    /// Blue color.
    pub const BLUE: Color = Color(0, 0, 255);
    /// White color.
    pub const WHITE: Color = Color(255, 255, 255);
    /// Black color.
    pub const BLACK: Color = Color(0, 0, 0);

    /// Create a new color from RGB values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    /// Pixel value for an RGB canvas.
    #[must_use]
    pub const fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.0, self.1, self.2])
    }

    /// Pack as `0x00RRGGBB`, the layout minifb expects.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        ((self.0 as u32) << 16) | ((self.1 as u32) << 8) | self.2 as u32
    }
}

impl From<Color> for Rgb<u8> {
    fn from(c: Color) -> Self {
        c.to_rgb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing() {
        assert_eq!(Color::GREEN.to_u32(), 0x0000_FF00);
        assert_eq!(Color::new(1, 2, 3).to_u32(), 0x0001_0203);
        assert_eq!(Rgb::from(Color::BLUE), Rgb([0, 0, 255]));
    }
}
