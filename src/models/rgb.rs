//! RGB color handling with hex parsing and serialization.

// Allow intentional type casts for color math
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB color value with hex string representation.
///
/// Stored in preferences as a `"#RRGGBB"` string, so it serializes through
/// its hex form rather than as a struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RgbColor {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl RgbColor {
    /// Creates a new `RgbColor` from individual channel values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses an `RgbColor` from a hex string.
    ///
    /// Supports formats: "#RRGGBB", "RRGGBB", "#rrggbb", "rrggbb"
    ///
    /// # Examples
    ///
    /// ```
    /// use keyclack::models::RgbColor;
    ///
    /// let color = RgbColor::from_hex("#66BCC2").unwrap();
    /// assert_eq!(color, RgbColor::new(0x66, 0xBC, 0xC2));
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);

        if hex.len() != 6 || !hex.is_ascii() {
            anyhow::bail!("Invalid hex color format '{hex}'. Expected 6 hex digits (RRGGBB)");
        }

        let r = u8::from_str_radix(&hex[0..2], 16)
            .context(format!("Invalid red channel in hex color '{hex}'"))?;
        let g = u8::from_str_radix(&hex[2..4], 16)
            .context(format!("Invalid green channel in hex color '{hex}'"))?;
        let b = u8::from_str_radix(&hex[4..6], 16)
            .context(format!("Invalid blue channel in hex color '{hex}'"))?;

        Ok(Self::new(r, g, b))
    }

    /// Converts the color to a hex string in the format "#RRGGBB" (uppercase).
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Converts the color to a Ratatui Color for terminal rendering.
    #[must_use]
    pub const fn to_ratatui_color(&self) -> ratatui::style::Color {
        ratatui::style::Color::Rgb(self.r, self.g, self.b)
    }

    /// Returns a dimmed version of the color at the given percentage.
    ///
    /// `percent` is clamped to 100; 0 is black, 100 is the original color.
    #[must_use]
    pub const fn dim(&self, percent: u8) -> Self {
        let percent = if percent > 100 { 100 } else { percent };
        Self {
            r: (self.r as u16 * percent as u16 / 100) as u8,
            g: (self.g as u16 * percent as u16 / 100) as u8,
            b: (self.b as u16 * percent as u16 / 100) as u8,
        }
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for RgbColor {
    /// Default color is white (#FFFFFF).
    fn default() -> Self {
        Self::new(255, 255, 255)
    }
}

impl TryFrom<String> for RgbColor {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<RgbColor> for String {
    fn from(color: RgbColor) -> Self {
        color.to_hex()
    }
}
