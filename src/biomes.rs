//! Height-banded biome palette
//!
//! Terrain is colored purely by normalized elevation. Bands are checked in
//! the order they were configured and the first band whose threshold is at
//! or above the sample wins, so an operator can list bands in any order and
//! get first-match behavior.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

/// Linear RGBA color with channels in 0.0-1.0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build from 8-bit sRGB-style components.
    pub fn from_rgb8(rgb: [u8; 3]) -> Self {
        Self::rgb(rgb[0] as f32 / 255.0, rgb[1] as f32 / 255.0, rgb[2] as f32 / 255.0)
    }

    /// Linear blend toward `other`; `t` is clamped to 0.0-1.0.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }
}

/// One elevation band of the palette.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeBand {
    pub name: String,
    /// Upper bound (inclusive) of normalized height this band covers
    pub height: f32,
    pub color: Color,
}

impl BiomeBand {
    pub fn new(name: impl Into<String>, height: f32, color: Color) -> Self {
        Self {
            name: name.into(),
            height,
            color,
        }
    }
}

/// Ordered band list used to classify normalized heights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiomeTable {
    bands: Vec<BiomeBand>,
}

impl Default for BiomeTable {
    /// Island palette: sea, shore, lowland, forest, rock, snow.
    fn default() -> Self {
        Self::new(vec![
            BiomeBand::new("Deep Water", 0.2, Color::from_rgb8([30, 70, 150])),
            BiomeBand::new("Shallow Water", 0.3, Color::from_rgb8([55, 105, 190])),
            BiomeBand::new("Sand", 0.35, Color::from_rgb8([210, 205, 125])),
            BiomeBand::new("Grass", 0.5, Color::from_rgb8([85, 150, 35])),
            BiomeBand::new("Forest", 0.65, Color::from_rgb8([60, 105, 25])),
            BiomeBand::new("Rock", 0.8, Color::from_rgb8([95, 75, 70])),
            BiomeBand::new("Mountain", 0.9, Color::from_rgb8([75, 60, 55])),
            BiomeBand::new("Snow", 1.0, Color::from_rgb8([245, 245, 245])),
        ])
    }
}

impl BiomeTable {
    /// Color used when no band covers a height.
    pub const FALLBACK: Color = Color::WHITE;

    pub fn new(bands: Vec<BiomeBand>) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &[BiomeBand] {
        &self.bands
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Position of the first band (in configured order) whose threshold is
    /// >= `height`.
    pub fn band_index(&self, height: f32) -> Option<usize> {
        self.bands.iter().position(|band| height <= band.height)
    }

    pub fn band_for(&self, height: f32) -> Option<&BiomeBand> {
        self.band_index(height).map(|i| &self.bands[i])
    }

    /// Palette color for a normalized height; white when nothing matches.
    pub fn color_for(&self, height: f32) -> Color {
        self.band_for(height)
            .map(|band| band.color)
            .unwrap_or(Self::FALLBACK)
    }

    /// Band thresholds must be real numbers; an empty table is allowed and
    /// paints everything with the fallback.
    pub fn validate(&self) -> Result<()> {
        for band in &self.bands {
            if !band.height.is_finite() {
                return Err(TerrainError::invalid(
                    "biomes.height",
                    format!("band '{}' has non-finite threshold {}", band.name, band.height),
                ));
            }
        }
        Ok(())
    }
}
