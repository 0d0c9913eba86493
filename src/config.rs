//! Island generation parameters and configuration

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::biomes::BiomeTable;
use crate::error::{Result, TerrainError};

/// Scale substituted whenever the configured scale is zero or negative.
pub const MIN_NOISE_SCALE: f32 = 0.0001;

/// Parameters for the fractal noise field and its island falloff.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Seed for the per-octave offset table
    pub seed: u64,
    /// Feature size in world units (higher = broader hills)
    pub scale: f32,
    /// Number of fractal layers
    pub octaves: u32,
    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f32,
    /// Frequency multiplier per octave (>= 1.0)
    pub lacunarity: f32,
    /// Added to every octave offset; pans the noise without reseeding
    pub offset: Vec2,
    /// 0.0 = pure fractal noise, 1.0 = pure radial shape
    pub mix: f32,
    /// Width of the domain the falloff and octave centering normalize against
    pub world_width: u32,
    /// Height (z extent) of that domain
    pub world_height: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
            mix: 0.5,
            world_width: 256,
            world_height: 256,
        }
    }
}

impl NoiseConfig {
    /// Scale actually used for sampling; never zero or negative.
    pub fn effective_scale(&self) -> f32 {
        if self.scale <= 0.0 {
            MIN_NOISE_SCALE
        } else {
            self.scale
        }
    }

    /// Apply the editor-side corrections: lacunarity floors at 1, mix and
    /// persistence are sliders over [0, 1].
    pub fn sanitized(mut self) -> Self {
        if self.lacunarity < 1.0 {
            self.lacunarity = 1.0;
        }
        self.mix = self.mix.clamp(0.0, 1.0);
        self.persistence = self.persistence.clamp(0.0, 1.0);
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_finite("noise.scale", self.scale)?;
        check_finite("noise.persistence", self.persistence)?;
        check_finite("noise.lacunarity", self.lacunarity)?;
        check_finite("noise.mix", self.mix)?;
        check_finite("noise.offset.x", self.offset.x)?;
        check_finite("noise.offset.y", self.offset.y)?;
        if self.world_width == 0 {
            return Err(TerrainError::invalid("noise.world_width", "must be at least 1"));
        }
        if self.world_height == 0 {
            return Err(TerrainError::invalid("noise.world_height", "must be at least 1"));
        }
        Ok(())
    }
}

/// How the island is cut into chunks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkLayout {
    pub chunks_per_side: u32,
    /// Cubes along x and z per chunk
    pub chunk_size: u32,
    /// Cubes along y per chunk; also the height a noise value of 1.0 maps to
    pub chunk_height: u32,
    /// Iso level separating solid from air
    pub threshold: f32,
}

impl Default for ChunkLayout {
    fn default() -> Self {
        Self {
            chunks_per_side: 16,
            chunk_size: 16,
            chunk_height: 32,
            threshold: 0.5,
        }
    }
}

impl ChunkLayout {
    /// Edge length of the whole island in world units.
    pub fn island_size(&self) -> u32 {
        self.chunks_per_side * self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks_per_side as usize * self.chunks_per_side as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunks_per_side == 0 {
            return Err(TerrainError::invalid("layout.chunks_per_side", "must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(TerrainError::invalid("layout.chunk_size", "must be at least 1"));
        }
        if self.chunk_height == 0 {
            return Err(TerrainError::invalid("layout.chunk_height", "must be at least 1"));
        }
        // Chunk offsets are signed grid coordinates.
        match self.chunks_per_side.checked_mul(self.chunk_size) {
            Some(size) if size <= i32::MAX as u32 => {}
            _ => {
                return Err(TerrainError::invalid(
                    "layout.chunks_per_side",
                    format!(
                        "{} x chunk size {} exceeds {} units",
                        self.chunks_per_side,
                        self.chunk_size,
                        i32::MAX
                    ),
                ))
            }
        }
        check_finite("layout.threshold", self.threshold)
    }
}

/// Complete description of one island: noise, chunking and biome palette.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IslandConfig {
    pub noise: NoiseConfig,
    pub layout: ChunkLayout,
    pub biomes: BiomeTable,
}

impl IslandConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: IslandConfig = serde_json::from_str(text)?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Align the falloff domain with the chunk grid so the island edge sinks
    /// exactly at the outer chunks.
    pub fn with_synced_world_size(mut self) -> Self {
        let size = self.layout.island_size();
        self.noise.world_width = size;
        self.noise.world_height = size;
        self
    }

    pub fn sanitized(mut self) -> Self {
        self.noise = self.noise.sanitized();
        self
    }

    /// Eager check run before any generation work.
    pub fn validate(&self) -> Result<()> {
        self.noise.validate()?;
        self.layout.validate()?;
        self.biomes.validate()
    }
}

fn check_finite(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TerrainError::invalid(field, format!("must be finite, got {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(IslandConfig::default().validate().is_ok());
    }

    #[test]
    fn test_scale_guard() {
        let mut config = NoiseConfig::default();
        config.scale = -1.0;
        assert_eq!(config.effective_scale(), MIN_NOISE_SCALE);
        config.scale = 0.0;
        assert_eq!(config.effective_scale(), MIN_NOISE_SCALE);
        config.scale = 12.5;
        assert_eq!(config.effective_scale(), 12.5);
    }

    #[test]
    fn test_sanitized_clamps_editor_ranges() {
        let config = NoiseConfig {
            lacunarity: 0.25,
            mix: 1.5,
            persistence: -0.2,
            ..NoiseConfig::default()
        }
        .sanitized();
        assert_eq!(config.lacunarity, 1.0);
        assert_eq!(config.mix, 1.0);
        assert_eq!(config.persistence, 0.0);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let mut layout = ChunkLayout::default();
        layout.chunk_height = 0;
        match layout.validate() {
            Err(TerrainError::InvalidConfig { field, .. }) => assert_eq!(field, "layout.chunk_height"),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }

        let mut noise = NoiseConfig::default();
        noise.world_width = 0;
        assert!(noise.validate().is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut config = IslandConfig::default();
        config.layout.threshold = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_island_size_fits_signed_offsets() {
        let mut layout = ChunkLayout {
            chunks_per_side: 1 << 16,
            chunk_size: 1 << 15,
            ..ChunkLayout::default()
        };
        // 2^31 fits a u32 but not an i32 grid offset.
        match layout.validate() {
            Err(TerrainError::InvalidConfig { field, .. }) => assert_eq!(field, "layout.chunks_per_side"),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
        layout.chunk_size = (1 << 15) - 1;
        assert!(layout.validate().is_ok());

        layout.chunks_per_side = u32::MAX;
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_synced_world_size() {
        let mut config = IslandConfig::default();
        config.layout.chunks_per_side = 3;
        config.layout.chunk_size = 10;
        let config = config.with_synced_world_size();
        assert_eq!(config.noise.world_width, 30);
        assert_eq!(config.noise.world_height, 30);
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let config = IslandConfig::from_json_str(r#"{ "noise": { "seed": 42 }, "layout": { "chunk_size": 8 } }"#)
            .unwrap();
        assert_eq!(config.noise.seed, 42);
        assert_eq!(config.noise.octaves, NoiseConfig::default().octaves);
        assert_eq!(config.layout.chunk_size, 8);
        assert_eq!(config.layout.chunk_height, 32);
        assert_eq!(config.biomes, BiomeTable::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = IslandConfig::default();
        let text = config.to_json_string().unwrap();
        assert_eq!(IslandConfig::from_json_str(&text).unwrap(), config);
    }
}
