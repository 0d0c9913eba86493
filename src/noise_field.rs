//! Island height field: fractal Perlin noise blended with a radial shape
//!
//! The field is a pure function of its `NoiseConfig` and the query point.
//! Per-octave offsets are drawn once from a seeded ChaCha generator, so two
//! fields built from the same config agree bit-for-bit everywhere, which is
//! what keeps chunk borders seamless.

use glam::DVec2;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::NoiseConfig;
use crate::tilemap::Tilemap;

/// Octave offsets are drawn from [-RANGE, RANGE).
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Fraction of the theoretical fractal maximum treated as the ceiling.
/// Sums above it clamp to 1.0, so peaks are reachable without needing every
/// octave at its extreme.
const CEILING_FACTOR: f64 = 0.9;

/// Power applied to center distance for the edge falloff term.
const FALLOFF_EXPONENT: f32 = 30.0;

/// Every octave samples the same lattice; only the offsets differ.
const PRIMITIVE_SEED: u32 = 0;

/// Anything that can report a normalized surface height at a world position.
///
/// `NoiseField` is the production source; tests plug in closures.
pub trait HeightSource: Sync {
    /// Surface height at world (x, z), nominally 0.0-1.0 but may dip below
    /// zero near the island edge.
    fn height_at(&self, x: f32, z: f32) -> f32;
}

impl<F> HeightSource for F
where
    F: Fn(f32, f32) -> f32 + Sync,
{
    fn height_at(&self, x: f32, z: f32) -> f32 {
        self(x, z)
    }
}

/// One 2D offset per octave, derived deterministically from the seed.
#[derive(Clone, Debug, PartialEq)]
pub struct OctaveOffsetTable {
    offsets: Vec<DVec2>,
}

impl OctaveOffsetTable {
    pub fn new(seed: u64, octaves: u32, base: DVec2) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let offsets = (0..octaves)
            .map(|_| {
                let ox = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64 + base.x;
                let oy = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64 + base.y;
                DVec2::new(ox, oy)
            })
            .collect();
        Self { offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn get(&self, octave: usize) -> DVec2 {
        self.offsets[octave]
    }
}

/// Fractal noise plus island shaping, sampled in world coordinates.
pub struct NoiseField {
    config: NoiseConfig,
    scale: f64,
    offsets: OctaveOffsetTable,
    /// Sum of persistence^i over all octaves
    max_amplitude: f64,
    primitive: Perlin,
}

impl NoiseField {
    pub fn new(config: &NoiseConfig) -> Self {
        let offsets = OctaveOffsetTable::new(config.seed, config.octaves, config.offset.as_dvec2());

        let mut max_amplitude = 0.0;
        let mut amplitude = 1.0;
        for _ in 0..config.octaves {
            max_amplitude += amplitude;
            amplitude *= config.persistence as f64;
        }

        Self {
            config: config.clone(),
            scale: config.effective_scale() as f64,
            offsets,
            max_amplitude,
            primitive: Perlin::new(PRIMITIVE_SEED),
        }
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    pub fn octave_offsets(&self) -> &OctaveOffsetTable {
        &self.offsets
    }

    /// Blended island height at world (x, z).
    pub fn sample(&self, x: f32, z: f32) -> f32 {
        let noise = self.normalized_fractal(x, z);
        let d = self.center_distance(x, z);
        let falloff = d.powf(FALLOFF_EXPONENT);
        let shape = 1.0 - d;

        let t = self.config.mix.clamp(0.0, 1.0);
        let combined = noise + (shape - noise) * t;

        // Subtracting keeps interior amplitude intact while still sinking the rim.
        combined - falloff
    }

    /// Fractal sum at (x, z) scaled into 0.0-1.0 against the compressed ceiling.
    pub fn normalized_fractal(&self, x: f32, z: f32) -> f32 {
        if self.max_amplitude <= 0.0 {
            return 0.0;
        }

        let half_width = self.config.world_width as f64 / 2.0;
        let half_height = self.config.world_height as f64 / 2.0;
        let cx = (x as f64 - half_width) / self.scale;
        let cz = (z as f64 - half_height) / self.scale;

        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total = 0.0;
        for octave in 0..self.offsets.len() {
            let offset = self.offsets.get(octave);
            let sx = cx * frequency + offset.x;
            let sz = cz * frequency + offset.y;
            total += self.primitive_at(sx, sz) * amplitude;
            amplitude *= self.config.persistence as f64;
            frequency *= self.config.lacunarity as f64;
        }

        (total / (self.max_amplitude * CEILING_FACTOR)).clamp(0.0, 1.0) as f32
    }

    /// Euclidean distance from the world center with both axes mapped to [-1, 1].
    /// Corners of the world sit at sqrt(2).
    pub fn center_distance(&self, x: f32, z: f32) -> f32 {
        let nx = 2.0 * x / self.config.world_width as f32 - 1.0;
        let nz = 2.0 * z / self.config.world_height as f32 - 1.0;
        (nx * nx + nz * nz).sqrt()
    }

    /// Smooth noise remapped from [-1, 1] into [0, 1].
    fn primitive_at(&self, x: f64, z: f64) -> f64 {
        ((self.primitive.get([x, z]) + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

impl HeightSource for NoiseField {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        self.sample(x, z)
    }
}

/// Sample a source at every integer pixel of a `width` x `height` rectangle.
pub fn generate_noise_map(source: &impl HeightSource, width: usize, height: usize) -> Tilemap<f32> {
    Tilemap::from_fn(width, height, |x, y| source.height_at(x as f32, y as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_NOISE_SCALE;

    fn test_config() -> NoiseConfig {
        NoiseConfig {
            seed: 1337,
            scale: 20.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            mix: 0.3,
            world_width: 128,
            world_height: 128,
            ..NoiseConfig::default()
        }
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let a = NoiseField::new(&test_config());
        let b = NoiseField::new(&test_config());
        for &(x, z) in &[(0.0, 0.0), (17.0, 99.0), (64.0, 64.0), (127.5, 3.25), (-40.0, 500.0)] {
            assert_eq!(a.sample(x, z).to_bits(), b.sample(x, z).to_bits());
            assert_eq!(a.sample(x, z).to_bits(), a.sample(x, z).to_bits());
        }
    }

    #[test]
    fn test_offset_table_depends_on_seed() {
        let a = OctaveOffsetTable::new(1, 4, DVec2::ZERO);
        let b = OctaveOffsetTable::new(1, 4, DVec2::ZERO);
        let c = OctaveOffsetTable::new(2, 4, DVec2::ZERO);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 4);
        for i in 0..a.len() {
            let o = a.get(i);
            assert!(o.x >= -100_000.0 && o.x < 100_000.0);
            assert!(o.y >= -100_000.0 && o.y < 100_000.0);
        }
    }

    #[test]
    fn test_offset_table_adds_base_offset() {
        let plain = OctaveOffsetTable::new(9, 3, DVec2::ZERO);
        let shifted = OctaveOffsetTable::new(9, 3, DVec2::new(10.5, -2.0));
        for i in 0..3 {
            let delta = shifted.get(i) - plain.get(i);
            assert!((delta.x - 10.5).abs() < 1e-9);
            assert!((delta.y + 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_fractal_stays_normalized() {
        let field = NoiseField::new(&test_config());
        for x in (0..128).step_by(7) {
            for z in (0..128).step_by(5) {
                let v = field.normalized_fractal(x as f32, z as f32);
                assert!((0.0..=1.0).contains(&v), "fractal {} out of range", v);
            }
        }
    }

    #[test]
    fn test_zero_octaves_is_flat_zero_noise() {
        let config = NoiseConfig {
            octaves: 0,
            mix: 0.0,
            ..test_config()
        };
        let field = NoiseField::new(&config);
        assert!(field.octave_offsets().is_empty());
        assert_eq!(field.normalized_fractal(10.0, 20.0), 0.0);
        // Center of the world: no falloff, no noise.
        assert_eq!(field.sample(64.0, 64.0), 0.0);
    }

    #[test]
    fn test_pure_shape_decreases_from_center() {
        let config = NoiseConfig {
            mix: 1.0,
            ..test_config()
        };
        let field = NoiseField::new(&config);
        let center = 64.0;
        let mut previous = field.sample(center, center);
        assert!((previous - 1.0).abs() < 1e-6);
        for step in 1..=64 {
            let value = field.sample(center + step as f32, center);
            assert!(value < previous, "step {}: {} !< {}", step, value, previous);
            previous = value;
        }
        // At the edge d = 1: shape 0, falloff 1
        assert!((previous + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_falloff_sinks_corners() {
        let field = NoiseField::new(&test_config());
        for &(x, z) in &[(0.0, 0.0), (128.0, 0.0), (0.0, 128.0), (128.0, 128.0)] {
            assert!(field.sample(x, z) < -1000.0, "corner ({}, {}) not sunk", x, z);
        }
    }

    #[test]
    fn test_negative_scale_matches_epsilon() {
        let negative = NoiseField::new(&NoiseConfig {
            scale: -1.0,
            ..test_config()
        });
        let epsilon = NoiseField::new(&NoiseConfig {
            scale: MIN_NOISE_SCALE,
            ..test_config()
        });
        for &(x, z) in &[(3.0, 4.0), (60.0, 70.0), (100.0, 12.0)] {
            let v = negative.sample(x, z);
            assert!(v.is_finite());
            assert_eq!(v.to_bits(), epsilon.sample(x, z).to_bits());
        }
    }

    #[test]
    fn test_noise_map_matches_point_samples() {
        let field = NoiseField::new(&test_config());
        let map = generate_noise_map(&field, 16, 8);
        assert_eq!((map.width, map.height), (16, 8));
        assert_eq!(*map.get(5, 7), field.sample(5.0, 7.0));
    }
}
