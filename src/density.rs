//! Chunk density grids
//!
//! A chunk of `size` x `height` cubes needs `(size + 1) x (height + 1) x
//! (size + 1)` corner samples. The extra row and column overlap the
//! neighbouring chunk so both sides read identical boundary values.

use glam::IVec3;

use crate::noise_field::HeightSource;

/// Signed distance above the terrain surface at every cube corner.
/// Negative = below ground (solid), positive = air.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityGrid {
    size_x: usize,
    size_y: usize,
    size_z: usize,
    /// Indexed `[x][z][y]` flattened so each column is contiguous
    values: Vec<f32>,
}

impl DensityGrid {
    /// Grid filled with a constant.
    pub fn new_with(size_x: usize, size_y: usize, size_z: usize, value: f32) -> Self {
        Self {
            size_x,
            size_y,
            size_z,
            values: vec![value; size_x * size_y * size_z],
        }
    }

    /// Sample the surface over a chunk footprint.
    ///
    /// `chunk_offset` is the chunk's corner in grid space (y is ignored);
    /// sampled world positions are `chunk_offset.x + x`, `chunk_offset.z + z`
    /// for x, z in `0..=chunk_size`.
    pub fn build(
        source: &impl HeightSource,
        chunk_offset: IVec3,
        chunk_size: u32,
        chunk_height: u32,
    ) -> Self {
        let corners_xz = chunk_size as usize + 1;
        let corners_y = chunk_height as usize + 1;
        let mut grid = Self::new_with(corners_xz, corners_y, corners_xz, 0.0);

        for x in 0..corners_xz {
            for z in 0..corners_xz {
                let global_x = chunk_offset.x as f32 + x as f32;
                let global_z = chunk_offset.z as f32 + z as f32;
                let surface = source.height_at(global_x, global_z) * chunk_height as f32;

                for y in 0..corners_y {
                    grid.set(x, y, z, y as f32 - surface);
                }
            }
        }

        grid
    }

    /// Corner counts along (x, y, z).
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.size_x, self.size_y, self.size_z)
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        assert!(
            x < self.size_x && y < self.size_y && z < self.size_z,
            "corner ({}, {}, {}) outside {}x{}x{} grid",
            x,
            y,
            z,
            self.size_x,
            self.size_y,
            self.size_z
        );
        (x * self.size_z + z) * self.size_y + y
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
        self.values[self.index(x, y, z)]
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f32) {
        let idx = self.index(x, y, z);
        self.values[idx] = value;
    }

    /// All densities of one vertical column, bottom to top.
    pub fn column(&self, x: usize, z: usize) -> &[f32] {
        let start = self.index(x, 0, z);
        &self.values[start..start + self.size_y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoiseConfig;
    use crate::noise_field::NoiseField;

    #[test]
    fn test_dimensions_include_overlap() {
        let grid = DensityGrid::build(&|_: f32, _: f32| 0.5f32, IVec3::ZERO, 4, 8);
        assert_eq!(grid.dimensions(), (5, 9, 5));
    }

    #[test]
    fn test_density_is_height_minus_surface() {
        let grid = DensityGrid::build(&|_: f32, _: f32| 0.5f32, IVec3::ZERO, 4, 8);
        for y in 0..=8 {
            assert_eq!(grid.get(2, y, 3), y as f32 - 4.0);
        }
    }

    #[test]
    fn test_columns_increase_with_y() {
        let field = NoiseField::new(&NoiseConfig::default());
        let grid = DensityGrid::build(&field, IVec3::new(96, 0, 112), 16, 32);
        for x in 0..=16 {
            for z in 0..=16 {
                let column = grid.column(x, z);
                assert!(column.windows(2).all(|w| w[1] > w[0]));
            }
        }
    }

    #[test]
    fn test_samples_use_global_coordinates() {
        let grid = DensityGrid::build(&|x: f32, z: f32| (x + 100.0 * z) / 1000.0, IVec3::new(8, 0, 4), 2, 10);
        // Corner (1, 0, 2) samples world (9, 6): surface = 0.609 * 10
        assert!((grid.get(1, 0, 2) + 6.09).abs() < 1e-4);
    }

    #[test]
    fn test_adjacent_chunks_share_boundary() {
        let config = NoiseConfig {
            seed: 77,
            world_width: 64,
            world_height: 64,
            scale: 9.0,
            ..NoiseConfig::default()
        };
        let field = NoiseField::new(&config);
        let size = 16;
        let west = DensityGrid::build(&field, IVec3::new(16, 0, 32), size, 24);
        let east = DensityGrid::build(&field, IVec3::new(32, 0, 32), size, 24);
        let north = DensityGrid::build(&field, IVec3::new(16, 0, 48), size, 24);

        for i in 0..=size as usize {
            assert_eq!(west.column(size as usize, i), east.column(0, i));
            assert_eq!(west.column(i, size as usize), north.column(i, 0));
        }
    }
}
