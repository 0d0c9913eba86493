//! Marching cubes surface extraction
//!
//! Walks every unit cube of a chunk's density grid, classifies its eight
//! corners against the iso threshold and emits the triangles the lookup
//! table prescribes for that configuration.
//!
//! Vertices sit at the midpoint of each crossed edge (no density-weighted
//! interpolation) and are never shared: every triangle gets three fresh
//! vertices, appended in table order, so indices simply count upward.
//! Each vertex is colored from the biome table by its height in the chunk.

pub mod tables;

use glam::Vec3;

use crate::biomes::{BiomeTable, Color};
use crate::density::DensityGrid;
use crate::error::{Result, TerrainError};

use tables::{CORNERS, EDGES, END, MAX_TRIANGLES_PER_CUBE, TRIANGLES};

/// Triangle soup for one chunk, in chunk-local coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    pub vertices: Vec<Vec3>,
    /// Every consecutive triple is one triangle
    pub triangles: Vec<u32>,
    /// Parallel to `vertices`
    pub colors: Vec<Color>,
}

impl MeshBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// 8-bit case index: bit `i` is set when corner `i` lies above `threshold`.
pub fn configuration_index(corners: &[f32; 8], threshold: f32) -> u8 {
    let mut index = 0u8;
    for (i, &density) in corners.iter().enumerate() {
        if density > threshold {
            index |= 1 << i;
        }
    }
    index
}

/// Append the triangles for one cube at `position` (its minimum corner).
/// Returns how many triangles were emitted.
pub fn march_cube(
    position: Vec3,
    config_index: u8,
    chunk_height: u32,
    biomes: &BiomeTable,
    mesh: &mut MeshBuffers,
) -> usize {
    // Fully air or fully solid: no surface crosses this cube.
    if config_index == 0 || config_index == u8::MAX {
        return 0;
    }

    let edges = &TRIANGLES[config_index as usize];
    let mut emitted = 0;
    for triangle in edges.chunks_exact(3).take(MAX_TRIANGLES_PER_CUBE) {
        if triangle[0] == END {
            break;
        }
        for &edge in triangle {
            let vertex = position + edge_midpoint(edge as usize);
            mesh.triangles.push(mesh.vertices.len() as u32);
            mesh.vertices.push(vertex);
            mesh.colors.push(biomes.color_for(vertex.y / chunk_height as f32));
        }
        emitted += 1;
    }
    emitted
}

/// Midpoint of a cube edge, relative to the cube's minimum corner.
fn edge_midpoint(edge: usize) -> Vec3 {
    let [a, b] = EDGES[edge];
    (corner_offset(a) + corner_offset(b)) * 0.5
}

fn corner_offset(corner: usize) -> Vec3 {
    let [x, y, z] = CORNERS[corner];
    Vec3::new(x as f32, y as f32, z as f32)
}

/// Mesh a whole chunk.
///
/// The grid must have exactly `chunk_size + 1` corners along x and z and
/// `chunk_height + 1` along y; anything else is rejected before meshing.
pub fn mesh_chunk(
    grid: &DensityGrid,
    chunk_size: u32,
    chunk_height: u32,
    threshold: f32,
    biomes: &BiomeTable,
) -> Result<MeshBuffers> {
    let (gx, gy, gz) = grid.dimensions();
    let expected_xz = chunk_size as usize + 1;
    let expected_y = chunk_height as usize + 1;
    if gx != expected_xz || gz != expected_xz || gy != expected_y {
        return Err(TerrainError::GridMismatch {
            actual_x: gx,
            actual_y: gy,
            actual_z: gz,
            chunk_size,
            chunk_height,
            expected_xz,
            expected_y,
        });
    }

    let mut mesh = MeshBuffers::new();
    let mut corners = [0.0f32; 8];
    for x in 0..chunk_size as usize {
        for y in 0..chunk_height as usize {
            for z in 0..chunk_size as usize {
                for (i, [dx, dy, dz]) in CORNERS.iter().enumerate() {
                    corners[i] = grid.get(x + dx, y + dy, z + dz);
                }
                let index = configuration_index(&corners, threshold);
                march_cube(
                    Vec3::new(x as f32, y as f32, z as f32),
                    index,
                    chunk_height,
                    biomes,
                    &mut mesh,
                );
            }
        }
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::BiomeBand;
    use glam::IVec3;

    #[test]
    fn test_degenerate_configurations() {
        assert_eq!(configuration_index(&[-1.0; 8], 0.5), 0);
        assert_eq!(configuration_index(&[2.0; 8], 0.5), 255);
        // Equal to threshold counts as below.
        assert_eq!(configuration_index(&[0.5; 8], 0.5), 0);

        let biomes = BiomeTable::default();
        let mut mesh = MeshBuffers::new();
        assert_eq!(march_cube(Vec3::ZERO, 0, 8, &biomes, &mut mesh), 0);
        assert_eq!(march_cube(Vec3::ZERO, 255, 8, &biomes, &mut mesh), 0);
        assert!(mesh.is_empty());
        assert!(mesh.triangles.is_empty());
    }

    #[test]
    fn test_configuration_bits_follow_corner_order() {
        let mut corners = [0.0f32; 8];
        corners[0] = 1.0;
        corners[5] = 1.0;
        assert_eq!(configuration_index(&corners, 0.5), 0b0010_0001);
    }

    #[test]
    fn test_table_is_well_formed() {
        for (case, row) in TRIANGLES.iter().enumerate() {
            let used = row.iter().position(|&e| e == END).unwrap_or(row.len());
            assert!(used <= MAX_TRIANGLES_PER_CUBE * 3, "case {} uses {} edges", case, used);
            assert_eq!(used % 3, 0, "case {} has a partial triangle", case);
            assert!(row[used..].iter().all(|&e| e == END), "case {} continues after END", case);
            assert!(row[..used].iter().all(|&e| (0..12).contains(&e)));
        }
        assert_eq!(TRIANGLES[0][0], END);
        assert_eq!(TRIANGLES[255][0], END);
    }

    #[test]
    fn test_every_case_respects_triangle_bound() {
        let biomes = BiomeTable::default();
        for case in 0..=255u8 {
            let mut mesh = MeshBuffers::new();
            let emitted = march_cube(Vec3::ZERO, case, 1, &biomes, &mut mesh);
            assert!(emitted <= MAX_TRIANGLES_PER_CUBE);
            assert!(mesh.vertices.len() <= 15);
            assert_eq!(mesh.vertices.len(), emitted * 3);
            assert_eq!(mesh.colors.len(), mesh.vertices.len());
            if case != 0 && case != 255 {
                assert!(emitted > 0, "case {} emitted nothing", case);
            }
        }
    }

    #[test]
    fn test_table_edges_match_corner_crossings() {
        for case in 1..255usize {
            let above = |corner: usize| case & (1 << corner) != 0;
            let mut crossed = [false; 12];
            for (edge, &[a, b]) in EDGES.iter().enumerate() {
                crossed[edge] = above(a) != above(b);
            }

            let mut used = [false; 12];
            for &edge in TRIANGLES[case].iter().take_while(|&&e| e != END) {
                used[edge as usize] = true;
            }
            assert_eq!(used, crossed, "case {:#010b} cuts the wrong edges", case);
        }
    }

    #[test]
    fn test_closed_surface_is_watertight() {
        use std::collections::HashSet;

        // Sphere of radius 2.7 centered in an 8-cube chunk; air outside.
        let mut grid = DensityGrid::new_with(9, 9, 9, 0.0);
        let center = Vec3::splat(4.0);
        for x in 0..9 {
            for y in 0..9 {
                for z in 0..9 {
                    let p = Vec3::new(x as f32, y as f32, z as f32);
                    grid.set(x, y, z, p.distance(center) - 2.7);
                }
            }
        }
        let mesh = mesh_chunk(&grid, 8, 8, 0.0, &BiomeTable::default()).unwrap();
        assert!(mesh.triangle_count() > 0);

        // Midpoints land on half-integer coordinates, so doubling gives exact keys.
        let key = |i: u32| (mesh.vertices[i as usize] * 2.0).round().as_ivec3();
        let mut directed = HashSet::new();
        for tri in mesh.triangles.chunks_exact(3) {
            let [a, b, c] = [key(tri[0]), key(tri[1]), key(tri[2])];
            directed.insert((a, b));
            directed.insert((b, c));
            directed.insert((c, a));
        }
        let unmatched = directed.iter().filter(|(a, b)| !directed.contains(&(*b, *a))).count();
        assert_eq!(unmatched, 0, "{} open or flipped edges", unmatched);
    }

    #[test]
    fn test_single_corner_emits_midpoints() {
        let biomes = BiomeTable::default();
        let mut mesh = MeshBuffers::new();
        // Only corner 0 above the threshold.
        let emitted = march_cube(Vec3::new(2.0, 3.0, 4.0), 0b0000_0001, 8, &biomes, &mut mesh);
        assert_eq!(emitted, 1);
        assert_eq!(mesh.triangles, vec![0, 1, 2]);
        // Edges 0, 8, 3 around corner 0, each cut halfway.
        assert_eq!(
            mesh.vertices,
            vec![
                Vec3::new(2.5, 3.0, 4.0),
                Vec3::new(2.0, 3.5, 4.0),
                Vec3::new(2.0, 3.0, 4.5),
            ]
        );
    }

    #[test]
    fn test_indices_are_sequential_without_welding() {
        let grid = DensityGrid::build(&|x: f32, z: f32| 0.3 + 0.02 * x + 0.01 * z, IVec3::ZERO, 6, 10);
        let mesh = mesh_chunk(&grid, 6, 10, 0.0, &BiomeTable::default()).unwrap();
        assert!(!mesh.is_empty());
        let expected: Vec<u32> = (0..mesh.vertices.len() as u32).collect();
        assert_eq!(mesh.triangles, expected);
        assert_eq!(mesh.colors.len(), mesh.vertices.len());
    }

    #[test]
    fn test_flat_surface_end_to_end() {
        let chunk_size = 4;
        let chunk_height = 8;
        let grid = DensityGrid::build(&|_: f32, _: f32| 0.5f32, IVec3::ZERO, chunk_size, chunk_height);
        let biomes = BiomeTable::new(vec![
            BiomeBand::new("low", 0.25, Color::BLACK),
            BiomeBand::new("mid", 0.6, Color::rgb(0.2, 0.8, 0.2)),
            BiomeBand::new("high", 1.0, Color::WHITE),
        ]);
        let mesh = mesh_chunk(&grid, chunk_size, chunk_height, 0.5, &biomes).unwrap();

        // Target height 4: corners at y <= 4 read <= 0.5, y >= 5 read above it,
        // so only the layer of cubes at y = 4 is crossed, on its vertical edges.
        assert_eq!(mesh.triangle_count(), 2 * 16);
        for v in &mesh.vertices {
            assert_eq!(v.y, 4.5);
            assert!((0.0..=4.0).contains(&v.x) && (0.0..=4.0).contains(&v.z));
        }
        // 4.5 / 8 = 0.5625 falls in the "mid" band.
        assert!(mesh.colors.iter().all(|&c| c == Color::rgb(0.2, 0.8, 0.2)));
    }

    #[test]
    fn test_grid_mismatch_rejected() {
        let grid = DensityGrid::build(&|_: f32, _: f32| 0.5f32, IVec3::ZERO, 4, 8);
        match mesh_chunk(&grid, 5, 8, 0.5, &BiomeTable::default()) {
            Err(TerrainError::GridMismatch { expected_xz, actual_x, .. }) => {
                assert_eq!(expected_xz, 6);
                assert_eq!(actual_x, 5);
            }
            other => panic!("expected GridMismatch, got {:?}", other),
        }
        assert!(mesh_chunk(&grid, 4, 9, 0.5, &BiomeTable::default()).is_err());
    }
}
