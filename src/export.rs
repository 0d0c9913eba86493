//! Output products: 2D previews as PNG and chunk meshes as Wavefront OBJ.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::biomes::{BiomeTable, Color};
use crate::chunks::{ChunkMesh, MeshSink};
use crate::error::Result;
use crate::tilemap::Tilemap;

/// Grayscale preview: each value lerps black -> white, clamped to 0.0-1.0.
pub fn noise_map_image(map: &Tilemap<f32>) -> RgbImage {
    let colors = map.map(|&v| Color::BLACK.lerp(Color::WHITE, v));
    color_map_image(&colors)
}

/// Classify every pixel of a noise map with the biome palette.
pub fn color_map(map: &Tilemap<f32>, biomes: &BiomeTable) -> Tilemap<Color> {
    map.map(|&v| biomes.color_for(v))
}

pub fn color_map_image(colors: &Tilemap<Color>) -> RgbImage {
    let mut img: RgbImage = ImageBuffer::new(colors.width as u32, colors.height as u32);
    for (x, y, color) in colors.iter() {
        img.put_pixel(x as u32, y as u32, Rgb(color.to_rgb8()));
    }
    img
}

/// Save a grayscale noise preview as PNG.
pub fn export_noise_map(map: &Tilemap<f32>, path: impl AsRef<Path>) -> Result<()> {
    noise_map_image(map).save(path)?;
    Ok(())
}

/// Save a biome-colored preview as PNG.
pub fn export_color_map(map: &Tilemap<f32>, biomes: &BiomeTable, path: impl AsRef<Path>) -> Result<()> {
    color_map_image(&color_map(map, biomes)).save(path)?;
    Ok(())
}

/// Streams chunks into a single OBJ file, one object per chunk.
///
/// Vertices are translated by the chunk's world position and carry their
/// color as the common `v x y z r g b` extension.
pub struct ObjWriter<W: Write> {
    writer: W,
    /// OBJ indices are global and 1-based
    vertices_written: usize,
}

impl ObjWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> ObjWriter<W> {
    pub fn new(mut writer: W) -> Result<Self> {
        writeln!(writer, "# island_generator marching cubes terrain")?;
        Ok(Self {
            writer,
            vertices_written: 0,
        })
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> MeshSink for ObjWriter<W> {
    fn accept(&mut self, chunk: ChunkMesh) -> Result<()> {
        let mesh = &chunk.mesh;
        if mesh.is_empty() {
            return Ok(());
        }

        writeln!(self.writer, "o chunk_{}_{}", chunk.coord.x, chunk.coord.z)?;
        for (vertex, color) in mesh.vertices.iter().zip(&mesh.colors) {
            let p = *vertex + chunk.world_position;
            writeln!(
                self.writer,
                "v {} {} {} {:.4} {:.4} {:.4}",
                p.x, p.y, p.z, color.r, color.g, color.b
            )?;
        }
        for tri in mesh.triangles.chunks_exact(3) {
            let base = self.vertices_written + 1;
            writeln!(
                self.writer,
                "f {} {} {}",
                base + tri[0] as usize,
                base + tri[1] as usize,
                base + tri[2] as usize
            )?;
        }
        self.vertices_written += mesh.vertices.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::ChunkCoord;
    use crate::marching_cubes::MeshBuffers;
    use glam::Vec3;

    fn triangle_chunk(x: u32, z: u32, offset: Vec3) -> ChunkMesh {
        ChunkMesh {
            coord: ChunkCoord::new(x, z),
            world_position: offset,
            mesh: MeshBuffers {
                vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
                triangles: vec![0, 1, 2],
                colors: vec![Color::WHITE; 3],
            },
        }
    }

    #[test]
    fn test_noise_map_grayscale() {
        let mut map = Tilemap::new_with(2, 1, 0.0f32);
        map.set(1, 0, 1.0);
        let img = noise_map_image(&map);
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_noise_map_clamps_out_of_range() {
        let mut map = Tilemap::new_with(2, 1, -4.0f32);
        map.set(1, 0, 3.0);
        let img = noise_map_image(&map);
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_color_map_uses_palette() {
        let biomes = BiomeTable::default();
        let map = Tilemap::from_fn(3, 1, |x, _| x as f32 * 0.5);
        let colors = color_map(&map, &biomes);
        assert_eq!(*colors.get(0, 0), biomes.color_for(0.0));
        assert_eq!(*colors.get(2, 0), biomes.color_for(1.0));
        let img = color_map_image(&colors);
        assert_eq!(img.dimensions(), (3, 1));
    }

    #[test]
    fn test_obj_indices_continue_across_chunks() {
        let mut writer = ObjWriter::new(Vec::new()).unwrap();
        writer.accept(triangle_chunk(0, 0, Vec3::ZERO)).unwrap();
        writer.accept(triangle_chunk(0, 1, Vec3::new(-2.0, 0.0, 3.0))).unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();

        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces, vec!["f 1 2 3", "f 4 5 6"]);
        assert!(text.contains("o chunk_0_1"));
        assert!(text.contains("v -1 0 3 1.0000 1.0000 1.0000"));
    }

    #[test]
    fn test_obj_skips_empty_chunks() {
        let mut writer = ObjWriter::new(Vec::new()).unwrap();
        writer
            .accept(ChunkMesh {
                coord: ChunkCoord::new(1, 1),
                world_position: Vec3::ZERO,
                mesh: MeshBuffers::new(),
            })
            .unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(!text.contains("o chunk"));
    }
}
