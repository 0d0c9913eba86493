//! Chunk grid orchestration
//!
//! Lays the island out as `chunks_per_side` x `chunks_per_side` chunks
//! centered on the origin, then builds and meshes each one. Chunks only read
//! the shared noise field and palette, so they are generated in parallel
//! with rayon and reported in row-major order with explicit coordinates.

use glam::{IVec3, Vec3};
use log::{debug, info};
use rayon::prelude::*;

use crate::biomes::BiomeTable;
use crate::config::{ChunkLayout, IslandConfig};
use crate::density::DensityGrid;
use crate::error::Result;
use crate::marching_cubes::{mesh_chunk, MeshBuffers};
use crate::noise_field::{HeightSource, NoiseField};

/// Meshes in flight per rayon worker when streaming into a sink.
const CHUNKS_PER_THREAD: usize = 4;

/// Integer chunk index on the island grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: u32,
    pub z: u32,
}

impl ChunkCoord {
    pub fn new(x: u32, z: u32) -> Self {
        Self { x, z }
    }

    /// Corner of this chunk in grid space, before centering. A validated
    /// layout keeps every offset within `i32`.
    pub fn grid_offset(&self, chunk_size: u32) -> IVec3 {
        IVec3::new((self.x * chunk_size) as i32, 0, (self.z * chunk_size) as i32)
    }

    /// World-space placement: grid offset shifted so the island is centered
    /// on the origin. y is always 0.
    pub fn world_position(&self, layout: &ChunkLayout) -> Vec3 {
        let offset = self.grid_offset(layout.chunk_size);
        let center = layout.island_size() as f32 / 2.0;
        Vec3::new(offset.x as f32 - center, 0.0, offset.z as f32 - center)
    }
}

/// One finished chunk, ready to hand to a renderer or collider.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkMesh {
    pub coord: ChunkCoord,
    pub world_position: Vec3,
    pub mesh: MeshBuffers,
}

/// Receives finished chunks. The generator never renders, instantiates
/// scene objects or manages their lifetimes; a sink does.
pub trait MeshSink {
    fn accept(&mut self, chunk: ChunkMesh) -> Result<()>;
}

impl MeshSink for Vec<ChunkMesh> {
    fn accept(&mut self, chunk: ChunkMesh) -> Result<()> {
        self.push(chunk);
        Ok(())
    }
}

/// Totals over one generation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub chunks: usize,
    pub empty_chunks: usize,
    pub vertices: usize,
    pub triangles: usize,
}

impl GenerationStats {
    fn record(&mut self, mesh: &MeshBuffers) {
        self.chunks += 1;
        if mesh.is_empty() {
            self.empty_chunks += 1;
        }
        self.vertices += mesh.vertices.len();
        self.triangles += mesh.triangle_count();
    }
}

/// Drives density building and meshing for every chunk of an island.
pub struct ChunkGrid<S: HeightSource = NoiseField> {
    layout: ChunkLayout,
    source: S,
    biomes: BiomeTable,
}

impl ChunkGrid<NoiseField> {
    /// Validate the config and build the noise field it describes.
    pub fn from_config(config: &IslandConfig) -> Result<Self> {
        config.validate()?;
        let config = config.clone().sanitized();
        Ok(Self {
            layout: config.layout,
            source: NoiseField::new(&config.noise),
            biomes: config.biomes,
        })
    }
}

impl<S: HeightSource> ChunkGrid<S> {
    /// Grid over an arbitrary height source.
    pub fn with_source(layout: ChunkLayout, source: S, biomes: BiomeTable) -> Result<Self> {
        layout.validate()?;
        biomes.validate()?;
        Ok(Self { layout, source, biomes })
    }

    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn biomes(&self) -> &BiomeTable {
        &self.biomes
    }

    /// Every chunk coordinate in row-major (x outer, z inner) order.
    pub fn coords(&self) -> Vec<ChunkCoord> {
        let n = self.layout.chunks_per_side;
        (0..n)
            .flat_map(|x| (0..n).map(move |z| ChunkCoord::new(x, z)))
            .collect()
    }

    /// Build the density grid for one chunk.
    pub fn density(&self, coord: ChunkCoord) -> DensityGrid {
        DensityGrid::build(
            &self.source,
            coord.grid_offset(self.layout.chunk_size),
            self.layout.chunk_size,
            self.layout.chunk_height,
        )
    }

    /// Build and mesh one chunk. Depends only on `coord` and shared,
    /// read-only state.
    pub fn generate_chunk(&self, coord: ChunkCoord) -> Result<ChunkMesh> {
        let grid = self.density(coord);
        let mesh = mesh_chunk(
            &grid,
            self.layout.chunk_size,
            self.layout.chunk_height,
            self.layout.threshold,
            &self.biomes,
        )?;
        debug!(
            "chunk ({}, {}): {} vertices, {} triangles",
            coord.x,
            coord.z,
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        Ok(ChunkMesh {
            coord,
            world_position: coord.world_position(&self.layout),
            mesh,
        })
    }

    /// Generate every chunk in parallel; results come back in `coords()` order.
    pub fn generate(&self) -> Result<Vec<ChunkMesh>> {
        info!(
            "generating {} chunks ({}x{}x{} cubes each)",
            self.layout.chunk_count(),
            self.layout.chunk_size,
            self.layout.chunk_height,
            self.layout.chunk_size
        );
        let chunks = self
            .coords()
            .into_par_iter()
            .map(|coord| self.generate_chunk(coord))
            .collect::<Result<Vec<_>>>()?;
        info!("generated {} chunks", chunks.len());
        Ok(chunks)
    }

    /// Generate every chunk and hand each one to `sink` in `coords()` order.
    ///
    /// Chunks are meshed in parallel batches of a few per worker thread, and
    /// each batch is drained into the sink before the next starts, so at most
    /// one batch of meshes is held in memory.
    pub fn generate_into(&self, sink: &mut impl MeshSink) -> Result<GenerationStats> {
        let batch = rayon::current_num_threads() * CHUNKS_PER_THREAD;
        self.stream_batches(sink, batch)
    }

    fn stream_batches(&self, sink: &mut impl MeshSink, batch: usize) -> Result<GenerationStats> {
        info!(
            "streaming {} chunks in batches of {}",
            self.layout.chunk_count(),
            batch
        );
        let mut stats = GenerationStats::default();
        for coords in self.coords().chunks(batch.max(1)) {
            let meshes = coords
                .par_iter()
                .map(|&coord| self.generate_chunk(coord))
                .collect::<Result<Vec<_>>>()?;
            for chunk in meshes {
                stats.record(&chunk.mesh);
                sink.accept(chunk)?;
            }
        }
        info!(
            "{} vertices, {} triangles, {} empty chunks",
            stats.vertices, stats.triangles, stats.empty_chunks
        );
        Ok(stats)
    }
}
