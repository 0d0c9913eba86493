//! Island terrain generation library
//!
//! Fractal noise shaped into an island, sampled into chunked density grids
//! and turned into colored triangle meshes with marching cubes.

pub mod biomes;
pub mod chunks;
pub mod config;
pub mod density;
pub mod error;
pub mod export;
pub mod marching_cubes;
pub mod noise_field;
pub mod tilemap;

pub use chunks::{ChunkCoord, ChunkGrid, ChunkMesh, GenerationStats, MeshSink};
pub use config::{ChunkLayout, IslandConfig, NoiseConfig};
pub use error::{Result, TerrainError};
