use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use island_generator::export::{export_color_map, export_noise_map, ObjWriter};
use island_generator::noise_field::{generate_noise_map, NoiseField};
use island_generator::{ChunkGrid, IslandConfig, Result};

/// What to produce from the island field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DrawMode {
    /// Grayscale PNG of the raw island field
    NoiseMap,
    /// PNG colored by the biome palette
    ColorMap,
    /// Marching cubes chunk meshes written as OBJ
    Terrain3d,
}

#[derive(Parser, Debug)]
#[command(name = "island_generator")]
#[command(about = "Generate procedural island terrain with marching cubes")]
struct Args {
    /// Output product
    #[arg(short, long, value_enum, default_value = "terrain3d")]
    mode: DrawMode,

    /// Output file (PNG for previews, OBJ for terrain)
    #[arg(short, long)]
    output: Option<String>,

    /// JSON config file; command-line values override it
    #[arg(short, long)]
    config: Option<String>,

    /// Write the effective config as JSON and exit
    #[arg(long)]
    dump_config: Option<String>,

    /// Noise seed (random if neither this nor the config sets one)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Chunks along each side of the island
    #[arg(long)]
    chunks: Option<u32>,

    /// Cubes per chunk along x and z
    #[arg(long)]
    chunk_size: Option<u32>,

    /// Cubes per chunk along y
    #[arg(long)]
    chunk_height: Option<u32>,

    /// Iso threshold for the surface
    #[arg(long)]
    threshold: Option<f32>,

    /// Noise scale (<= 0 is treated as a tiny positive scale)
    #[arg(long)]
    scale: Option<f32>,

    /// Number of noise octaves
    #[arg(long)]
    octaves: Option<u32>,

    /// Blend between fractal noise (0) and the radial island shape (1)
    #[arg(long)]
    mix: Option<f32>,

    /// Keep the config's world size instead of matching it to the chunk grid
    #[arg(long)]
    keep_world_size: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = build_config(args)?;
    config.validate()?;

    if let Some(ref path) = args.dump_config {
        std::fs::write(path, config.to_json_string()?)?;
        println!("Wrote config to {}", path);
        return Ok(());
    }

    println!("Generating island with seed: {}", config.noise.seed);
    println!(
        "Island: {}x{} chunks of {}x{}x{} ({} units across)",
        config.layout.chunks_per_side,
        config.layout.chunks_per_side,
        config.layout.chunk_size,
        config.layout.chunk_height,
        config.layout.chunk_size,
        config.layout.island_size()
    );

    match args.mode {
        DrawMode::NoiseMap | DrawMode::ColorMap => {
            let field = NoiseField::new(&config.noise.clone().sanitized());
            let width = field.config().world_width as usize;
            let height = field.config().world_height as usize;

            println!("Sampling {}x{} noise map...", width, height);
            let map = generate_noise_map(&field, width, height);
            if let Some((min_v, max_v)) = map.min_max() {
                let above = map.iter().filter(|(_, _, v)| **v > 0.0).count();
                println!(
                    "Noise range: {:.3} to {:.3} ({:.1}% above zero)",
                    min_v,
                    max_v,
                    100.0 * above as f64 / (width * height) as f64
                );
            }

            if args.mode == DrawMode::NoiseMap {
                let path = args.output.as_deref().unwrap_or("island_noise.png");
                export_noise_map(&map, path)?;
                println!("Saved noise map to {}", path);
            } else {
                let path = args.output.as_deref().unwrap_or("island_biomes.png");
                export_color_map(&map, &config.biomes, path)?;
                println!("Saved color map to {}", path);
            }
        }
        DrawMode::Terrain3d => {
            let path = args.output.as_deref().unwrap_or("island.obj");
            let grid = ChunkGrid::from_config(&config)?;

            println!("Meshing {} chunks...", grid.layout().chunk_count());
            let mut writer = ObjWriter::create(path)?;
            let stats = grid.generate_into(&mut writer)?;
            writer.finish()?;

            println!(
                "Meshed {} chunks ({} empty): {} vertices, {} triangles",
                stats.chunks, stats.empty_chunks, stats.vertices, stats.triangles
            );
            println!("Saved terrain mesh to {}", path);
        }
    }

    Ok(())
}

/// Defaults, then the config file, then command-line overrides.
fn build_config(args: &Args) -> Result<IslandConfig> {
    let mut config = match args.config {
        Some(ref path) => IslandConfig::from_json_file(path)?,
        None => {
            let mut config = IslandConfig::default();
            config.noise.seed = rand::random();
            config
        }
    };

    if let Some(seed) = args.seed { config.noise.seed = seed; }
    if let Some(chunks) = args.chunks { config.layout.chunks_per_side = chunks; }
    if let Some(size) = args.chunk_size { config.layout.chunk_size = size; }
    if let Some(height) = args.chunk_height { config.layout.chunk_height = height; }
    if let Some(threshold) = args.threshold { config.layout.threshold = threshold; }
    if let Some(scale) = args.scale { config.noise.scale = scale; }
    if let Some(octaves) = args.octaves { config.noise.octaves = octaves; }
    if let Some(mix) = args.mix { config.noise.mix = mix; }

    // Validate before the chunk grid is used to size the world.
    config.layout.validate()?;
    if !args.keep_world_size {
        config = config.with_synced_world_size();
    }
    Ok(config)
}
