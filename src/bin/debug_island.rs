//! Debug script to print the island biome map as ASCII
//!
//! Usage: debug_island [seed]

use island_generator::biomes::BiomeTable;
use island_generator::noise_field::{generate_noise_map, NoiseField};
use island_generator::{ChunkLayout, IslandConfig};

fn main() {
    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(12345u64);

    let mut config = IslandConfig::default();
    config.noise.seed = seed;
    config.layout = ChunkLayout {
        chunks_per_side: 8,
        chunk_size: 12,
        ..ChunkLayout::default()
    };
    let config = config.with_synced_world_size();

    let field = NoiseField::new(&config.noise);
    let size = config.layout.island_size() as usize;
    let map = generate_noise_map(&field, size, size);
    let biomes = &config.biomes;

    println!("=== ISLAND DEBUG MAP ({}x{}) seed={} ===", size, size, seed);
    print_legend(biomes);
    println!();

    let mut counts = vec![0usize; biomes.bands().len() + 1];
    // Every other row keeps the map roughly square in a terminal.
    for y in (0..size).step_by(2) {
        let mut line = String::with_capacity(size);
        for x in 0..size {
            let h = *map.get(x, y);
            let idx = biomes.band_index(h);
            counts[idx.unwrap_or(biomes.bands().len())] += 1;
            line.push(band_char(biomes, idx));
        }
        println!("{}", line);
    }

    println!();
    println!("BAND COUNTS (sampled rows):");
    for (i, band) in biomes.bands().iter().enumerate() {
        println!("  {:<14} {:>6}", band.name, counts[i]);
    }
    println!("  {:<14} {:>6}", "(unmatched)", counts[biomes.bands().len()]);
}

fn band_char(biomes: &BiomeTable, idx: Option<usize>) -> char {
    match idx {
        Some(i) => biomes.bands()[i].name.chars().next().unwrap_or('?'),
        None => ' ',
    }
}

fn print_legend(biomes: &BiomeTable) {
    println!("LEGEND:");
    if biomes.is_empty() {
        println!("  (no bands, every cell unmatched)");
        return;
    }
    for (i, band) in biomes.bands().iter().enumerate() {
        println!("  {} = {} (<= {:.2})", band_char(biomes, Some(i)), band.name, band.height);
    }
}
