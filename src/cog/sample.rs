use super::tiles::TileCache;
use super::{CogError, CogResult, Level};
use crate::raster::Bands;
use std::collections::HashMap;

/// Output pixels grouped by the tile they sample from.
///
/// tile index -> [((tile_x, tile_y), output_index)]
pub type PixelMap = HashMap<usize, Vec<((u32, u32), usize)>>;

/// Nearest neighbour sampling of `level` onto an output grid.
pub fn pixel_map(level: &Level, dimensions: (u32, u32)) -> PixelMap {
    let (width, height) = dimensions;
    let scale_x = level.width() as f64 / width as f64;
    let scale_y = level.height() as f64 / height as f64;
    let col_count = level.col_count();

    let mut pixel_map = PixelMap::new();
    for j in 0..height {
        let y = (((j as f64 + 0.5) * scale_y) as u32).min(level.height() - 1);
        let row = (y / level.tile_height) as usize;
        for i in 0..width {
            let x = (((i as f64 + 0.5) * scale_x) as u32).min(level.width() - 1);
            let col = (x / level.tile_width) as usize;
            let tile_pixel = (x % level.tile_width, y % level.tile_height);
            let output_index = j as usize * width as usize + i as usize;
            pixel_map
                .entry(row * col_count + col)
                .or_default()
                .push((tile_pixel, output_index));
        }
    }
    pixel_map
}

/// Scatter sampled tile pixels into red, green and blue bands.
///
/// Single band levels are copied into all three bands, extra bands are dropped.
pub fn assemble_rgb(
    level: &Level,
    pixel_map: &PixelMap,
    tile_cache: &TileCache,
    dimensions: (u32, u32),
) -> CogResult<Bands> {
    let spp = level.decoded_samples_per_pixel();
    let pixel_count = dimensions.0 as usize * dimensions.1 as usize;
    let mut red = vec![0u8; pixel_count];
    let mut green = vec![0u8; pixel_count];
    let mut blue = vec![0u8; pixel_count];

    for (index, pixels) in pixel_map {
        let tile = tile_cache.get(index).ok_or(CogError::MissingTile(*index))?;
        for &((x, y), output_index) in pixels {
            let start = (y as usize * level.tile_width as usize + x as usize) * spp;
            let sample = &tile[start..start + spp];
            if spp >= 3 {
                red[output_index] = sample[0];
                green[output_index] = sample[1];
                blue[output_index] = sample[2];
            } else {
                red[output_index] = sample[0];
                green[output_index] = sample[0];
                blue[output_index] = sample[0];
            }
        }
    }

    Ok(Bands::new(dimensions.0, dimensions.1, vec![red, green, blue]))
}
