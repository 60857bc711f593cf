use super::{CogResult, Level};
use crate::io::AsyncReadRange;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::*;

/// Decoded tiles of one level by tile index
pub type TileCache = HashMap<usize, Vec<u8>>;

pub async fn get_tiles_async(
    reader: Arc<dyn AsyncReadRange>,
    level: &Level,
    indices: Vec<usize>,
) -> CogResult<TileCache> {
    let mut tile_cache = TileCache::with_capacity(indices.len());

    let mut requests = Vec::with_capacity(indices.len());
    for index in indices {
        match level.tile_byte_range(index)? {
            Some((start, end)) => requests.push((index, start, end)),
            None => {
                tile_cache.insert(index, level.blank_tile());
            }
        }
    }
    debug!(
        "Fetching {} tiles ({} sparse)",
        requests.len(),
        tile_cache.len()
    );

    // Async tile reading (IO)
    let fetches = requests.into_iter().map(|(index, start, end)| {
        let reader = reader.clone();
        tokio::spawn(async move {
            reader
                .read_range_exact_async(start, end)
                .await
                .map(|bytes| (index, bytes))
        })
    });
    let mut tile_bytes = Vec::new();
    for result in futures::future::join_all(fetches).await {
        tile_bytes.push(result??);
    }

    // Parallel tile extraction (decompression)
    let level = level.clone();
    let decoded = tokio::task::spawn_blocking(move || {
        tile_bytes
            .into_par_iter()
            .map(|(index, bytes)| level.decode_tile(&bytes).map(|tile| (index, tile)))
            .collect::<CogResult<Vec<_>>>()
    })
    .await??;

    tile_cache.extend(decoded);
    Ok(tile_cache)
}
