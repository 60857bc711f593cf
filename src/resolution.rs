//! Zoom level to preview resolution lookup.

use std::fmt::Display;

/// Overview level the used-resolution marker starts at.
///
/// Zoom levels below 12 map to overview 12, so the first evaluation with a
/// selected raster always fetches.
pub const INITIAL_OVERVIEW_LEVEL: u8 = 6;

/// Discrete preview resolution derived from a zoom level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolutionBucket {
    pub overview_level: u8,
    /// Ground units per pixel
    pub target_resolution: f64,
}

/// (exclusive upper zoom bound, overview level, target resolution)
const BUCKETS: [(f64, u8, f64); 5] = [
    (12.0, 12, 1000.0),
    (15.0, 15, 100.0),
    (16.0, 16, 10.0),
    (18.0, 17, 1.0),
    (19.0, 18, 0.1),
];
const FINEST: (u8, f64) = (19, 0.04);

/// Map a zoom level onto its resolution bucket, first matching band wins.
///
/// NaN compares false against every bound and lands in the finest bucket.
pub fn bucket_for_zoom(zoom: f64) -> ResolutionBucket {
    let (overview_level, target_resolution) = BUCKETS
        .iter()
        .find(|(upper, _, _)| zoom < *upper)
        .map(|&(_, level, resolution)| (level, resolution))
        .unwrap_or(FINEST);
    ResolutionBucket {
        overview_level,
        target_resolution,
    }
}

impl Display for ResolutionBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "overview {} @ {} per pixel",
            self.overview_level, self.target_resolution
        )
    }
}
