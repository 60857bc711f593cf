//! Raster reading seam between the preview controller and concrete decoders.

use crate::catalog::RasterReference;
use crate::error::PreviewResult;
use crate::raster::Bands;
use futures::future::BoxFuture;

mod cog;

pub use cog::{CogHandle, CogSource, CogSourceConfig};

/// Requested ground resolution of a band read, in ground units per pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReadOptions {
    pub target_resolution_x: f64,
    pub target_resolution_y: f64,
}

impl ReadOptions {
    /// Same resolution on both axes
    pub fn uniform(resolution: f64) -> Self {
        Self {
            target_resolution_x: resolution,
            target_resolution_y: resolution,
        }
    }
}

/// Opens rasters by reference.
pub trait RasterSource: Send + Sync {
    fn open(&self, reference: &RasterReference)
        -> BoxFuture<'static, PreviewResult<Box<dyn RasterHandle>>>;
}

/// An opened raster.
pub trait RasterHandle: Send + Sync {
    fn read_bands(&self, options: ReadOptions) -> BoxFuture<'_, PreviewResult<Bands>>;
}
