//! Zoom-driven previews of Cloud Optimized GeoTIFFs.
//!
//! A [`controller::PreviewController`] watches the selected raster and the map
//! zoom, picks a preview resolution with [`resolution::bucket_for_zoom`] and
//! reads RGB bands at that resolution through a [`source::RasterSource`].

pub mod catalog;
pub mod cog;
pub mod config;
pub mod controller;
mod error;
pub mod io;
pub mod logging;
pub mod preview;
mod raster;
pub mod resolution;
pub mod shell;
pub mod source;
pub mod tiff;
pub mod viewport;

pub use catalog::{RasterCatalog, RasterReference, StaticCatalog};
pub use cog::{Cog, CogError};
pub use controller::{PreviewController, RefreshPolicy, RefreshStatus};
pub use error::{PreviewError, PreviewResult};
pub use preview::PreviewImage;
pub use raster::Bands;
pub use resolution::{bucket_for_zoom, ResolutionBucket};
pub use source::{CogSource, RasterHandle, RasterSource, ReadOptions};
pub use viewport::MapViewport;
