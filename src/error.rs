use crate::catalog::RasterReference;
use crate::cog::CogError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type PreviewResult<T> = Result<T, PreviewError>;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("failed to open {reference}: {source}")]
    Open {
        reference: RasterReference,
        source: CogError,
    },
    #[error("failed to read bands: {0}")]
    Read(CogError),
    #[error("expected at least 3 bands, got {0}")]
    MissingBands(usize),
    #[error("band lengths {0:?} do not match the raster size")]
    BandLength(Vec<usize>),
    #[error("failed to load catalog {}: {source}", .path.display())]
    Catalog { path: PathBuf, source: io::Error },
    #[cfg(feature = "image")]
    #[error("image export: {0}")]
    Image(#[from] image::ImageError),
    #[error("{0} not supported")]
    NotSupported(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
