use super::compression::DecompressError;
use crate::tiff::TiffError;
use std::io;
use thiserror::Error;

pub type CogResult<T> = Result<T, CogError>;

#[derive(Debug, Error)]
pub enum CogError {
    #[error("bad TIFF: {0}")]
    BadTiff(TiffError),
    #[error("no tiled levels found")]
    NoLevels,
    #[error("raster is not georeferenced")]
    NotGeoreferenced,
    #[error("invalid pixel scale {0:?}")]
    InvalidPixelScale((f64, f64)),
    #[error("invalid target resolution {0:?}")]
    InvalidResolution((f64, f64)),
    #[error("tile index {0} out of range (max {1})")]
    TileIndexOutOfRange(usize, usize),
    #[error("tile {0} was not fetched")]
    MissingTile(usize),
    #[error("tile decoded to {0} bytes, expected {1}")]
    TileSize(usize, usize),
    #[error("header larger than {0} bytes")]
    HeaderTooLarge(usize),
    #[error("{0} not supported")]
    NotSupported(String),
    #[error("read error: {0}")]
    ReadError(#[from] io::Error),
    #[error("decompression: {0}")]
    DecompressionError(#[from] DecompressError),
    #[error("join error: {0}")]
    AsyncJoinError(#[from] tokio::task::JoinError),
}

impl From<TiffError> for CogError {
    fn from(e: TiffError) -> Self {
        match e {
            TiffError::ReadError(io_error) => CogError::ReadError(io_error),
            tiff_error => CogError::BadTiff(tiff_error),
        }
    }
}
