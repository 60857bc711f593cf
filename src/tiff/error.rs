use super::TagId;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TiffError {
    #[error("bad TIFF magic bytes")]
    BadMagicBytes,
    #[error("missing tag {0:?}")]
    MissingTag(TagId),
    #[error("bad tag {0:?}")]
    BadTag(TagId),
    #[error("IFD chain exceeds {0} entries")]
    TooManyIfds(usize),
    #[error("no IFDs")]
    NoIfds,
    #[error("read error: {0}")]
    ReadError(#[from] io::Error),
}

impl TiffError {
    /// True when the stream ended early, which usually means more bytes are needed.
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, TiffError::ReadError(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}
