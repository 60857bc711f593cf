// https://en.wikipedia.org/wiki/TIFF#TIFF_Compression_Tag
// https://exiftool.org/TagNames/EXIF.html#Compression
// https://github.com/image-rs/image-tiff/blob/master/src/decoder/mod.rs

use num_enum::{FromPrimitive, IntoPrimitive};
use num_traits::WrappingAdd;
use salzweg::decoder::{DecodingError, TiffStyleDecoder};
use std::io::{self, Read};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecompressError {
    #[error("LZW: {0:?}")]
    LzwError(DecodingError),
    #[error("PackBits stream ended early")]
    PackBitsTruncated,
    #[error("compression {0:?} not supported")]
    CompressionNotSupported(Compression),
    #[error("predictor {0:?} not supported")]
    PredictorNotSupported(Predictor),
    #[error("JPEG: {0}")]
    JpegError(String),
    #[error(transparent)]
    IoError(#[from] io::Error),
}

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum Compression {
    Uncompressed = 1,
    CCITT1D = 2,
    T4Group3Fax = 3,
    T6Group4Fax = 4,
    Lzw = 5,
    JpegOld = 6,
    Jpeg = 7,
    DeflateAdobe = 8,
    PackBits = 32773,
    Deflate = 32946,
    ESRILerc = 34887,
    LZMA2 = 34925,
    Zstd = 34926,
    WebP = 34927,
    JPEGXL = 52546,

    #[num_enum(default)]
    Unknown = 0x0000,
}

impl Compression {
    /// Decode a tile that does not need any shared tables.
    ///
    /// JPEG tiles are handled by the level, which owns the JPEGTables tag.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, DecompressError> {
        match self {
            Self::Uncompressed => Ok(bytes.to_vec()),
            Self::Lzw => TiffStyleDecoder::decode_to_vec(bytes).map_err(DecompressError::LzwError),
            Self::DeflateAdobe | Self::Deflate => {
                let mut buf = vec![];
                flate2::read::ZlibDecoder::new(bytes).read_to_end(&mut buf)?;
                Ok(buf)
            }
            Self::PackBits => unpack_bits(bytes),
            other => Err(DecompressError::CompressionNotSupported(*other)),
        }
    }
}

fn unpack_bits(bytes: &[u8]) -> Result<Vec<u8>, DecompressError> {
    let mut out = Vec::with_capacity(bytes.len() * 2);
    let mut i = 0;
    while i < bytes.len() {
        let n = bytes[i] as i8;
        i += 1;
        match n {
            0..=127 => {
                let len = n as usize + 1;
                let literal = bytes
                    .get(i..i + len)
                    .ok_or(DecompressError::PackBitsTruncated)?;
                out.extend_from_slice(literal);
                i += len;
            }
            -127..=-1 => {
                let value = *bytes.get(i).ok_or(DecompressError::PackBitsTruncated)?;
                let count = (1 - n as isize) as usize;
                out.extend(std::iter::repeat(value).take(count));
                i += 1;
            }
            -128 => {} // no-op
        }
    }
    Ok(out)
}

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum Predictor {
    No = 1,
    Horizontal = 2,
    FloatingPoint = 3,

    #[num_enum(default)]
    Unknown = 0x0000,
}

impl Predictor {
    /// Undo prediction in place over decoded samples laid out row by row.
    pub fn predict<T: WrappingAdd + Copy>(
        &self,
        samples: &mut [T],
        width: usize,
        samples_per_pixel: usize,
    ) -> Result<(), DecompressError> {
        match self {
            Self::No => {}
            Self::Horizontal => {
                let row_len = width * samples_per_pixel;
                if row_len == 0 {
                    return Ok(());
                }
                for row in samples.chunks_mut(row_len) {
                    for i in samples_per_pixel..row.len() {
                        row[i] = row[i].wrapping_add(&row[i - samples_per_pixel]);
                    }
                }
            }
            other => return Err(DecompressError::PredictorNotSupported(*other)),
        }
        Ok(())
    }
}
