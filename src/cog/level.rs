use super::compression::{Compression, DecompressError, Predictor};
use super::{CogError, CogResult};
use crate::tiff::{Endian, Ifd, TagId, TiffError};
use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt::Display;

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum Photometric {
    WhiteIsZero = 0,
    BlackIsZero = 1,
    Rgb = 2,
    Palette = 3,
    TransparencyMask = 4,
    Separated = 5,
    YCbCr = 6,

    #[num_enum(default)]
    Unknown = 0xFFFF,
}

/// One tiled image of a COG, the full resolution image or an overview.
#[derive(Clone, Debug)]
pub struct Level {
    pub dimensions: (u32, u32),
    pub tile_width: u32,
    pub tile_height: u32,
    pub compression: Compression,
    pub predictor: Predictor,
    pub interpretation: Photometric,
    pub samples_per_pixel: u16,
    pub bits_per_sample: u16,
    pub endian: Endian,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
    pub jpeg_tables: Option<Vec<u8>>,
}

impl Level {
    pub fn from_ifd(ifd: &Ifd, endian: Endian) -> CogResult<Self> {
        if !ifd.has_tag(TagId::TileWidth) {
            return Err(CogError::NotSupported("stripped (untiled) image".into()));
        }

        // Required tags
        let width: u32 = ifd.get_tag_value(TagId::ImageWidth)?;
        let height: u32 = ifd.get_tag_value(TagId::ImageHeight)?;
        let tile_width: u32 = ifd.get_tag_value(TagId::TileWidth)?;
        let tile_height: u32 = ifd.get_tag_value(TagId::TileLength)?;
        let offsets: Vec<u64> = ifd.get_tag_values(TagId::TileOffsets)?;
        let byte_counts: Vec<u64> = ifd.get_tag_values(TagId::TileByteCounts)?;

        // Optional tags
        let compression: Compression = ifd
            .get_tag_value::<u16>(TagId::Compression)
            .unwrap_or(1)
            .into();
        let predictor: Predictor = ifd
            .get_tag_value::<u16>(TagId::Predictor)
            .unwrap_or(1)
            .into();
        let interpretation: Photometric = ifd
            .get_tag_value::<u16>(TagId::PhotometricInterpretation)
            .unwrap_or(Photometric::BlackIsZero.into())
            .into();
        let bits: Vec<u16> = ifd
            .get_tag_values(TagId::BitsPerSample)
            .unwrap_or_else(|_| vec![1]);
        let samples_per_pixel = ifd
            .get_tag_value::<u16>(TagId::SamplesPerPixel)
            .unwrap_or(bits.len() as u16);
        let planar = ifd
            .get_tag_value::<u16>(TagId::PlanarConfiguration)
            .unwrap_or(1);
        let sample_format = ifd.get_tag_value::<u16>(TagId::SampleFormat).unwrap_or(1);
        let jpeg_tables = ifd
            .get_tag(TagId::JPEGTables)
            .ok()
            .map(|tag| tag.data.clone());

        // Validation
        if width == 0 || height == 0 {
            return Err(CogError::BadTiff(TiffError::BadTag(TagId::ImageWidth)));
        }
        let bits_per_sample = bits.first().copied().unwrap_or(1);
        if bits.iter().any(|b| *b != bits_per_sample) || !matches!(bits_per_sample, 8 | 16) {
            return Err(CogError::NotSupported(format!("bits per sample {bits:?}")));
        }
        if planar != 1 {
            return Err(CogError::NotSupported("planar sample layout".into()));
        }
        if sample_format != 1 {
            return Err(CogError::NotSupported(format!("sample format {sample_format}")));
        }
        if samples_per_pixel == 0 || tile_width == 0 || tile_height == 0 {
            return Err(CogError::BadTiff(TiffError::BadTag(TagId::TileWidth)));
        }
        if matches!(interpretation, Photometric::Palette | Photometric::Separated) {
            return Err(CogError::NotSupported(format!(
                "photometric interpretation {interpretation:?}"
            )));
        }

        let level = Self {
            dimensions: (width, height),
            tile_width,
            tile_height,
            compression,
            predictor,
            interpretation,
            samples_per_pixel,
            bits_per_sample,
            endian,
            offsets,
            byte_counts,
            jpeg_tables,
        };

        if level.offsets.len() != level.byte_counts.len()
            || level.offsets.len() < level.tile_count()
        {
            return Err(CogError::BadTiff(TiffError::BadTag(TagId::TileOffsets)));
        }

        Ok(level)
    }

    pub fn megapixels(&self) -> f64 {
        (self.dimensions.0 as f64 * self.dimensions.1 as f64) / 1e6
    }

    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    pub fn col_count(&self) -> usize {
        self.width().div_ceil(self.tile_width) as usize
    }

    pub fn row_count(&self) -> usize {
        self.height().div_ceil(self.tile_height) as usize
    }

    pub fn tile_count(&self) -> usize {
        self.col_count() * self.row_count()
    }

    /// Samples per pixel after decoding.
    ///
    /// JPEG tiles come out of the decoder as RGB or luma regardless of extra samples.
    pub fn decoded_samples_per_pixel(&self) -> usize {
        match self.compression {
            Compression::Jpeg if self.samples_per_pixel >= 3 => 3,
            Compression::Jpeg => 1,
            _ => self.samples_per_pixel as usize,
        }
    }

    /// Byte length of a decoded tile, one byte per sample.
    pub fn decoded_tile_len(&self) -> usize {
        self.tile_width as usize * self.tile_height as usize * self.decoded_samples_per_pixel()
    }

    /// Byte range `[start, end)` of a tile, None for sparse tiles
    pub fn tile_byte_range(&self, index: usize) -> CogResult<Option<(u64, u64)>> {
        let max_valid_index = self.offsets.len().min(self.byte_counts.len());
        if index >= max_valid_index {
            return Err(CogError::TileIndexOutOfRange(
                index,
                max_valid_index.saturating_sub(1),
            ));
        }

        let offset = self.offsets[index];
        let byte_count = self.byte_counts[index];
        if byte_count == 0 {
            return Ok(None);
        }
        let end = offset
            .checked_add(byte_count)
            .ok_or(CogError::BadTiff(TiffError::BadTag(TagId::TileByteCounts)))?;
        Ok(Some((offset, end)))
    }

    /// Tile content for sparse tiles
    pub fn blank_tile(&self) -> Vec<u8> {
        vec![0; self.decoded_tile_len()]
    }

    /// Decode raw tile bytes into interleaved 8-bit samples.
    pub fn decode_tile(&self, bytes: &[u8]) -> CogResult<Vec<u8>> {
        if self.compression == Compression::Jpeg {
            return self.decode_jpeg_tile(bytes);
        }

        let buffer = self.compression.decode(bytes)?;

        let width = self.tile_width as usize;
        let spp = self.samples_per_pixel as usize;
        let sample_count = self.decoded_tile_len();

        let mut samples = match self.bits_per_sample {
            8 => {
                if buffer.len() < sample_count {
                    return Err(CogError::TileSize(buffer.len(), sample_count));
                }
                let mut samples = buffer;
                samples.truncate(sample_count);
                self.predictor.predict(&mut samples, width, spp)?;
                samples
            }
            16 => {
                let byte_count = sample_count * 2;
                if buffer.len() < byte_count {
                    return Err(CogError::TileSize(buffer.len(), byte_count));
                }
                let mut wide: Vec<u16> = self
                    .endian
                    .decode_all_to_primitive::<2, u16, u16>(&buffer[..byte_count])
                    .ok_or(CogError::TileSize(buffer.len(), byte_count))?;
                self.predictor.predict(&mut wide, width, spp)?;
                wide.into_iter().map(|v| (v >> 8) as u8).collect()
            }
            bits => return Err(CogError::NotSupported(format!("bits per sample {bits}"))),
        };

        if self.interpretation == Photometric::WhiteIsZero {
            samples.iter_mut().for_each(|v| *v = u8::MAX - *v);
        }

        Ok(samples)
    }

    #[cfg(feature = "image")]
    fn decode_jpeg_tile(&self, bytes: &[u8]) -> CogResult<Vec<u8>> {
        use image::ImageFormat;

        // Abbreviated JPEG streams share their tables through the JPEGTables tag.
        //   Splice the tables (minus EOI) in front of the tile (minus SOI).
        let stream = match &self.jpeg_tables {
            Some(tables) if tables.len() > 4 && bytes.len() > 2 => {
                let mut stream = Vec::with_capacity(tables.len() + bytes.len());
                stream.extend_from_slice(&tables[..tables.len() - 2]);
                stream.extend_from_slice(&bytes[2..]);
                stream
            }
            _ => bytes.to_vec(),
        };

        let image = image::load_from_memory_with_format(&stream, ImageFormat::Jpeg)
            .map_err(|e| DecompressError::JpegError(e.to_string()))?;
        if (image.width(), image.height()) != (self.tile_width, self.tile_height) {
            return Err(CogError::TileSize(
                (image.width() * image.height()) as usize,
                (self.tile_width * self.tile_height) as usize,
            ));
        }

        Ok(match self.decoded_samples_per_pixel() {
            3 => image.into_rgb8().into_raw(),
            _ => image.into_luma8().into_raw(),
        })
    }

    #[cfg(not(feature = "image"))]
    fn decode_jpeg_tile(&self, _bytes: &[u8]) -> CogResult<Vec<u8>> {
        Err(DecompressError::CompressionNotSupported(Compression::Jpeg).into())
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Level({}x{}, {} tiles, {:?} Compression, {:?} Predictor)",
            self.dimensions.0,
            self.dimensions.1,
            self.offsets.len(),
            self.compression,
            self.predictor
        )
    }
}
