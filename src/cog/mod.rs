use crate::io::AsyncReadRange;
use crate::raster::Bands;
use crate::tiff::{Ifd, TagId, Tiff};
use std::fmt::Display;
use std::io::{BufReader, Cursor, ErrorKind, Read, Seek};
use std::sync::Arc;
use tracing::*;

pub mod compression;
mod error;
mod geo;
mod level;
mod sample;
mod tiles;

pub use error::{CogError, CogResult};
pub use geo::GeoReference;
pub use level::{Level, Photometric};

/// Prefix fetched before the first header parse attempt
pub const DEFAULT_HEADER_BYTES: usize = 16 * 1024;
/// Upper bound for the header prefix, COG headers are normally a few KiB
pub const MAX_HEADER_BYTES: usize = 16 * 1024 * 1024;

/// NewSubfileType bit marking transparency masks
const SUBFILE_MASK: u32 = 0x4;

/// A cloud optimized GeoTIFF, levels sorted from full resolution to coarsest.
#[derive(Clone, Debug)]
pub struct Cog {
    levels: Vec<Level>,
    geo: GeoReference,
}

impl Cog {
    pub fn open<R: Read + Seek>(source: &mut R) -> CogResult<Self> {
        let stream = &mut BufReader::new(source);

        // TIFF indexing
        let tiff = Tiff::open(stream)?;

        // Georeferencing lives on the full resolution image
        let geo = GeoReference::from_ifd(tiff.ifd0()?)?;

        // Map IFDs into COG Levels
        //   IFDs which aren't valid levels (masks, strips, odd layouts) are skipped
        let mut levels: Vec<Level> = tiff
            .ifds
            .iter()
            .enumerate()
            .filter(|(_, ifd)| !is_mask(ifd))
            .filter_map(|(i, ifd)| match Level::from_ifd(ifd, tiff.endian) {
                Ok(level) => Some(level),
                Err(e) => {
                    debug!("Skipping IFD {i}: {e}");
                    None
                }
            })
            .collect();

        // COGs should already have levels sorted big to small
        levels.sort_by(|a, b| b.megapixels().total_cmp(&a.megapixels()));
        if levels.is_empty() {
            return Err(CogError::NoLevels);
        }

        Ok(Self { levels, geo })
    }

    /// Open from a byte-range source, growing the header prefix until it parses.
    pub async fn open_async(reader: &dyn AsyncReadRange, initial_fetch: usize) -> CogResult<Self> {
        let mut fetch_size = initial_fetch.clamp(16, MAX_HEADER_BYTES);
        loop {
            let prefix = reader.read_range_async(0, fetch_size as u64).await?;
            let whole_file = prefix.len() < fetch_size;
            trace!("Parsing header from {} byte prefix", prefix.len());

            match Self::open(&mut Cursor::new(&prefix)) {
                Err(CogError::ReadError(e)) if e.kind() == ErrorKind::UnexpectedEof && !whole_file => {
                    if fetch_size >= MAX_HEADER_BYTES {
                        return Err(CogError::HeaderTooLarge(MAX_HEADER_BYTES));
                    }
                    fetch_size = (fetch_size * 2).min(MAX_HEADER_BYTES);
                    debug!("Header incomplete, refetching {fetch_size} bytes");
                }
                result => return result,
            }
        }
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn geo(&self) -> &GeoReference {
        &self.geo
    }

    pub fn full_dimensions(&self) -> (u32, u32) {
        self.levels[0].dimensions
    }

    /// Model space (width, height) of the raster
    pub fn extent(&self) -> (f64, f64) {
        self.geo.extent(self.full_dimensions())
    }

    /// Ground units per pixel of a level
    pub fn pixel_size(&self, level: &Level) -> (f64, f64) {
        let (width, height) = self.extent();
        (width / level.width() as f64, height / level.height() as f64)
    }

    /// Index of the coarsest level whose pixels are strictly finer than `target`.
    ///
    /// Falls back to full resolution when no level is finer.
    pub fn level_for_resolution(&self, target: (f64, f64)) -> usize {
        self.levels
            .iter()
            .enumerate()
            .rev()
            .find(|(_, level)| {
                let (x, y) = self.pixel_size(level);
                x < target.0 && y < target.1
            })
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Decode red, green and blue bands of the level chosen for `target`, at its native size.
    pub async fn read_bands(
        &self,
        reader: Arc<dyn AsyncReadRange>,
        target: (f64, f64),
    ) -> CogResult<Bands> {
        if !(target.0 > 0.0 && target.1 > 0.0) || !target.0.is_finite() || !target.1.is_finite() {
            return Err(CogError::InvalidResolution(target));
        }

        let level = &self.levels[self.level_for_resolution(target)];
        let dimensions = level.dimensions;
        debug!(
            "Reading {}x{} at {target:?} from {level}",
            dimensions.0, dimensions.1
        );

        let pixel_map = sample::pixel_map(level, dimensions);
        let indices = pixel_map.keys().copied().collect();
        let tile_cache = tiles::get_tiles_async(reader, level, indices).await?;
        sample::assemble_rgb(level, &pixel_map, &tile_cache, dimensions)
    }
}

fn is_mask(ifd: &Ifd) -> bool {
    ifd.get_tag_value::<u32>(TagId::SubfileType)
        .map(|subfile| subfile & SUBFILE_MASK != 0)
        .unwrap_or(false)
}

impl Display for Cog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cog({} Levels)", self.levels.len())?;
        for level in self.levels.iter() {
            write!(f, "\n  {level}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::compression::{Compression, Predictor};
    use super::*;
    use crate::tiff::Endian;

    fn level(width: u32, height: u32) -> Level {
        let tiles = (width.div_ceil(256) * height.div_ceil(256)) as usize;
        Level {
            dimensions: (width, height),
            tile_width: 256,
            tile_height: 256,
            compression: Compression::Uncompressed,
            predictor: Predictor::No,
            interpretation: Photometric::Rgb,
            samples_per_pixel: 3,
            bits_per_sample: 8,
            endian: Endian::Little,
            offsets: vec![0; tiles],
            byte_counts: vec![0; tiles],
            jpeg_tables: None,
        }
    }

    /// 10 m pixels with overviews at 20 m, 40 m and 80 m
    fn cog() -> Cog {
        Cog {
            levels: vec![
                level(8000, 4000),
                level(4000, 2000),
                level(2000, 1000),
                level(1000, 500),
            ],
            geo: GeoReference {
                pixel_scale: (10.0, 10.0),
                origin: (400000.0, 5400000.0),
            },
        }
    }

    #[test]
    fn picks_coarsest_sufficient_level() {
        let cog = cog();
        assert_eq!(cog.pixel_size(&cog.levels[2]), (40.0, 40.0));
        assert_eq!(cog.level_for_resolution((1000.0, 1000.0)), 3);
        assert_eq!(cog.level_for_resolution((80.5, 80.5)), 3);
        // Equal pixel size is not finer
        assert_eq!(cog.level_for_resolution((80.0, 80.0)), 2);
        assert_eq!(cog.level_for_resolution((79.0, 79.0)), 2);
        assert_eq!(cog.level_for_resolution((80.0, 39.0)), 1);
        assert_eq!(cog.level_for_resolution((25.0, 25.0)), 1);
        assert_eq!(cog.level_for_resolution((20.0, 20.0)), 0);
        assert_eq!(cog.level_for_resolution((10.0, 10.0)), 0);
        assert_eq!(cog.level_for_resolution((1.0, 1.0)), 0);
    }

    #[tokio::test]
    async fn rejects_invalid_resolution() {
        let reader: Arc<dyn AsyncReadRange> = Arc::new(crate::io::MemoryReader::new(vec![]));
        for target in [(0.0, 1.0), (1.0, -1.0), (f64::NAN, 1.0), (f64::INFINITY, 1.0)] {
            assert!(matches!(
                cog().read_bands(reader.clone(), target).await,
                Err(CogError::InvalidResolution(_))
            ));
        }
    }
}
