use crate::error::{PreviewError, PreviewResult};
use crate::raster::Bands;
use std::fmt::Display;
use std::path::Path;

/// Red, green and blue samples of the current preview.
///
/// The three bands always have `width * height` samples and are only ever
/// replaced together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreviewImage {
    width: u32,
    height: u32,
    red: Vec<u8>,
    green: Vec<u8>,
    blue: Vec<u8>,
}

impl PreviewImage {
    /// Takes the first three bands, extra bands are dropped.
    pub fn from_bands(bands: Bands) -> PreviewResult<Self> {
        let Bands {
            width,
            height,
            bands,
        } = bands;
        if bands.len() < 3 {
            return Err(PreviewError::MissingBands(bands.len()));
        }

        let pixel_count = width as usize * height as usize;
        let mut bands = bands.into_iter().take(3);
        let (Some(red), Some(green), Some(blue)) = (bands.next(), bands.next(), bands.next())
        else {
            return Err(PreviewError::MissingBands(0));
        };
        if [&red, &green, &blue].iter().any(|b| b.len() != pixel_count) {
            return Err(PreviewError::BandLength(vec![
                red.len(),
                green.len(),
                blue.len(),
            ]));
        }

        Ok(Self {
            width,
            height,
            red,
            green,
            blue,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn red(&self) -> &[u8] {
        &self.red
    }

    pub fn green(&self) -> &[u8] {
        &self.green
    }

    pub fn blue(&self) -> &[u8] {
        &self.blue
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    /// Interleaved RGB samples, row major
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.red.len() * 3);
        for ((r, g), b) in self.red.iter().zip(&self.green).zip(&self.blue) {
            buffer.extend_from_slice(&[*r, *g, *b]);
        }
        buffer
    }

    /// Write the preview as an image, format inferred from the extension.
    #[cfg(feature = "image")]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> PreviewResult<()> {
        if self.is_empty() {
            return Err(PreviewError::MissingBands(0));
        }
        let buffer: image::RgbImage =
            image::ImageBuffer::from_raw(self.width, self.height, self.to_rgb_bytes()).ok_or(
                PreviewError::BandLength(vec![self.red.len(), self.green.len(), self.blue.len()]),
            )?;
        buffer.save(path)?;
        Ok(())
    }

    #[cfg(not(feature = "image"))]
    pub fn save<P: AsRef<Path>>(&self, _path: P) -> PreviewResult<()> {
        Err(PreviewError::NotSupported("image export".into()))
    }
}

impl Display for PreviewImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "empty")
        } else {
            write!(f, "{}x{} RGB", self.width, self.height)
        }
    }
}
