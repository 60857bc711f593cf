use std::fmt::Display;

/// Band-separated 8-bit samples of a decoded raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bands {
    pub width: u32,
    pub height: u32,
    pub bands: Vec<Vec<u8>>,
}

impl Bands {
    pub fn new(width: u32, height: u32, bands: Vec<Vec<u8>>) -> Self {
        Self {
            width,
            height,
            bands,
        }
    }
}

impl Display for Bands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bands({}x{}, {} bands)",
            self.width,
            self.height,
            self.bands.len()
        )
    }
}
