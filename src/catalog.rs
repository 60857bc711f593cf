use std::fmt::Display;
use std::io;
use std::path::Path;
use tracing::*;

const DEFAULT_RASTERS: [&str; 3] = [
    "https://cogs.camels-de.org/cog_1_4cm_50.tif",
    "https://cogs.camels-de.org/cog_1_4cm_60.tif",
    "https://cogs.camels-de.org/cog_1_4cm_75.tif",
];

/// Names a raster by URL or filesystem path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RasterReference(String);

impl RasterReference {
    pub fn new<S: Into<String>>(reference: S) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, e.g. `cog_1_4cm_50.tif`
    pub fn label(&self) -> &str {
        let trimmed = self.0.trim_end_matches(['/', '\\']);
        trimmed
            .rsplit(['/', '\\'])
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(&self.0)
    }

    pub fn is_remote(&self) -> bool {
        let lower = self.0.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}

impl Display for RasterReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RasterReference {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

impl From<String> for RasterReference {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

/// Lists the rasters a user can pick from.
pub trait RasterCatalog {
    fn list_rasters(&self) -> Vec<RasterReference>;
}

/// Fixed, ordered list of rasters.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticCatalog {
    rasters: Vec<RasterReference>,
}

impl StaticCatalog {
    pub fn new(rasters: Vec<RasterReference>) -> Self {
        Self { rasters }
    }

    /// One reference per line, blank lines and `#` comments are skipped.
    pub fn from_lines(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(RasterReference::from)
                .collect(),
        )
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_lines(&text);
        info!(
            "Loaded {} rasters from {}",
            catalog.rasters.len(),
            path.as_ref().display()
        );
        Ok(catalog)
    }

    pub fn into_rasters(self) -> Vec<RasterReference> {
        self.rasters
    }

    /// Entry by zero based index
    pub fn get(&self, index: usize) -> Option<&RasterReference> {
        self.rasters.get(index)
    }

    pub fn len(&self) -> usize {
        self.rasters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_RASTERS.into_iter().map(RasterReference::from).collect())
    }
}

impl RasterCatalog for StaticCatalog {
    fn list_rasters(&self) -> Vec<RasterReference> {
        self.rasters.clone()
    }
}
