use crate::catalog::{RasterReference, StaticCatalog};
use crate::cog::DEFAULT_HEADER_BYTES;
use crate::controller::RefreshPolicy;
use crate::error::{PreviewError, PreviewResult};
use crate::source::CogSourceConfig;
use crate::viewport::{ViewState, DEFAULT_STYLE};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "cogview")]
#[command(about = "Zoom-driven previews of Cloud Optimized GeoTIFFs", long_about = None)]
pub struct ViewerArgs {
    /// Raster URL or path to offer for selection (repeatable)
    #[arg(long = "raster", value_name = "REFERENCE")]
    pub rasters: Vec<String>,

    /// File listing one raster reference per line
    #[arg(long)]
    pub catalog_file: Option<PathBuf>,

    /// Initial map center longitude in degrees
    #[arg(long, default_value_t = 7.8, allow_negative_numbers = true)]
    pub longitude: f64,

    /// Initial map center latitude in degrees
    #[arg(long, default_value_t = 48.0, allow_negative_numbers = true)]
    pub latitude: f64,

    /// Initial zoom level
    #[arg(long, default_value_t = 6.0)]
    pub zoom: f64,

    /// Initial camera pitch in degrees
    #[arg(long, default_value_t = 45.0)]
    pub pitch: f64,

    /// Base map style
    #[arg(long, default_value = DEFAULT_STYLE)]
    pub style: String,

    /// How failed and out of date reads are handled
    #[arg(long, value_enum, default_value_t = RefreshPolicy::Faithful)]
    pub policy: RefreshPolicy,

    /// Bytes fetched for the first header parse attempt
    #[arg(long, default_value_t = DEFAULT_HEADER_BYTES)]
    pub header_bytes: usize,

    /// Timeout in seconds for each HTTP range request
    #[arg(long, default_value_t = 30)]
    pub http_timeout: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub catalog: StaticCatalog,
    pub view: ViewState,
    pub style: String,
    pub policy: RefreshPolicy,
    pub source: CogSourceConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            catalog: StaticCatalog::default(),
            view: ViewState::default(),
            style: DEFAULT_STYLE.to_string(),
            policy: RefreshPolicy::default(),
            source: CogSourceConfig::default(),
        }
    }
}

impl ViewerArgs {
    /// Catalog file entries come first, then `--raster` entries.
    /// Without either the built in catalog is used.
    pub fn into_config(self) -> PreviewResult<ViewerConfig> {
        let mut rasters = match &self.catalog_file {
            Some(path) => StaticCatalog::from_file(path)
                .map_err(|source| PreviewError::Catalog {
                    path: path.clone(),
                    source,
                })?
                .into_rasters(),
            None => vec![],
        };
        rasters.extend(self.rasters.into_iter().map(RasterReference::from));

        let catalog = if rasters.is_empty() && self.catalog_file.is_none() {
            StaticCatalog::default()
        } else {
            StaticCatalog::new(rasters)
        };

        Ok(ViewerConfig {
            catalog,
            view: ViewState {
                longitude: self.longitude,
                latitude: self.latitude,
                zoom: self.zoom,
                pitch: self.pitch,
            },
            style: self.style,
            policy: self.policy,
            source: CogSourceConfig {
                header_bytes: self.header_bytes,
                http_timeout: Duration::from_secs(self.http_timeout),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RasterCatalog;

    fn parse(args: &[&str]) -> ViewerArgs {
        ViewerArgs::try_parse_from(std::iter::once("cogview").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_the_viewer() {
        let config = parse(&[]).into_config().unwrap();
        assert_eq!(config.catalog, StaticCatalog::default());
        assert_eq!(config.view, ViewState::default());
        assert_eq!(config.style, DEFAULT_STYLE);
        assert_eq!(config.policy, RefreshPolicy::Faithful);
        assert_eq!(config.source, CogSourceConfig::default());
    }

    #[test]
    fn overrides() {
        let config = parse(&[
            "--raster",
            "a.tif",
            "--raster",
            "https://example.com/b.tif",
            "--longitude",
            "-122.5",
            "--latitude",
            "-33.9",
            "--zoom",
            "12",
            "--policy",
            "corrected",
            "--header-bytes",
            "4096",
        ])
        .into_config()
        .unwrap();
        let labels: Vec<String> = config
            .catalog
            .list_rasters()
            .iter()
            .map(|r| r.label().to_string())
            .collect();
        assert_eq!(labels, ["a.tif", "b.tif"]);
        assert_eq!(config.view.longitude, -122.5);
        assert_eq!(config.view.latitude, -33.9);
        assert_eq!(config.view.zoom, 12.0);
        assert_eq!(config.policy, RefreshPolicy::Corrected);
        assert_eq!(config.source.header_bytes, 4096);
    }

    #[test]
    fn missing_catalog_file() {
        let result = parse(&["--catalog-file", "/no/such/catalog.txt"]).into_config();
        assert!(matches!(result, Err(PreviewError::Catalog { .. })));
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(ViewerArgs::try_parse_from(["cogview", "--policy", "eager"]).is_err());
    }
}
