use super::{RasterHandle, RasterSource, ReadOptions};
use crate::catalog::RasterReference;
use crate::cog::{Cog, DEFAULT_HEADER_BYTES};
use crate::error::{PreviewError, PreviewResult};
use crate::io::{AsyncReadRange, PathReader};
use crate::raster::Bands;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::*;

#[derive(Clone, Debug, PartialEq)]
pub struct CogSourceConfig {
    /// Initial header prefix size in bytes
    pub header_bytes: usize,
    /// Per request timeout for remote rasters
    pub http_timeout: Duration,
}

impl Default for CogSourceConfig {
    fn default() -> Self {
        Self {
            header_bytes: DEFAULT_HEADER_BYTES,
            http_timeout: Duration::from_secs(30),
        }
    }
}

/// Opens COGs from HTTP(S) URLs or local paths.
#[derive(Clone, Debug, Default)]
pub struct CogSource {
    config: CogSourceConfig,
}

impl CogSource {
    pub fn new(config: CogSourceConfig) -> Self {
        Self { config }
    }

    fn reader(&self, reference: &RasterReference) -> PreviewResult<Arc<dyn AsyncReadRange>> {
        if reference.is_remote() {
            #[cfg(feature = "http")]
            {
                let reader = crate::io::HttpReader::new(reference.as_str())?
                    .with_timeout(self.config.http_timeout);
                return Ok(Arc::new(reader));
            }
            #[cfg(not(feature = "http"))]
            return Err(PreviewError::NotSupported("remote rasters".into()));
        }
        Ok(Arc::new(PathReader::new(reference.as_str())))
    }
}

impl RasterSource for CogSource {
    fn open(
        &self,
        reference: &RasterReference,
    ) -> BoxFuture<'static, PreviewResult<Box<dyn RasterHandle>>> {
        let reference = reference.clone();
        let header_bytes = self.config.header_bytes;
        let reader = self.reader(&reference);
        async move {
            let reader = reader?;
            let cog = Cog::open_async(reader.as_ref(), header_bytes)
                .await
                .map_err(|source| PreviewError::Open {
                    reference: reference.clone(),
                    source,
                })?;
            info!("Opened {}", reference.label());
            debug!("{cog}");
            Ok(Box::new(CogHandle {
                cog: Arc::new(cog),
                reader,
            }) as Box<dyn RasterHandle>)
        }
        .boxed()
    }
}

/// An opened COG and the reader its tiles come from.
#[derive(Clone)]
pub struct CogHandle {
    cog: Arc<Cog>,
    reader: Arc<dyn AsyncReadRange>,
}

impl RasterHandle for CogHandle {
    fn read_bands(&self, options: ReadOptions) -> BoxFuture<'_, PreviewResult<Bands>> {
        let target = (options.target_resolution_x, options.target_resolution_y);
        async move {
            self.cog
                .read_bands(self.reader.clone(), target)
                .await
                .map_err(PreviewError::Read)
        }
        .boxed()
    }
}
