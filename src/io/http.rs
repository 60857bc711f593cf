use super::AsyncReadRange;
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use reqwest::header::RANGE;
use reqwest::{Client, IntoUrl, StatusCode, Url};
use std::io::{Error, ErrorKind, Result};
use std::time::Duration;
use tracing::*;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Byte-range reads over HTTP(S) `Range` requests.
#[derive(Clone, Debug)]
pub struct HttpReader {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl HttpReader {
    pub fn new<U: IntoUrl>(url: U) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            url: url
                .into_url()
                .map_err(|e| Error::new(ErrorKind::AddrNotAvailable, format!("{e:?}")))?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl AsyncReadRange for HttpReader {
    fn read_range_async(&self, start: u64, end: u64) -> BoxFuture<'static, Result<Vec<u8>>> {
        if end <= start {
            return future::ready(Ok(vec![])).boxed();
        }
        let n = (end - start) as usize;
        let last = end - 1; // GOTCHA byte range includes end
        let request = self
            .client
            .get(self.url.clone())
            .header(RANGE, format!("bytes={start}-{last}"))
            .timeout(self.timeout);

        async move {
            trace!("Requesting bytes={start}-{last}");
            let response = request
                .send()
                .await
                .map_err(|e| Error::new(ErrorKind::NotConnected, format!("{e:?}")))?;

            let status = response.status();
            if status == StatusCode::RANGE_NOT_SATISFIABLE {
                return Ok(vec![]);
            }
            if !status.is_success() {
                return Err(Error::other(format!("HTTP {status}")));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::new(ErrorKind::InvalidData, format!("{e:?}")))?;

            if status == StatusCode::PARTIAL_CONTENT {
                Ok(bytes[..n.min(bytes.len())].to_vec())
            } else {
                // Server ignored the range and sent the whole object
                debug!("Range ignored by server, got {} bytes", bytes.len());
                let start = (start as usize).min(bytes.len());
                let end = (end as usize).min(bytes.len());
                Ok(bytes[start..end].to_vec())
            }
        }
        .boxed()
    }
}
