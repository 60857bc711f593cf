use super::AsyncReadRange;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::io::{Result, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::File as TokioFile;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Opens the file for every request so reads never share a cursor.
#[derive(Clone, Debug)]
pub struct PathReader(PathBuf);

impl PathReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self(path.as_ref().to_path_buf())
    }
}

impl AsyncReadRange for PathReader {
    fn read_range_async(&self, start: u64, end: u64) -> BoxFuture<'static, Result<Vec<u8>>> {
        let path = self.0.clone();
        async move {
            let n = end.saturating_sub(start);
            let mut file = TokioFile::open(path).await?;
            file.seek(SeekFrom::Start(start)).await?;
            let mut buffer = Vec::new();
            file.take(n).read_to_end(&mut buffer).await?;
            Ok(buffer)
        }
        .boxed()
    }
}
