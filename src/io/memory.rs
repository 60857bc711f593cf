use super::AsyncReadRange;
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use std::io::Result;
use std::sync::Arc;

/// Serves byte ranges out of an in-memory buffer.
#[derive(Clone, Debug)]
pub struct MemoryReader(Arc<Vec<u8>>);

impl MemoryReader {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Arc::new(bytes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsyncReadRange for MemoryReader {
    fn read_range_async(&self, start: u64, end: u64) -> BoxFuture<'static, Result<Vec<u8>>> {
        let len = self.0.len();
        let start = (start as usize).min(len);
        let end = (end as usize).clamp(start, len);
        future::ready(Ok(self.0[start..end].to_vec())).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clamps_to_buffer() {
        let reader = MemoryReader::new(vec![1, 2, 3, 4]);
        assert_eq!(reader.read_range_async(1, 3).await.unwrap(), vec![2, 3]);
        assert_eq!(reader.read_range_async(2, 10).await.unwrap(), vec![3, 4]);
        assert!(reader.read_range_async(10, 20).await.unwrap().is_empty());
        assert_eq!(reader.read_range_exact_async(0, 4).await.unwrap().len(), 4);
        assert!(reader.read_range_exact_async(0, 5).await.is_err());
    }
}
