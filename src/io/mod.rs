// I/O Traits
//   AsyncReadRange is stateless byte-range I/O.
//   Key difference from AsyncRead + AsyncSeek is self is immutable, making it a
//   natural fit for concurrent http byte-range requests.
//   Required methods
//     fn read_range_async(&self, start: u64, end: u64) -> BoxFuture<Result<Vec<u8>>>
//   Provided methods
//     fn read_range_exact_async(&self, start: u64, end: u64) -> BoxFuture<Result<Vec<u8>>>

use futures::future::BoxFuture;
use futures::FutureExt;
use std::io::{Error, ErrorKind, Result};

mod fs;
#[cfg(feature = "http")]
mod http;
mod memory;

pub use fs::PathReader;
#[cfg(feature = "http")]
pub use http::HttpReader;
pub use memory::MemoryReader;

pub trait AsyncReadRange: Send + Sync {
    /// Asynchronously read the bytes in `[start, end)`
    ///
    /// May return fewer bytes than requested when the source ends before `end`.
    fn read_range_async(&self, start: u64, end: u64) -> BoxFuture<'static, Result<Vec<u8>>>;

    fn read_range_exact_async(&self, start: u64, end: u64) -> BoxFuture<'static, Result<Vec<u8>>> {
        let n = end.saturating_sub(start) as usize;
        let request = self.read_range_async(start, end);
        async move {
            let bytes = request.await?;
            if bytes.len() == n {
                Ok(bytes)
            } else {
                Err(Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("Failed to read complete range: {} < {n}", bytes.len()),
                ))
            }
        }
        .boxed()
    }
}
