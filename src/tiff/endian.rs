use eio::{FromBytes, ReadExt};
use num_traits::{NumCast, ToPrimitive};
use std::io::{Read, Result};

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    pub fn read<const N: usize, T: FromBytes<N>>(&self, stream: &mut impl Read) -> Result<T> {
        let mut buf = [0u8; N];
        stream.read_exact(&mut buf)?;
        self.decode(buf)
    }

    pub fn decode<const N: usize, T: FromBytes<N>>(&self, bytes: [u8; N]) -> Result<T> {
        match self {
            Endian::Big => bytes.as_slice().read_be(),
            Endian::Little => bytes.as_slice().read_le(),
        }
    }

    /// Decode packed values of type `A` and cast each into `T`.
    ///
    /// None if the byte count is not a multiple of `N` or any value does not fit `T`.
    pub fn decode_all_to_primitive<const N: usize, A, T>(&self, bytes: &[u8]) -> Option<Vec<T>>
    where
        A: FromBytes<N> + ToPrimitive,
        T: NumCast,
    {
        if bytes.len() % N != 0 {
            return None;
        }
        bytes
            .chunks_exact(N)
            .map(|chunk| {
                let arr: [u8; N] = chunk.try_into().ok()?;
                let value: A = self.decode(arr).ok()?;
                <T as NumCast>::from(value)
            })
            .collect()
    }
}
