// refs
// https://www.itu.int/itudoc/itu-t/com16/tiff-fx/docs/tiff6.pdf
// https://www.awaresystems.be/imaging/tiff/bigtiff.html

use super::Endian;
use num_enum::{FromPrimitive, IntoPrimitive};
use num_traits::NumCast;
use std::fmt::Display;

mod id;

pub use id::TagId;

#[derive(Clone, Debug)]
pub struct Tag {
    pub code: u16,
    pub datatype: TagType,
    pub count: usize,
    pub data: Vec<u8>,
    pub endian: Endian,
}

impl Tag {
    pub fn id(&self) -> Option<TagId> {
        TagId::try_from(self.code).ok()
    }

    /// Numeric values of the tag, cast into `T`.
    ///
    /// Rationals are evaluated as floating point before the cast. None for
    /// ascii or unknown datatypes, or if any value does not fit `T`.
    pub fn values<T: NumCast>(&self) -> Option<Vec<T>> {
        let endian = self.endian;
        let data = self.data.as_slice();
        match self.datatype {
            TagType::Byte | TagType::Undefined => {
                data.iter().map(|v| <T as NumCast>::from(*v)).collect()
            }
            TagType::SByte => data
                .iter()
                .map(|v| <T as NumCast>::from(*v as i8))
                .collect(),
            TagType::Short => endian.decode_all_to_primitive::<2, u16, T>(data),
            TagType::SShort => endian.decode_all_to_primitive::<2, i16, T>(data),
            TagType::Long | TagType::Ifd => endian.decode_all_to_primitive::<4, u32, T>(data),
            TagType::SLong => endian.decode_all_to_primitive::<4, i32, T>(data),
            TagType::Long8 | TagType::Ifd8 => endian.decode_all_to_primitive::<8, u64, T>(data),
            TagType::SLong8 => endian.decode_all_to_primitive::<8, i64, T>(data),
            TagType::Float => endian.decode_all_to_primitive::<4, f32, T>(data),
            TagType::Double => endian.decode_all_to_primitive::<8, f64, T>(data),
            TagType::Rational => data
                .chunks_exact(8)
                .map(|c| {
                    let numerator: [u8; 4] = c[..4].try_into().ok()?;
                    let denominator: [u8; 4] = c[4..].try_into().ok()?;
                    let numerator = endian.decode::<4, u32>(numerator).ok()?;
                    let denominator = endian.decode::<4, u32>(denominator).ok()?;
                    <T as NumCast>::from(numerator as f64 / denominator as f64)
                })
                .collect(),
            TagType::SRational => data
                .chunks_exact(8)
                .map(|c| {
                    let numerator: [u8; 4] = c[..4].try_into().ok()?;
                    let denominator: [u8; 4] = c[4..].try_into().ok()?;
                    let numerator = endian.decode::<4, i32>(numerator).ok()?;
                    let denominator = endian.decode::<4, i32>(denominator).ok()?;
                    <T as NumCast>::from(numerator as f64 / denominator as f64)
                })
                .collect(),
            TagType::Ascii | TagType::Unknown => None,
        }
    }

    pub fn value<T: NumCast + Copy>(&self) -> Option<T> {
        self.values::<T>()?.first().copied()
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id_string = match self.id() {
            Some(id) => format!("{id:?}"),
            None => format!("Unknown({})", self.code),
        };
        write!(f, "{} {:?}[{}]", id_string, self.datatype, self.count)
    }
}

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum TagType {
    Byte = 1,
    Ascii = 2,
    Short = 3,
    Long = 4,
    Rational = 5,
    SByte = 6,
    Undefined = 7,
    SShort = 8,
    SLong = 9,
    SRational = 10,
    Float = 11,
    Double = 12,
    Ifd = 13,
    Long8 = 16,
    SLong8 = 17,
    Ifd8 = 18,

    #[num_enum(default)]
    Unknown = 0xFFFF,
}

impl TagType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            TagType::Byte => 1,
            TagType::Ascii => 1,
            TagType::Short => 2,
            TagType::Long => 4,
            TagType::Rational => 8,
            TagType::SByte => 1,
            TagType::Undefined => 1,
            TagType::SShort => 2,
            TagType::SLong => 4,
            TagType::SRational => 8,
            TagType::Float => 4,
            TagType::Double => 8,
            TagType::Ifd => 4,
            TagType::Long8 => 8,
            TagType::SLong8 => 8,
            TagType::Ifd8 => 8,

            TagType::Unknown => 1,
        }
    }
}
