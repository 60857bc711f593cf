use super::{Endian, Tag, TagId, TagType, TiffError, TiffVariant};
use num_traits::NumCast;
use std::io::{self, Read, Seek, SeekFrom};

#[derive(Clone, Debug)]
pub struct Ifd(pub Vec<Tag>);

impl Ifd {
    pub fn parse<R: Read + Seek>(
        stream: &mut R,
        offset: u64,
        endian: Endian,
        variant: TiffVariant,
    ) -> io::Result<(Ifd, u64)> {
        // IFD starts at offset
        stream.seek(SeekFrom::Start(offset))?;

        // IFD header is just the number of tags
        let tag_count = match variant {
            TiffVariant::Normal => endian.read::<2, u16>(stream)? as u64,
            TiffVariant::Big => endian.read::<8, u64>(stream)?,
        };

        // Parse each tag in the IFD
        let mut tags = Vec::with_capacity(tag_count.min(256) as usize);
        for _ in 0..tag_count {
            let code = endian.read::<2, u16>(stream)?;
            let datatype: TagType = endian.read::<2, u16>(stream)?.into();
            let count = variant.read_offset(endian, stream)? as usize;

            let data_size = count.saturating_mul(datatype.size_in_bytes());
            let offset_size = variant.offset_bytesize();

            let data = if data_size > offset_size {
                // Out-of-line values, the field holds an offset
                let data_offset = variant.read_offset(endian, stream)?;
                let pos = stream.stream_position()?;
                let mut data = vec![0; data_size];
                stream.seek(SeekFrom::Start(data_offset))?;
                stream.read_exact(&mut data)?;
                stream.seek(SeekFrom::Start(pos))?;
                data
            } else {
                let mut data = vec![0; offset_size];
                stream.read_exact(&mut data)?;
                data.truncate(data_size);
                data
            };

            tags.push(Tag {
                code,
                datatype,
                endian,
                count,
                data,
            });
        }

        let ifd = Ifd(tags);
        let next_ifd_offset = variant.read_offset(endian, stream)?;

        Ok((ifd, next_ifd_offset))
    }

    pub fn get_tag(&self, id: TagId) -> Result<&Tag, TiffError> {
        let code: u16 = id.into();
        let Self(tags) = &self;
        tags.iter()
            .find(|tag| tag.code == code)
            .ok_or(TiffError::MissingTag(id))
    }

    pub fn has_tag(&self, id: TagId) -> bool {
        self.get_tag(id).is_ok()
    }

    pub fn get_tag_values<T: NumCast>(&self, id: TagId) -> Result<Vec<T>, TiffError> {
        self.get_tag(id)?.values().ok_or(TiffError::BadTag(id))
    }

    pub fn get_tag_value<T: NumCast + Copy>(&self, id: TagId) -> Result<T, TiffError> {
        self.get_tag(id)?.value().ok_or(TiffError::BadTag(id))
    }
}
