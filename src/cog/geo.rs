// https://docs.ogc.org/is/19-008r4/19-008r4.html#_raster_to_model_coordinate_transformation_requirements

use super::CogError;
use crate::tiff::{Ifd, TagId};

/// Affine placement of the full resolution image in model space.
///
/// Only axis-aligned rasters are supported, rotation terms of a
/// ModelTransformation are ignored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoReference {
    /// Model units per pixel (x, y), always positive
    pub pixel_scale: (f64, f64),
    /// Model coordinate of the upper left corner of pixel (0, 0)
    pub origin: (f64, f64),
}

impl GeoReference {
    pub fn from_ifd(ifd: &Ifd) -> Result<Self, CogError> {
        let scale = ifd.get_tag_values::<f64>(TagId::ModelPixelScale).ok();
        let tiepoint = ifd.get_tag_values::<f64>(TagId::ModelTiepoint).ok();
        let transformation = ifd.get_tag_values::<f64>(TagId::ModelTransformation).ok();

        let (pixel_scale, origin) = match (scale, tiepoint, transformation) {
            (Some(scale), tiepoint, _) if scale.len() >= 2 => {
                let origin = match tiepoint.as_deref() {
                    Some([i, j, _, x, y, ..]) => (x - i * scale[0], y + j * scale[1]),
                    _ => (0.0, 0.0),
                };
                ((scale[0], scale[1]), origin)
            }
            (_, _, Some(m)) if m.len() >= 16 => ((m[0].abs(), m[5].abs()), (m[3], m[7])),
            _ => return Err(CogError::NotGeoreferenced),
        };

        if !(pixel_scale.0 > 0.0 && pixel_scale.1 > 0.0)
            || !pixel_scale.0.is_finite()
            || !pixel_scale.1.is_finite()
        {
            return Err(CogError::InvalidPixelScale(pixel_scale));
        }

        Ok(Self {
            pixel_scale,
            origin,
        })
    }

    /// Model space size of an image with the given full resolution dimensions
    pub fn extent(&self, dimensions: (u32, u32)) -> (f64, f64) {
        (
            self.pixel_scale.0 * dimensions.0 as f64,
            self.pixel_scale.1 * dimensions.1 as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::{Endian, Tag, TagType};

    fn double_tag(id: TagId, values: &[f64]) -> Tag {
        Tag {
            code: id.into(),
            datatype: TagType::Double,
            count: values.len(),
            data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            endian: Endian::Little,
        }
    }

    #[test]
    fn scale_and_tiepoint() {
        let ifd = Ifd(vec![
            double_tag(TagId::ModelPixelScale, &[0.04, 0.04, 0.0]),
            double_tag(TagId::ModelTiepoint, &[0.0, 0.0, 0.0, 400_000.0, 5_300_000.0, 0.0]),
        ]);
        let geo = GeoReference::from_ifd(&ifd).unwrap();
        assert_eq!(geo.pixel_scale, (0.04, 0.04));
        assert_eq!(geo.origin, (400_000.0, 5_300_000.0));

        let (w, h) = geo.extent((1000, 500));
        assert!((w - 40.0).abs() < 1e-9);
        assert!((h - 20.0).abs() < 1e-9);
    }

    #[test]
    fn transformation_matrix() {
        #[rustfmt::skip]
        let matrix = [
            10.0, 0.0, 0.0, 500.0,
            0.0, -10.0, 0.0, 900.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        let ifd = Ifd(vec![double_tag(TagId::ModelTransformation, &matrix)]);
        let geo = GeoReference::from_ifd(&ifd).unwrap();
        assert_eq!(geo.pixel_scale, (10.0, 10.0));
        assert_eq!(geo.origin, (500.0, 900.0));
    }

    #[test]
    fn requires_georeferencing() {
        assert!(matches!(
            GeoReference::from_ifd(&Ifd(vec![])),
            Err(CogError::NotGeoreferenced)
        ));
        let ifd = Ifd(vec![double_tag(TagId::ModelPixelScale, &[0.0, 1.0, 0.0])]);
        assert!(matches!(
            GeoReference::from_ifd(&ifd),
            Err(CogError::InvalidPixelScale(_))
        ));
    }
}
