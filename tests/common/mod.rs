//! Little endian tiled GeoTIFFs built in memory.

#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use std::io::Write;

const SHORT: u16 = 3;
const LONG: u16 = 4;
const DOUBLE: u16 = 12;

/// Full resolution pixel size in model units
pub const PIXEL_SCALE: f64 = 10.0;
pub const ORIGIN: (f64, f64) = (500_000.0, 5_000_000.0);

#[derive(Clone, Debug)]
pub struct TestLevel {
    pub width: u32,
    pub height: u32,
    pub tile: u32,
    pub rgb: [u8; 3],
    pub deflate: bool,
    /// Tiles written with a zero byte count
    pub sparse: Vec<usize>,
}

impl TestLevel {
    pub fn new(width: u32, height: u32, tile: u32, rgb: [u8; 3]) -> Self {
        Self {
            width,
            height,
            tile,
            rgb,
            deflate: false,
            sparse: vec![],
        }
    }

    pub fn deflated(mut self) -> Self {
        self.deflate = true;
        self
    }

    pub fn with_sparse(mut self, tiles: &[usize]) -> Self {
        self.sparse = tiles.to_vec();
        self
    }

    fn tile_count(&self) -> usize {
        (self.width.div_ceil(self.tile) * self.height.div_ceil(self.tile)) as usize
    }

    fn tile_bytes(&self) -> Vec<u8> {
        let raw: Vec<u8> = self
            .rgb
            .iter()
            .copied()
            .cycle()
            .take((self.tile * self.tile * 3) as usize)
            .collect();
        if self.deflate {
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&raw).unwrap();
            encoder.finish().unwrap()
        } else {
            raw
        }
    }
}

struct Entry {
    tag: u16,
    kind: u16,
    count: u32,
    data: Vec<u8>,
}

fn shorts(tag: u16, values: &[u16]) -> Entry {
    Entry {
        tag,
        kind: SHORT,
        count: values.len() as u32,
        data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
    }
}

fn longs(tag: u16, values: &[u32]) -> Entry {
    Entry {
        tag,
        kind: LONG,
        count: values.len() as u32,
        data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
    }
}

fn doubles(tag: u16, values: &[f64]) -> Entry {
    Entry {
        tag,
        kind: DOUBLE,
        count: values.len() as u32,
        data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
    }
}

/// Tile data first, IFDs last so headers need more than a small prefix.
pub fn build_cog(levels: &[TestLevel]) -> Vec<u8> {
    let mut bytes = b"II*\0\0\0\0\0".to_vec();

    let mut level_tiles = vec![];
    for level in levels {
        let mut offsets = vec![];
        let mut counts = vec![];
        for index in 0..level.tile_count() {
            if level.sparse.contains(&index) {
                offsets.push(0);
                counts.push(0);
                continue;
            }
            let tile = level.tile_bytes();
            offsets.push(bytes.len() as u32);
            counts.push(tile.len() as u32);
            bytes.extend_from_slice(&tile);
        }
        level_tiles.push((offsets, counts));
    }

    let mut next_pointer = 4;
    for (i, (level, (offsets, counts))) in levels.iter().zip(level_tiles).enumerate() {
        let mut entries = vec![];
        if i > 0 {
            entries.push(longs(254, &[1]));
        }
        entries.extend([
            longs(256, &[level.width]),
            longs(257, &[level.height]),
            shorts(258, &[8, 8, 8]),
            shorts(259, &[if level.deflate { 8 } else { 1 }]),
            shorts(262, &[2]),
            shorts(277, &[3]),
            shorts(284, &[1]),
            longs(322, &[level.tile]),
            longs(323, &[level.tile]),
            longs(324, &offsets),
            longs(325, &counts),
        ]);
        if i == 0 {
            entries.push(doubles(33550, &[PIXEL_SCALE, PIXEL_SCALE, 0.0]));
            entries.push(doubles(33922, &[0.0, 0.0, 0.0, ORIGIN.0, ORIGIN.1, 0.0]));
        }

        if bytes.len() % 2 == 1 {
            bytes.push(0);
        }
        let ifd_offset = bytes.len() as u32;
        bytes[next_pointer..next_pointer + 4].copy_from_slice(&ifd_offset.to_le_bytes());

        let mut external_offset = ifd_offset + 2 + 12 * entries.len() as u32 + 4;
        let mut external = vec![];
        bytes.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for entry in &entries {
            bytes.extend_from_slice(&entry.tag.to_le_bytes());
            bytes.extend_from_slice(&entry.kind.to_le_bytes());
            bytes.extend_from_slice(&entry.count.to_le_bytes());
            if entry.data.len() <= 4 {
                let mut inline = entry.data.clone();
                inline.resize(4, 0);
                bytes.extend_from_slice(&inline);
            } else {
                bytes.extend_from_slice(&external_offset.to_le_bytes());
                external_offset += entry.data.len() as u32;
                external.extend_from_slice(&entry.data);
            }
        }
        next_pointer = bytes.len();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&external);
    }

    bytes
}

/// 32x32 at 10 m with a 16x16 overview at 20 m
pub fn two_level_cog() -> Vec<u8> {
    build_cog(&[
        TestLevel::new(32, 32, 16, [10, 20, 30]).with_sparse(&[3]),
        TestLevel::new(16, 16, 16, [110, 120, 130]).deflated(),
    ])
}

pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("cogview-{name}-{}.tif", std::process::id()))
}
