//! GeoTIFF fixtures for integration tests
//!
//! Writes little-endian classic TIFFs holding one float32 band, with
//! tiepoint/pixel-scale georeferencing, a GeoKey directory and an optional
//! GDAL_NODATA tag.

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;

const SHORT: u16 = 3;
const LONG: u16 = 4;
const ASCII: u16 = 2;
const DOUBLE: u16 = 12;

/// Chunk layout of a fixture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Layout {
    /// One strip per `rows_per_strip` rows
    Strips { rows_per_strip: usize },
    /// Square tiles
    Tiles { size: usize },
}

/// Single-band float32 GeoTIFF description
#[derive(Debug, Clone)]
pub struct GeoTiffFixture {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f32>,
    /// Top-left corner of the top-left pixel
    pub origin: (f64, f64),
    pub pixel_size: f64,
    pub epsg: Option<u16>,
    pub nodata: Option<String>,
    pub deflate: bool,
    pub layout: Layout,
}

impl GeoTiffFixture {
    /// UTM 33N fixture with 1 m pixels
    pub fn new(rows: usize, cols: usize, values: Vec<f32>) -> Self {
        assert_eq!(values.len(), rows * cols);
        GeoTiffFixture {
            rows,
            cols,
            values,
            origin: (500_000.0, 5_760_000.0),
            pixel_size: 1.0,
            epsg: Some(32633),
            nodata: None,
            deflate: false,
            layout: Layout::Strips { rows_per_strip: rows },
        }
    }

    /// Grid where every cell holds `f(row, col)`
    pub fn from_fn(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f32) -> Self {
        let values = (0..rows * cols).map(|i| f(i / cols, i % cols)).collect();
        Self::new(rows, cols, values)
    }

    pub fn with_nodata(mut self, nodata: &str) -> Self {
        self.nodata = Some(nodata.to_string());
        self
    }

    pub fn with_deflate(mut self) -> Self {
        self.deflate = true;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_pixel_size(mut self, pixel_size: f64) -> Self {
        self.pixel_size = pixel_size;
        self
    }

    pub fn with_epsg(mut self, epsg: Option<u16>) -> Self {
        self.epsg = epsg;
        self
    }

    /// Row-major chunks, each as `(rows, cols)` cells of `chunk_cols` width
    fn chunks(&self) -> Vec<Vec<f32>> {
        match self.layout {
            Layout::Strips { rows_per_strip } => self
                .values
                .chunks(rows_per_strip * self.cols)
                .map(<[f32]>::to_vec)
                .collect(),
            Layout::Tiles { size } => {
                let mut tiles = Vec::new();
                for tile_row in (0..self.rows).step_by(size) {
                    for tile_col in (0..self.cols).step_by(size) {
                        let mut tile = vec![0.0f32; size * size];
                        for r in 0..size {
                            for c in 0..size {
                                let (row, col) = (tile_row + r, tile_col + c);
                                if row < self.rows && col < self.cols {
                                    tile[r * size + c] = self.values[row * self.cols + col];
                                }
                            }
                        }
                        tiles.push(tile);
                    }
                }
                tiles
            },
        }
    }

    fn encode_chunk(&self, chunk: &[f32]) -> Vec<u8> {
        let mut raw = Vec::with_capacity(chunk.len() * 4);
        for value in chunk {
            raw.write_f32::<LittleEndian>(*value).unwrap();
        }
        if !self.deflate {
            return raw;
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).unwrap();
        encoder.finish().unwrap()
    }

    fn geo_keys(&self) -> Vec<u16> {
        let mut keys = vec![1, 1, 0, 0];
        let mut push = |key: u16, value: u16| keys.extend_from_slice(&[key, 0, 1, value]);

        match self.epsg {
            Some(code) if (4000..5000).contains(&code) => {
                push(1024, 2);
                push(1025, 1);
                push(2048, code);
            },
            Some(code) => {
                push(1024, 1);
                push(1025, 1);
                push(3072, code);
            },
            None => push(1025, 1),
        }

        keys[3] = ((keys.len() - 4) / 4) as u16;
        keys
    }

    /// Serializes the fixture
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf: Vec<u8> = Vec::new();
        buf.extend_from_slice(b"II");
        buf.write_u16::<LittleEndian>(42).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();

        let mut offsets = Vec::new();
        let mut counts = Vec::new();
        for chunk in self.chunks() {
            let bytes = self.encode_chunk(&chunk);
            offsets.push(buf.len() as u32);
            counts.push(bytes.len() as u32);
            buf.extend_from_slice(&bytes);
        }

        let mut entries: Vec<(u16, u16, u32, Vec<u8>)> = Vec::new();
        let shorts = |values: &[u16]| {
            let mut bytes = Vec::new();
            values.iter().for_each(|v| bytes.write_u16::<LittleEndian>(*v).unwrap());
            bytes
        };
        let longs = |values: &[u32]| {
            let mut bytes = Vec::new();
            values.iter().for_each(|v| bytes.write_u32::<LittleEndian>(*v).unwrap());
            bytes
        };
        let doubles = |values: &[f64]| {
            let mut bytes = Vec::new();
            values.iter().for_each(|v| bytes.write_f64::<LittleEndian>(*v).unwrap());
            bytes
        };

        entries.push((256, LONG, 1, longs(&[self.cols as u32])));
        entries.push((257, LONG, 1, longs(&[self.rows as u32])));
        entries.push((258, SHORT, 1, shorts(&[32])));
        entries.push((259, SHORT, 1, shorts(&[if self.deflate { 8 } else { 1 }])));
        entries.push((262, SHORT, 1, shorts(&[1])));
        entries.push((277, SHORT, 1, shorts(&[1])));
        entries.push((339, SHORT, 1, shorts(&[3])));

        match self.layout {
            Layout::Strips { rows_per_strip } => {
                entries.push((273, LONG, offsets.len() as u32, longs(&offsets)));
                entries.push((278, LONG, 1, longs(&[rows_per_strip as u32])));
                entries.push((279, LONG, counts.len() as u32, longs(&counts)));
            },
            Layout::Tiles { size } => {
                entries.push((322, LONG, 1, longs(&[size as u32])));
                entries.push((323, LONG, 1, longs(&[size as u32])));
                entries.push((324, LONG, offsets.len() as u32, longs(&offsets)));
                entries.push((325, LONG, counts.len() as u32, longs(&counts)));
            },
        }

        entries.push((33550, DOUBLE, 3, doubles(&[self.pixel_size, self.pixel_size, 0.0])));
        entries.push((33922, DOUBLE, 6, doubles(&[0.0, 0.0, 0.0, self.origin.0, self.origin.1, 0.0])));
        let keys = self.geo_keys();
        entries.push((34735, SHORT, keys.len() as u32, shorts(&keys)));

        if let Some(nodata) = &self.nodata {
            let mut text = nodata.clone().into_bytes();
            text.push(0);
            entries.push((42113, ASCII, text.len() as u32, text));
        }

        entries.sort_by_key(|entry| entry.0);

        // Out-of-line values go before the IFD
        let mut fields = Vec::new();
        for (tag, field_type, count, bytes) in entries {
            if bytes.len() > 4 {
                if buf.len() % 2 == 1 {
                    buf.push(0);
                }
                let offset = buf.len() as u32;
                buf.extend_from_slice(&bytes);
                fields.push((tag, field_type, count, longs(&[offset])));
            } else {
                let mut inline = bytes;
                inline.resize(4, 0);
                fields.push((tag, field_type, count, inline));
            }
        }

        if buf.len() % 2 == 1 {
            buf.push(0);
        }
        let ifd_offset = buf.len() as u32;
        buf.write_u16::<LittleEndian>(fields.len() as u16).unwrap();
        for (tag, field_type, count, value) in fields {
            buf.write_u16::<LittleEndian>(tag).unwrap();
            buf.write_u16::<LittleEndian>(field_type).unwrap();
            buf.write_u32::<LittleEndian>(count).unwrap();
            buf.extend_from_slice(&value);
        }
        buf.write_u32::<LittleEndian>(0).unwrap();

        buf[4..8].copy_from_slice(&ifd_offset.to_le_bytes());
        buf
    }

    /// Writes the fixture to `path`
    pub fn write(&self, path: &Path) {
        fs::write(path, self.to_bytes()).unwrap();
    }
}
