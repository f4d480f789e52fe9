//! Sample decoding and predictor reversal for decompressed chunks

use byteorder::{BigEndian, LittleEndian};

use crate::errors::{BandTraceError, BandResult};
use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::{predictor, sample_format};

/// How samples are packed inside a decompressed chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleLayout {
    pub bits_per_sample: u16,
    pub sample_format: u64,
    /// Samples interleaved per pixel inside one chunk (1 for planar files)
    pub samples_per_pixel: usize,
    pub byte_order: ByteOrder,
}

impl SampleLayout {
    /// Validates the combination of bit depth and sample format
    pub fn new(bits_per_sample: u16, sample_format: u64, samples_per_pixel: usize, byte_order: ByteOrder) -> BandResult<Self> {
        let supported = match sample_format {
            sample_format::UNSIGNED | sample_format::SIGNED => matches!(bits_per_sample, 8 | 16 | 32 | 64),
            sample_format::IEEEFP => matches!(bits_per_sample, 32 | 64),
            _ => false,
        };

        if !supported || samples_per_pixel == 0 {
            return Err(BandTraceError::UnsupportedSampleLayout(format!(
                "{} bits, sample format {}, {} samples per pixel",
                bits_per_sample, sample_format, samples_per_pixel
            )));
        }

        Ok(SampleLayout { bits_per_sample, sample_format, samples_per_pixel, byte_order })
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// Bytes of one row of `width` pixels
    pub fn row_bytes(&self, width: usize) -> usize {
        width * self.samples_per_pixel * self.bytes_per_sample()
    }

    /// Decodes the first sample of every pixel in `data`
    pub fn decode_first_samples(&self, data: &[u8]) -> Vec<f64> {
        match self.byte_order {
            ByteOrder::LittleEndian => self.decode::<LittleEndian>(data),
            ByteOrder::BigEndian => self.decode::<BigEndian>(data),
        }
    }

    fn decode<B: byteorder::ByteOrder>(&self, data: &[u8]) -> Vec<f64> {
        let pixel_bytes = self.bytes_per_sample() * self.samples_per_pixel;
        let size = self.bytes_per_sample();

        data.chunks_exact(pixel_bytes)
            .map(|pixel| {
                let s = &pixel[..size];
                match (self.sample_format, self.bits_per_sample) {
                    (sample_format::IEEEFP, 32) => B::read_f32(s) as f64,
                    (sample_format::IEEEFP, _) => B::read_f64(s),
                    (sample_format::SIGNED, 8) => s[0] as i8 as f64,
                    (sample_format::SIGNED, 16) => B::read_i16(s) as f64,
                    (sample_format::SIGNED, 32) => B::read_i32(s) as f64,
                    (sample_format::SIGNED, _) => B::read_i64(s) as f64,
                    (_, 8) => s[0] as f64,
                    (_, 16) => B::read_u16(s) as f64,
                    (_, 32) => B::read_u32(s) as f64,
                    _ => B::read_u64(s) as f64,
                }
            })
            .collect()
    }

    /// Reverses the TIFF predictor in place
    ///
    /// # Arguments
    /// * `data` - Decompressed chunk
    /// * `width` - Chunk width in pixels
    /// * `predictor_code` - Value of the Predictor tag
    pub fn undo_predictor(&self, data: &mut [u8], width: usize, predictor_code: u64) -> BandResult<()> {
        let row_bytes = self.row_bytes(width);
        if row_bytes == 0 {
            return Ok(());
        }

        match predictor_code {
            predictor::NONE => Ok(()),
            predictor::HORIZONTAL_DIFFERENCING => {
                for row in data.chunks_exact_mut(row_bytes) {
                    match self.byte_order {
                        ByteOrder::LittleEndian => self.accumulate_row::<LittleEndian>(row),
                        ByteOrder::BigEndian => self.accumulate_row::<BigEndian>(row),
                    }
                }
                Ok(())
            },
            predictor::FLOATING_POINT if self.sample_format == sample_format::IEEEFP => {
                for row in data.chunks_exact_mut(row_bytes) {
                    self.unshuffle_float_row(row);
                }
                Ok(())
            },
            other => Err(BandTraceError::UnsupportedSampleLayout(format!(
                "predictor {} with sample format {}",
                other, self.sample_format
            ))),
        }
    }

    /// Horizontal differencing: each sample is stored as the difference to
    /// the same sample of the previous pixel
    fn accumulate_row<B: byteorder::ByteOrder>(&self, row: &mut [u8]) {
        let size = self.bytes_per_sample();
        let stride = size * self.samples_per_pixel;

        for i in (stride..row.len()).step_by(size) {
            let prev = i - stride;
            match size {
                1 => row[i] = row[i].wrapping_add(row[prev]),
                2 => {
                    let v = B::read_u16(&row[i..]).wrapping_add(B::read_u16(&row[prev..]));
                    B::write_u16(&mut row[i..], v);
                },
                4 => {
                    let v = B::read_u32(&row[i..]).wrapping_add(B::read_u32(&row[prev..]));
                    B::write_u32(&mut row[i..], v);
                },
                _ => {
                    let v = B::read_u64(&row[i..]).wrapping_add(B::read_u64(&row[prev..]));
                    B::write_u64(&mut row[i..], v);
                },
            }
        }
    }

    /// Floating-point predictor: bytes are differenced across the whole row,
    /// then stored as byte planes, most significant plane first
    fn unshuffle_float_row(&self, row: &mut [u8]) {
        let size = self.bytes_per_sample();
        let stride = self.samples_per_pixel;
        for i in stride..row.len() {
            row[i] = row[i].wrapping_add(row[i - stride]);
        }

        let count = row.len() / size;
        let planes = row.to_vec();
        for i in 0..count {
            for b in 0..size {
                // Big-endian byte b of sample i lives in plane b
                let value = planes[b * count + i];
                let index = match self.byte_order {
                    ByteOrder::BigEndian => i * size + b,
                    ByteOrder::LittleEndian => i * size + (size - 1 - b),
                };
                row[index] = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(bits: u16, format: u64, order: ByteOrder) -> SampleLayout {
        SampleLayout::new(bits, format, 1, order).unwrap()
    }

    #[test]
    fn test_rejects_unsupported_layouts() {
        assert!(SampleLayout::new(12, sample_format::UNSIGNED, 1, ByteOrder::LittleEndian).is_err());
        assert!(SampleLayout::new(16, sample_format::IEEEFP, 1, ByteOrder::LittleEndian).is_err());
    }

    #[test]
    fn test_decodes_first_sample_only() {
        let rgb = SampleLayout::new(8, sample_format::UNSIGNED, 3, ByteOrder::LittleEndian).unwrap();
        assert_eq!(rgb.decode_first_samples(&[1, 2, 3, 4, 5, 6]), vec![1.0, 4.0]);
    }

    #[test]
    fn test_decodes_signed_big_endian() {
        let l = layout(16, sample_format::SIGNED, ByteOrder::BigEndian);
        assert_eq!(l.decode_first_samples(&[0xFF, 0xFE, 0x00, 0x10]), vec![-2.0, 16.0]);
    }

    #[test]
    fn test_horizontal_predictor_16_bit() {
        let l = layout(16, sample_format::UNSIGNED, ByteOrder::LittleEndian);
        // 100, +5, -3 (wrapping)
        let mut data = Vec::new();
        for v in [100u16, 5, 0u16.wrapping_sub(3)] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        l.undo_predictor(&mut data, 3, predictor::HORIZONTAL_DIFFERENCING).unwrap();
        assert_eq!(l.decode_first_samples(&data), vec![100.0, 105.0, 102.0]);
    }

    #[test]
    fn test_floating_point_predictor() {
        let values = [1.5f32, -2.25, 1000.0];
        let l = layout(32, sample_format::IEEEFP, ByteOrder::LittleEndian);

        // Encode: byte planes of big-endian bytes, then byte differencing
        let count = values.len();
        let mut encoded = vec![0u8; count * 4];
        for (i, v) in values.iter().enumerate() {
            for (b, byte) in v.to_be_bytes().iter().enumerate() {
                encoded[b * count + i] = *byte;
            }
        }
        for i in (1..encoded.len()).rev() {
            encoded[i] = encoded[i].wrapping_sub(encoded[i - 1]);
        }

        l.undo_predictor(&mut encoded, count, predictor::FLOATING_POINT).unwrap();
        assert_eq!(l.decode_first_samples(&encoded), vec![1.5, -2.25, 1000.0]);
    }
}
