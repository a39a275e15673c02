use std::io::Write;

use byteorder::WriteBytesExt;
use crate::error::{EncodeError, Result};
use crate::headers::{self, BitmapLayout};
use crate::pixels::{self, PixelBuffer};

/// Writes uncompressed 24-bit bitmaps. Holds nothing but the resolution to
/// put in the info header; every encode computes its own layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitmapEncoder {
    x_pels_per_meter: i32,
    y_pels_per_meter: i32,
}

impl BitmapEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolution(mut self, x_pels_per_meter: i32, y_pels_per_meter: i32) -> Self {
        self.x_pels_per_meter = x_pels_per_meter;
        self.y_pels_per_meter = y_pels_per_meter;
        self
    }

    /// Streams `pixels` (row-major, top row first) as a complete BMP file.
    /// Dimensions are checked before anything reaches `out`.
    pub fn encode<W: Write>(&self, pixels: &[u32], width: u32, height: u32, out: &mut W) -> Result<BitmapLayout> {
        let layout = Self::layout_for(pixels, width, height)?;
        self.write_bitmap(&layout, pixels, out)?;
        Ok(layout)
    }

    pub fn encode_buffer<W: Write>(&self, buffer: &PixelBuffer, out: &mut W) -> Result<BitmapLayout> {
        self.encode(buffer.pixels(), buffer.width(), buffer.height(), out)
    }

    pub fn encode_to_vec(&self, pixels: &[u32], width: u32, height: u32) -> Result<Vec<u8>> {
        let layout = Self::layout_for(pixels, width, height)?;
        let mut out = Vec::with_capacity(layout.file_size as usize);
        self.write_bitmap(&layout, pixels, &mut out)?;
        Ok(out)
    }

    fn layout_for(pixels: &[u32], width: u32, height: u32) -> Result<BitmapLayout> {
        let layout = BitmapLayout::new(width, height)?;
        if pixels.len() != layout.pixel_count() {
            return Err(EncodeError::InvalidDimensions(format!("{}x{} image needs {} pixels, got {}", width, height, layout.pixel_count(), pixels.len())));
        }
        Ok(layout)
    }

    fn write_bitmap<W: Write>(&self, layout: &BitmapLayout, pixels: &[u32], out: &mut W) -> Result<()> {
        log::debug!("encoding {}x{} bitmap: padding {} file size {}", layout.width, layout.height, layout.row_padding, layout.file_size);

        let file_header = headers::pack_file_header(&layout.file_header())?;
        let info_header = headers::pack_info_header(&layout.info_header(self.x_pels_per_meter, self.y_pels_per_meter))?;
        out.write_all(&file_header)?;
        out.write_all(&info_header)?;

        // Rows go out bottom-up
        let stride = layout.stride() as usize;
        let mut row_out = Vec::<u8>::with_capacity(stride);
        for row in pixels.chunks_exact(layout.width as usize).rev() {
            row_out.clear();
            for &value in row {
                let (r, g, b) = pixels::unpack_rgb(value);
                row_out.write_u8(b)?;
                row_out.write_u8(g)?;
                row_out.write_u8(r)?;
            }
            row_out.resize(stride, 0);
            out.write_all(&row_out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ByteOrder, LittleEndian};
    use std::io;

    #[test]
    fn single_pixel() {
        let data = BitmapEncoder::new().encode_to_vec(&[ 0x00112233 ], 1, 1).unwrap();
        assert_eq!(data.len(), 58);
        assert_eq!(&data[0..2], b"BM");
        assert_eq!(LittleEndian::read_u32(&data[2..6]), 58);
        assert_eq!(LittleEndian::read_u32(&data[34..38]), 4);
        assert_eq!(&data[54..], &[ 0x33, 0x22, 0x11, 0x00 ]);
    }

    #[test]
    fn unpadded_rows_are_reversed() {
        let pixels: Vec<u32> = (0..8).collect();
        let data = BitmapEncoder::new().encode_to_vec(&pixels, 4, 2).unwrap();
        assert_eq!(data.len(), 54 + 24);
        assert_eq!(&data[54..57], &[ 4, 0, 0 ]);
        assert_eq!(&data[66..69], &[ 0, 0, 0 ]);
        assert_eq!(&data[75..78], &[ 3, 0, 0 ]);
    }

    #[test]
    fn alpha_byte_is_dropped() {
        let data = BitmapEncoder::new().encode_to_vec(&[ 0xff000000, 0x80ffffff ], 2, 1).unwrap();
        assert_eq!(&data[54..], &[ 0, 0, 0, 0xff, 0xff, 0xff, 0, 0 ]);
    }

    #[test]
    fn resolution_is_written_verbatim() {
        let encoder = BitmapEncoder::new().with_resolution(3780, 2835);
        let data = encoder.encode_to_vec(&[ 0 ], 1, 1).unwrap();
        assert_eq!(LittleEndian::read_i32(&data[38..42]), 3780);
        assert_eq!(LittleEndian::read_i32(&data[42..46]), 2835);

        let data = BitmapEncoder::new().encode_to_vec(&[ 0 ], 1, 1).unwrap();
        assert_eq!(&data[38..46], &[ 0u8; 8 ]);
    }

    #[test]
    fn bad_input_writes_nothing() {
        let mut out = Vec::new();
        let encoder = BitmapEncoder::new();
        assert!(matches!(encoder.encode(&[], 0, 1, &mut out), Err(EncodeError::InvalidDimensions(_))));
        assert!(matches!(encoder.encode(&[ 0; 3 ], 2, 2, &mut out), Err(EncodeError::InvalidDimensions(_))));
        assert!(out.is_empty());
        assert!(matches!(encoder.encode_to_vec(&[ 0; 5 ], 2, 2), Err(EncodeError::InvalidDimensions(_))));
    }

    struct FullDisk {
        room: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.room == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(self.room);
            self.room -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_failure_is_propagated() {
        let pixels = vec![ 0u32; 16 ];
        let mut sink = FullDisk{ room: 60 };
        let result = BitmapEncoder::new().encode(&pixels, 4, 4, &mut sink);
        assert!(matches!(result, Err(EncodeError::Io(_))));
    }
}
