use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};
use crate::error::{EncodeError, Result};
use crate::headers::BitmapLayout;

/// Packs a color the way the encoder expects it: blue in bits 0..8, green
/// in 8..16, red in 16..24. The top byte is unused.
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

pub fn unpack_rgb(value: u32) -> (u8, u8, u8) {
    let r = (value >> 16) as u8;
    let g = (value >> 8) as u8;
    let b = value as u8;
    (r, g, b)
}

/// Row-major, top-to-bottom image of packed colors
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self> {
        let layout = BitmapLayout::new(width, height)?;
        if pixels.len() != layout.pixel_count() {
            return Err(EncodeError::InvalidDimensions(format!("{}x{} image needs {} pixels, got {}", width, height, layout.pixel_count(), pixels.len())));
        }
        Ok(Self{ width, height, pixels })
    }

    pub fn solid(width: u32, height: u32, color: u32) -> Result<Self> {
        let layout = BitmapLayout::new(width, height)?;
        let pixels = vec![ color; layout.pixel_count() ];
        Ok(Self{ width, height, pixels })
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u32) -> Result<Self> {
        let layout = BitmapLayout::new(width, height)?;
        let mut pixels = Vec::with_capacity(layout.pixel_count());
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Ok(Self{ width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

/// Something that can deliver an image as packed pixels.
pub trait PixelSource {
    fn dimensions(&self) -> (u32, u32);

    /// Produces `width * height` packed values, row-major from the top.
    fn grab_pixels(&mut self, width: u32, height: u32) -> Result<Vec<u32>>;
}

/// Pulls the whole image out of `source` and checks that it delivered
/// what it promised. Dimensions no bitmap can hold are refused before the
/// source is asked for anything.
pub fn capture(source: &mut dyn PixelSource) -> Result<PixelBuffer> {
    let (width, height) = source.dimensions();
    let layout = BitmapLayout::new(width, height)?;
    let pixels = source.grab_pixels(width, height)?;
    let expected = layout.pixel_count();
    if pixels.len() != expected {
        return Err(EncodeError::PixelSource(format!("expected {} pixels, source delivered {}", expected, pixels.len())));
    }
    PixelBuffer::new(width, height, pixels)
}

fn check_request(what: &str, have: (u32, u32), width: u32, height: u32) -> Result<()> {
    if have != (width, height) {
        return Err(EncodeError::PixelSource(format!("{} is {}x{}, but {}x{} was requested", what, have.0, have.1, width, height)));
    }
    Ok(())
}

impl PixelSource for PixelBuffer {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn grab_pixels(&mut self, width: u32, height: u32) -> Result<Vec<u32>> {
        check_request("pixel buffer", self.dimensions(), width, height)?;
        Ok(self.pixels.clone())
    }
}

/// 8-bit palette indices with a 256-entry RGB palette
pub struct IndexedImage<'a> {
    width: u32,
    height: u32,
    bits: &'a [u8],
    palette: &'a [u8; 768],
}

impl<'a> IndexedImage<'a> {
    pub fn new(width: u32, height: u32, bits: &'a [u8], palette: &'a [u8; 768]) -> Result<Self> {
        if bits.len() as u64 != width as u64 * height as u64 {
            return Err(EncodeError::InvalidDimensions(format!("{}x{} indexed image needs {} bytes, got {}", width, height, width as u64 * height as u64, bits.len())));
        }
        Ok(Self{ width, height, bits, palette })
    }
}

impl PixelSource for IndexedImage<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn grab_pixels(&mut self, width: u32, height: u32) -> Result<Vec<u32>> {
        check_request("indexed image", self.dimensions(), width, height)?;
        let pixels = self.bits.iter().map(|&v| {
            let v = v as usize;
            let r = self.palette[v * 3 + 0];
            let g = self.palette[v * 3 + 1];
            let b = self.palette[v * 3 + 2];
            pack_rgb(r, g, b)
        }).collect();
        Ok(pixels)
    }
}

impl PixelSource for bmp::Image {
    fn dimensions(&self) -> (u32, u32) {
        (self.get_width(), self.get_height())
    }

    fn grab_pixels(&mut self, width: u32, height: u32) -> Result<Vec<u32>> {
        check_request("decoded bitmap", self.dimensions(), width, height)?;
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let px = self.get_pixel(x, y);
                pixels.push(pack_rgb(px.r, px.g, px.b));
            }
        }
        Ok(pixels)
    }
}

/// Packed little-endian 32-bit pixels arriving over a reader. A stream
/// that ends early is a failed acquisition, not an I/O error of the output.
pub struct RawSource<R: Read> {
    width: u32,
    height: u32,
    reader: R,
}

impl<R: Read> RawSource<R> {
    pub fn new(width: u32, height: u32, reader: R) -> Self {
        Self{ width, height, reader }
    }
}

impl<R: Read> PixelSource for RawSource<R> {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn grab_pixels(&mut self, width: u32, height: u32) -> Result<Vec<u32>> {
        check_request("raw stream", self.dimensions(), width, height)?;
        let count = width as usize * height as usize;
        let mut pixels = vec![ 0u32; count ];
        self.reader.read_u32_into::<LittleEndian>(&mut pixels)
            .map_err(|e| EncodeError::PixelSource(format!("raw stream ended before {} pixels were read: {}", count, e)))?;
        Ok(pixels)
    }
}
