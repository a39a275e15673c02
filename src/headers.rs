use packed_struct::prelude::*;
use crate::error::{EncodeError, Result};

pub const FILE_HEADER_SIZE: u32 = 14;
pub const INFO_HEADER_SIZE: u32 = 40;
pub const PIXEL_DATA_OFFSET: u32 = FILE_HEADER_SIZE + INFO_HEADER_SIZE;

/// "BM", stored as a little-endian word
pub const SIGNATURE: u16 = u16::from_le_bytes(*b"BM");
pub const BYTES_PER_PIXEL: u32 = 3;
pub const BITS_PER_PIXEL: u16 = 24;
pub const COMPRESSION_NONE: u32 = 0;

#[derive(PackedStruct, Debug, PartialEq)]
#[packed_struct(endian="lsb")]
pub struct FileHeader {
    pub signature: u16,
    pub file_size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    pub pixel_offset: u32,
}

#[derive(PackedStruct, Debug, PartialEq)]
#[packed_struct(endian="lsb")]
pub struct InfoHeader {
    pub header_size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

/// Sizes derived from the image dimensions; everything the headers need
/// is known before the first byte goes out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitmapLayout {
    pub width: u32,
    pub height: u32,
    pub row_padding: u32,
    pub image_size: u32,
    pub file_size: u32,
}

impl BitmapLayout {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(EncodeError::InvalidDimensions(format!("{}x{} image is empty", width, height)));
        }
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(EncodeError::InvalidDimensions(format!("{}x{} exceeds the signed header fields", width, height)));
        }

        let row_padding = row_padding(width);
        let row_bytes = width as u64 * BYTES_PER_PIXEL as u64 + row_padding as u64;
        let image_size = row_bytes * height as u64;
        let file_size = image_size + PIXEL_DATA_OFFSET as u64;
        if file_size > u32::MAX as u64 {
            return Err(EncodeError::InvalidDimensions(format!("{}x{} needs {} bytes, more than a bitmap can hold", width, height, file_size)));
        }

        Ok(Self{ width, height, row_padding, image_size: image_size as u32, file_size: file_size as u32 })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Length of one row as stored, padding included
    pub fn stride(&self) -> u32 {
        self.width * BYTES_PER_PIXEL + self.row_padding
    }

    pub fn file_header(&self) -> FileHeader {
        FileHeader{
            signature: SIGNATURE,
            file_size: self.file_size,
            reserved1: 0,
            reserved2: 0,
            pixel_offset: PIXEL_DATA_OFFSET,
        }
    }

    pub fn info_header(&self, x_pels_per_meter: i32, y_pels_per_meter: i32) -> InfoHeader {
        InfoHeader{
            header_size: INFO_HEADER_SIZE,
            width: self.width as i32,
            height: self.height as i32,
            planes: 1,
            bit_count: BITS_PER_PIXEL,
            compression: COMPRESSION_NONE,
            image_size: self.image_size,
            x_pels_per_meter,
            y_pels_per_meter,
            colors_used: 0,
            colors_important: 0,
        }
    }
}

/// Zero bytes needed to bring a row of `width` pixels to a multiple of 4
pub fn row_padding(width: u32) -> u32 {
    let row_bytes = (width as u64 * BYTES_PER_PIXEL as u64) % 4;
    ((4 - row_bytes) % 4) as u32
}

pub fn pack_file_header(header: &FileHeader) -> Result<[u8; FILE_HEADER_SIZE as usize]> {
    header.pack().map_err(|e| EncodeError::Header{ what: "file", reason: format!("{:?}", e) })
}

pub fn pack_info_header(header: &InfoHeader) -> Result<[u8; INFO_HEADER_SIZE as usize]> {
    header.pack().map_err(|e| EncodeError::Header{ what: "info", reason: format!("{:?}", e) })
}
