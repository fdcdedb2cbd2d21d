use super::chunk::{Chunk, ChunkType};
use crate::error::FormatError;
use num_enum::TryFromPrimitive;

const IHDR_LEN: usize = 13;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive)]
pub enum BitDepth {
    Eight = 8,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive)]
pub enum ColorType {
    Rgb = 2,
    RgbAlpha = 6,
}

impl ColorType {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            ColorType::Rgb => 3,
            ColorType::RgbAlpha => 4,
        }
    }
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive)]
pub enum CompressionMethod {
    Deflate = 0,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive)]
pub enum FilterMethod {
    Adaptive = 0,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive)]
pub enum InterlaceMethod {
    None = 0,
}

/// The validated contents of an IHDR chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: BitDepth,
    pub color_type: ColorType,
    pub compression_method: CompressionMethod,
    pub filter_method: FilterMethod,
    pub interlace_method: InterlaceMethod,
}

impl PngHeader {
    pub fn from_chunk(chunk: &Chunk) -> Result<Self, FormatError> {
        if chunk.chunk_type != ChunkType::ImageHeader {
            return Err(FormatError::HeaderChunkNotFirst);
        }

        if chunk.data.len() != IHDR_LEN {
            return Err(FormatError::InvalidHeaderLength(chunk.data.len()));
        }

        let width = read_u32(chunk.data, 0);
        let height = read_u32(chunk.data, 4);
        if width == 0 || height == 0 {
            return Err(FormatError::ZeroDimension { width, height });
        }

        let bit_depth = chunk.data[8];
        let color_type = chunk.data[9];
        let compression_method = chunk.data[10];
        let filter_method = chunk.data[11];
        let interlace_method = chunk.data[12];

        Ok(PngHeader {
            width,
            height,
            bit_depth: TryFrom::try_from(bit_depth)
                .map_err(|_| FormatError::UnsupportedBitDepth(bit_depth))?,
            color_type: TryFrom::try_from(color_type)
                .map_err(|_| FormatError::UnsupportedColorType(color_type))?,
            compression_method: TryFrom::try_from(compression_method)
                .map_err(|_| FormatError::UnsupportedCompressionMethod(compression_method))?,
            filter_method: TryFrom::try_from(filter_method)
                .map_err(|_| FormatError::UnsupportedFilterMethod(filter_method))?,
            interlace_method: TryFrom::try_from(interlace_method)
                .map_err(|_| FormatError::UnsupportedInterlaceMethod(interlace_method))?,
        })
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.color_type.bytes_per_pixel()
    }

    /// Bytes in one filtered scanline, not counting its filter-type byte.
    pub fn bytes_per_scanline(&self) -> Result<usize, FormatError> {
        (self.width as usize).checked_mul(self.bytes_per_pixel()).ok_or(self.too_large())
    }

    /// Length of the inflated image data: a filter byte plus the scanline,
    /// for every row.
    pub fn filtered_len(&self) -> Result<usize, FormatError> {
        self.bytes_per_scanline()?
            .checked_add(1)
            .and_then(|row| row.checked_mul(self.height as usize))
            .ok_or(self.too_large())
    }

    pub fn pixel_count(&self) -> Result<usize, FormatError> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            // The RGBA output needs four bytes for each pixel.
            .filter(|count| count.checked_mul(4).is_some())
            .ok_or(self.too_large())
    }

    fn too_large(&self) -> FormatError {
        FormatError::DimensionsTooLarge { width: self.width, height: self.height }
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}
