//! PNG container parsing and the decoder that ties it to the inflater.

pub mod chunk;
pub mod header;
pub mod unfilter;

use self::{
    chunk::{collect_image_data, read_chunk, PNG_MAGIC_BYTES},
    header::PngHeader,
};
use crate::{
    bitmap::Color, error::DecodeError, error::FormatError, inflate::DeflateDecoder,
    loader::FormatDecoder, options::DecodeOptions, zlib,
};
use tracing::debug;

/// Decodes 8-bit RGB and RGBA PNGs into RGBA pixels.
///
/// The decoder keeps its compressed and inflated byte buffers between calls,
/// so decoding a run of similarly sized images only allocates for the first
/// one. Use one decoder per thread.
#[derive(Debug, Clone, Default)]
pub struct PngDecoder {
    inflater: DeflateDecoder,
    compressed: Vec<u8>,
    options: DecodeOptions,
    header: Option<PngHeader>,
}

impl PngDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self { options, ..Self::default() }
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    /// Header of the last image that decoded successfully.
    pub fn header(&self) -> Option<&PngHeader> {
        self.header.as_ref()
    }

    /// Decodes `bytes` into `pixels`, returning the image's width and height.
    ///
    /// `pixels` ends up holding exactly `width * height` entries. Its
    /// allocation is reused and only grows when it is too small.
    pub fn decode_into(
        &mut self,
        bytes: &[u8],
        pixels: &mut Vec<Color>,
    ) -> Result<(u32, u32), DecodeError> {
        self.header = None;

        if !bytes.starts_with(PNG_MAGIC_BYTES) {
            return Err(FormatError::InvalidSignature.into());
        }

        let bytes = &bytes[PNG_MAGIC_BYTES.len()..];
        let verify_crc = self.options.verify_chunk_crc;

        let header_chunk = read_chunk(bytes, verify_crc)?;
        let header = PngHeader::from_chunk(&header_chunk)?;
        let pixel_count = header.pixel_count()?;

        debug!(
            width = header.width,
            height = header.height,
            color_type = ?header.color_type,
            "decoding PNG"
        );

        collect_image_data(&bytes[header_chunk.byte_size()..], verify_crc, &mut self.compressed)?;

        let scanlines =
            zlib::decompress(&mut self.inflater, &self.compressed, self.options.verify_adler32)?;

        debug!(
            compressed = self.compressed.len(),
            inflated = scanlines.len(),
            "inflated image data"
        );

        // Check before touching `pixels` so a bogus header can't make us
        // allocate far more than the data could ever fill.
        let expected = header.filtered_len()?;
        if scanlines.len() < expected {
            return Err(FormatError::ImageDataTooShort { expected, actual: scanlines.len() }.into());
        }

        pixels.clear();
        pixels.try_reserve(pixel_count)?;
        pixels.resize(pixel_count, Color::TRANSPARENT);

        unfilter::unfilter(&header, scanlines, bytemuck::cast_slice_mut(pixels.as_mut_slice()))?;

        let dimensions = (header.width, header.height);
        self.header = Some(header);

        Ok(dimensions)
    }
}

impl FormatDecoder for PngDecoder {
    fn extensions(&self) -> &[&str] {
        &["png"]
    }

    fn decode_into(
        &mut self,
        bytes: &[u8],
        pixels: &mut Vec<Color>,
    ) -> Result<(u32, u32), DecodeError> {
        PngDecoder::decode_into(self, bytes, pixels)
    }
}
