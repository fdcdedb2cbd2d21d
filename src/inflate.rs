//! Raw DEFLATE (RFC 1951) decompression.

use crate::{
    bit_reader::BitReader,
    error::{DecodeError, DeflateError},
    huffman::HuffmanTable,
};
use num_enum::TryFromPrimitive;
use tracing::trace;

/// Base lengths for literal/length symbols 257..=285.
const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

/// Extra bits for literal/length symbols 257..=285. 285 is pinned to exactly 258.
const LENGTH_EXTRA: [u8; 29] =
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0];

const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Order in which the code length code lengths are stored.
const CODE_LENGTH_ORDER: [usize; 19] =
    [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

const END_OF_BLOCK: u16 = 256;

// HLIT tops out at 257 + 31, HDIST at 1 + 31.
const MAX_LENGTHS: usize = 288 + 32;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, TryFromPrimitive)]
enum BlockType {
    Stored = 0,
    FixedHuffman = 1,
    DynamicHuffman = 2,
}

/// Decompresses raw DEFLATE streams.
///
/// The output buffer is kept between calls and only ever grows, so decoding
/// many images with one `DeflateDecoder` settles into zero allocations. A
/// decoder is not meant to be shared between threads; use one per thread.
#[derive(Debug, Clone)]
pub struct DeflateDecoder {
    output: Vec<u8>,
    lengths: [u8; MAX_LENGTHS],
    code_lengths: HuffmanTable,
    lit_len: HuffmanTable,
    dist: HuffmanTable,
    fixed_lit_len: HuffmanTable,
    fixed_dist: HuffmanTable,
}

impl Default for DeflateDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DeflateDecoder {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            lengths: [0; MAX_LENGTHS],
            code_lengths: HuffmanTable::new(),
            lit_len: HuffmanTable::new(),
            dist: HuffmanTable::new(),
            fixed_lit_len: HuffmanTable::fixed_literal_length(),
            fixed_dist: HuffmanTable::fixed_distance(),
        }
    }

    /// Inflates the raw DEFLATE stream in `data` starting at `start`.
    ///
    /// The returned slice borrows the decoder's internal buffer and is
    /// overwritten by the next call.
    pub fn decompress(&mut self, data: &[u8], start: usize) -> Result<&[u8], DecodeError> {
        let mut reader = BitReader::new(data, start);
        self.inflate_stream(&mut reader)?;
        Ok(&self.output)
    }

    /// Output of the last call. After an error this holds whatever was
    /// decoded before the error was found.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Decodes blocks from `reader` until the final one. On return the reader
    /// sits just after the last bit of the stream.
    pub(crate) fn inflate_stream(&mut self, reader: &mut BitReader) -> Result<(), DecodeError> {
        self.output.clear();

        let wanted = reader.input_len().max(1).next_power_of_two();
        if self.output.capacity() < wanted {
            self.output.try_reserve(wanted)?;
        }

        loop {
            let is_final = reader.next_bit()? == 1;
            let block_type = BlockType::try_from(reader.read_bits(2, 0)? as u8)
                .map_err(|_| DeflateError::ReservedBlockType)?;

            trace!(?block_type, is_final, output_len = self.output.len(), "deflate block");

            match block_type {
                BlockType::Stored => inflate_stored(reader, &mut self.output)?,
                BlockType::FixedHuffman => {
                    inflate_codes(reader, &self.fixed_lit_len, &self.fixed_dist, &mut self.output)?
                },
                BlockType::DynamicHuffman => {
                    self.read_dynamic_tables(reader)?;
                    inflate_codes(reader, &self.lit_len, &self.dist, &mut self.output)?
                },
            }

            if is_final {
                return Ok(());
            }
        }
    }

    fn read_dynamic_tables(&mut self, reader: &mut BitReader) -> Result<(), DeflateError> {
        let hlit = reader.read_bits(5, 257)? as usize;
        let hdist = reader.read_bits(5, 1)? as usize;
        let hclen = reader.read_bits(4, 4)? as usize;

        let mut code_length_lengths = [0u8; 19];
        for &index in &CODE_LENGTH_ORDER[..hclen] {
            code_length_lengths[index] = reader.read_bits(3, 0)? as u8;
        }
        self.code_lengths.rebuild(&code_length_lengths)?;

        let total = hlit + hdist;
        let lengths = &mut self.lengths[..total];
        let mut num = 0;

        while num < total {
            let symbol = self.code_lengths.decode_symbol(reader)?;

            let (value, repeat) = match symbol {
                0..=15 => (symbol as u8, 1),
                16 => {
                    let previous = match num.checked_sub(1) {
                        Some(prev) => lengths[prev],
                        None => return Err(DeflateError::InvalidCodeLengthRepeat),
                    };
                    (previous, reader.read_bits(2, 3)? as usize)
                },
                17 => (0, reader.read_bits(3, 3)? as usize),
                18 => (0, reader.read_bits(7, 11)? as usize),
                _ => return Err(DeflateError::InvalidSymbol(symbol)),
            };

            let run = lengths.get_mut(num..num + repeat).ok_or(DeflateError::TooManyCodeLengths)?;
            run.fill(value);
            num += repeat;
        }

        self.lit_len.rebuild(&self.lengths[..hlit])?;
        self.dist.rebuild(&self.lengths[hlit..total])?;

        trace!(hlit, hdist, hclen, "dynamic huffman tables");

        Ok(())
    }
}

/// Appends one byte, doubling the buffer when it is full.
#[inline(always)]
fn put(output: &mut Vec<u8>, byte: u8) -> Result<(), DecodeError> {
    if output.len() == output.capacity() {
        output.try_reserve(output.capacity().max(64))?;
    }
    output.push(byte);
    Ok(())
}

fn inflate_stored(reader: &mut BitReader, output: &mut Vec<u8>) -> Result<(), DecodeError> {
    reader.align_to_byte();

    let len = reader.read_aligned_u16_le()?;
    let nlen = reader.read_aligned_u16_le()?;
    if len != !nlen {
        return Err(DeflateError::StoredLengthMismatch { len, nlen }.into());
    }

    let bytes = reader.read_aligned_bytes(usize::from(len))?;
    output.try_reserve(bytes.len())?;
    output.extend_from_slice(bytes);

    Ok(())
}

/// Decodes literal/length and distance symbols until end-of-block.
fn inflate_codes(
    reader: &mut BitReader,
    lit_len: &HuffmanTable,
    dist: &HuffmanTable,
    output: &mut Vec<u8>,
) -> Result<(), DecodeError> {
    loop {
        let symbol = lit_len.decode_symbol(reader)?;

        if symbol < END_OF_BLOCK {
            put(output, symbol as u8)?;
            continue;
        }

        if symbol == END_OF_BLOCK {
            return Ok(());
        }

        let index = usize::from(symbol - 257);
        let (base, extra) = match (LENGTH_BASE.get(index), LENGTH_EXTRA.get(index)) {
            (Some(&base), Some(&extra)) => (base, extra),
            _ => return Err(DeflateError::InvalidSymbol(symbol).into()),
        };
        let length = reader.read_bits(u32::from(extra), u32::from(base))? as usize;

        let dist_symbol = dist.decode_symbol(reader)?;
        let index = usize::from(dist_symbol);
        let (base, extra) = match (DIST_BASE.get(index), DIST_EXTRA.get(index)) {
            (Some(&base), Some(&extra)) => (base, extra),
            _ => return Err(DeflateError::InvalidSymbol(dist_symbol).into()),
        };
        let distance = reader.read_bits(u32::from(extra), u32::from(base))? as usize;

        let available = output.len();
        if distance > available {
            return Err(DeflateError::DistanceTooFar { distance, available }.into());
        }

        // Source and destination may overlap when distance < length, so this
        // has to go one byte at a time to pick up bytes it just wrote.
        output.try_reserve(length)?;
        let start = available - distance;
        for i in start..start + length {
            let byte = output[i];
            output.push(byte);
        }
    }
}

/// One-shot inflate of a raw DEFLATE stream into a new `Vec`.
pub fn decompress_to_vec(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = DeflateDecoder::new();
    decoder.decompress(data, 0)?;
    Ok(decoder.output)
}
