//! Canonical Huffman decoding without an explicit tree.
//!
//! A table is two flat arrays: `counts[len]`, the number of codes of each bit
//! length, and `symbols`, every defined symbol ordered by code value. Because
//! canonical codes of one length are consecutive, walking the lengths in order
//! and subtracting each `counts[len]` from the running code tells us which
//! slot of `symbols` the bits select.

use crate::{bit_reader::BitReader, error::DeflateError};

/// Longest code DEFLATE permits.
pub const MAX_CODE_LENGTH: usize = 15;

/// Largest alphabet we ever build a table for (fixed literal/length codes).
pub const MAX_SYMBOLS: usize = 288;

#[derive(Clone, PartialEq, Eq)]
pub struct HuffmanTable {
    counts: [u16; MAX_CODE_LENGTH + 1],
    symbols: [u16; MAX_SYMBOLS],
    defined: usize,
}

impl Default for HuffmanTable {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for HuffmanTable {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("HuffmanTable")
            .field("counts", &self.counts)
            .field("symbols", &&self.symbols[..self.defined])
            .finish()
    }
}

impl HuffmanTable {
    /// An empty table. Decoding from it is an error.
    pub const fn new() -> Self {
        Self { counts: [0; MAX_CODE_LENGTH + 1], symbols: [0; MAX_SYMBOLS], defined: 0 }
    }

    pub fn from_lengths(lengths: &[u8]) -> Result<Self, DeflateError> {
        let mut table = Self::new();
        table.rebuild(lengths)?;
        Ok(table)
    }

    /// Rebuilds the table in place from per-symbol code lengths, where a
    /// length of 0 means the symbol is unused.
    pub fn rebuild(&mut self, lengths: &[u8]) -> Result<(), DeflateError> {
        if lengths.len() > MAX_SYMBOLS {
            return Err(DeflateError::InvalidSymbol(lengths.len() as u16));
        }

        self.counts = [0; MAX_CODE_LENGTH + 1];
        for &len in lengths {
            if usize::from(len) > MAX_CODE_LENGTH {
                return Err(DeflateError::InvalidCodeLength(len));
            }
            self.counts[usize::from(len)] += 1;
        }
        self.counts[0] = 0;

        let mut offsets = [0u16; MAX_CODE_LENGTH + 1];
        let mut sum = 0;
        for (offset, count) in offsets.iter_mut().zip(self.counts.iter()) {
            *offset = sum;
            sum += count;
        }
        self.defined = usize::from(sum);

        for (symbol, &len) in lengths.iter().enumerate() {
            if len > 0 {
                let slot = &mut offsets[usize::from(len)];
                self.symbols[usize::from(*slot)] = symbol as u16;
                *slot += 1;
            }
        }

        Ok(())
    }

    /// The fixed literal/length table of RFC 1951 section 3.2.6.
    pub fn fixed_literal_length() -> Self {
        let mut table = Self::new();

        table.counts[7] = 24;
        table.counts[8] = 152;
        table.counts[9] = 112;

        let order = (256..280).chain(0..144).chain(280..288).chain(144..256);
        for (slot, symbol) in table.symbols.iter_mut().zip(order) {
            *slot = symbol;
        }
        table.defined = MAX_SYMBOLS;

        table
    }

    /// The fixed distance table: 32 codes of 5 bits each.
    pub fn fixed_distance() -> Self {
        let mut table = Self::new();

        table.counts[5] = 32;
        for (slot, symbol) in table.symbols.iter_mut().zip(0..32) {
            *slot = symbol;
        }
        table.defined = 32;

        table
    }

    pub fn counts(&self) -> &[u16; MAX_CODE_LENGTH + 1] {
        &self.counts
    }

    /// Defined symbols in canonical code order.
    pub fn symbols(&self) -> &[u16] {
        &self.symbols[..self.defined]
    }

    pub fn is_empty(&self) -> bool {
        self.defined == 0
    }

    /// Pulls bits from `reader` until they form a complete code.
    pub fn decode_symbol(&self, reader: &mut BitReader) -> Result<u16, DeflateError> {
        if self.is_empty() {
            return Err(DeflateError::EmptyHuffmanTable);
        }

        // `code` is the bit string read so far, re-based so that it goes
        // negative exactly when it lands among the codes of `len` bits.
        let mut code: i32 = 0;
        let mut sum: i32 = 0;

        for len in 1..=MAX_CODE_LENGTH {
            code = 2 * code + reader.next_bit()? as i32;
            let count = i32::from(self.counts[len]);
            sum += count;
            code -= count;

            if code < 0 {
                let index = (sum + code) as usize;
                return self.symbols().get(index).copied().ok_or(DeflateError::CodeTooLong);
            }
        }

        Err(DeflateError::CodeTooLong)
    }
}
