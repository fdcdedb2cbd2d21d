use crate::error::DeflateError;

/// Reads a DEFLATE stream one bit at a time, least significant bit first.
///
/// Bit 0 of byte `N` is handed out before bit 1 of byte `N`, and all eight
/// bits of byte `N` before any bit of byte `N + 1`. Reading is forward only.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    tag: u8,
    bit_count: u32,
}

impl<'a> BitReader<'a> {
    /// Starts reading `data` at byte index `start`.
    pub fn new(data: &'a [u8], start: usize) -> Self {
        Self { data, pos: start, tag: 0, bit_count: 0 }
    }

    /// Index of the next byte that has not been pulled into the bit buffer.
    pub fn byte_position(&self) -> usize {
        self.pos
    }

    /// Total length of the underlying buffer, including bytes before `start`.
    pub fn input_len(&self) -> usize {
        self.data.len()
    }

    pub fn next_bit(&mut self) -> Result<u32, DeflateError> {
        if self.bit_count == 0 {
            self.tag = *self.data.get(self.pos).ok_or(DeflateError::UnexpectedEndOfInput)?;
            self.pos += 1;
            self.bit_count = 8;
        }

        let bit = u32::from(self.tag & 1);
        self.tag >>= 1;
        self.bit_count -= 1;

        Ok(bit)
    }

    /// Reads `count` bits and returns `base` plus their value, where the
    /// `i`th bit read is worth `1 << i`. A `count` of zero returns `base`
    /// without touching the stream.
    pub fn read_bits(&mut self, count: u32, base: u32) -> Result<u32, DeflateError> {
        debug_assert!(count <= 16);

        let mut value = 0;
        for i in 0..count {
            value |= self.next_bit()? << i;
        }

        Ok(base + value)
    }

    /// Drops whatever is left of the current byte.
    pub fn align_to_byte(&mut self) {
        self.bit_count = 0;
    }

    /// Takes `len` whole bytes. Must be byte aligned.
    pub fn read_aligned_bytes(&mut self, len: usize) -> Result<&'a [u8], DeflateError> {
        debug_assert_eq!(self.bit_count, 0);

        let end = self.pos.checked_add(len).ok_or(DeflateError::UnexpectedEndOfInput)?;
        let bytes = self.data.get(self.pos..end).ok_or(DeflateError::UnexpectedEndOfInput)?;
        self.pos = end;

        Ok(bytes)
    }

    pub fn read_aligned_u16_le(&mut self) -> Result<u16, DeflateError> {
        let bytes = self.read_aligned_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_come_out_lsb_first() {
        let mut reader = BitReader::new(&[0b1010_0110, 0b0000_0001], 0);
        let bits: Vec<u32> = (0..9).map(|_| reader.next_bit().unwrap()).collect();
        assert_eq!(bits, [0, 1, 1, 0, 0, 1, 0, 1, 1]);
    }

    #[test]
    fn read_bits_accumulates_across_bytes() {
        let mut reader = BitReader::new(&[0xff, 0x0f, 0x00], 0);
        assert_eq!(reader.read_bits(4, 0).unwrap(), 0xf);
        // The next 8 bits straddle the first and second byte.
        assert_eq!(reader.read_bits(8, 0).unwrap(), 0xff);
        assert_eq!(reader.read_bits(4, 100).unwrap(), 100);
    }

    #[test]
    fn read_bits_adds_base() {
        let mut reader = BitReader::new(&[0b0000_0011], 0);
        assert_eq!(reader.read_bits(2, 3).unwrap(), 6);
    }

    #[test]
    fn zero_bits_consumes_nothing() {
        let mut reader = BitReader::new(&[], 0);
        assert_eq!(reader.read_bits(0, 258).unwrap(), 258);
        assert_eq!(reader.next_bit(), Err(DeflateError::UnexpectedEndOfInput));
    }

    #[test]
    fn starts_at_given_index() {
        let mut reader = BitReader::new(&[0x78, 0x9c, 0x01], 2);
        assert_eq!(reader.read_bits(8, 0).unwrap(), 1);
        assert_eq!(reader.byte_position(), 3);
    }

    #[test]
    fn aligned_reads() {
        let mut reader = BitReader::new(&[0b101, 0x34, 0x12, 0xaa, 0xbb], 0);
        assert_eq!(reader.read_bits(3, 0).unwrap(), 0b101);
        reader.align_to_byte();
        assert_eq!(reader.read_aligned_u16_le().unwrap(), 0x1234);
        assert_eq!(reader.read_aligned_bytes(2).unwrap(), &[0xaa, 0xbb]);
        assert_eq!(reader.read_aligned_bytes(1), Err(DeflateError::UnexpectedEndOfInput));
    }
}
