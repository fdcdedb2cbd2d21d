//! The RFC 1950 wrapper around a DEFLATE stream.

use crate::{
    bit_reader::BitReader,
    error::{DecodeError, DeflateError, ZlibHeaderError},
    inflate::DeflateDecoder,
};
use tracing::trace;

/// Length of the `CMF`/`FLG` pair in front of the DEFLATE data.
pub const HEADER_LEN: usize = 2;

const METHOD_DEFLATE: u8 = 8;
const MAX_WINDOW_BITS_MINUS_8: u8 = 7;
const FLAG_PRESET_DICTIONARY: u8 = 0x20;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ZlibHeader {
    pub cmf: u8,
    pub flg: u8,
}

impl ZlibHeader {
    /// Reads and validates the two header bytes at the front of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, ZlibHeaderError> {
        let (cmf, flg) = match bytes {
            [cmf, flg, ..] => (*cmf, *flg),
            _ => return Err(ZlibHeaderError::MissingBytes),
        };

        if (256 * u32::from(cmf) + u32::from(flg)) % 31 != 0 {
            return Err(ZlibHeaderError::BadChecksum { cmf, flg });
        }

        let method = cmf & 0x0f;
        if method != METHOD_DEFLATE {
            return Err(ZlibHeaderError::UnsupportedMethod(method));
        }

        let window = cmf >> 4;
        if window > MAX_WINDOW_BITS_MINUS_8 {
            return Err(ZlibHeaderError::WindowTooLarge(window));
        }

        if flg & FLAG_PRESET_DICTIONARY != 0 {
            return Err(ZlibHeaderError::PresetDictionary);
        }

        Ok(Self { cmf, flg })
    }

    /// LZ77 window size in bytes.
    pub fn window_size(&self) -> usize {
        1 << (usize::from(self.cmf >> 4) + 8)
    }
}

pub fn adler32(data: &[u8]) -> u32 {
    const MOD_ADLER: u32 = 65521;
    // Largest run of bytes that cannot overflow the sums before reducing.
    const NMAX: usize = 5552;

    let (mut a, mut b) = (1u32, 0u32);
    for chunk in data.chunks(NMAX) {
        for &byte in chunk {
            a += u32::from(byte);
            b += a;
        }
        a %= MOD_ADLER;
        b %= MOD_ADLER;
    }

    (b << 16) | a
}

/// Validates the zlib header of `data` and inflates what follows it with
/// `decoder`. When `verify_adler32` is set, the big-endian Adler-32 trailer
/// must be present and match the output.
pub fn decompress<'d>(
    decoder: &'d mut DeflateDecoder,
    data: &[u8],
    verify_adler32: bool,
) -> Result<&'d [u8], DecodeError> {
    let header = ZlibHeader::parse(data)?;
    trace!(window_size = header.window_size(), "zlib header");

    let mut reader = BitReader::new(data, HEADER_LEN);
    decoder.inflate_stream(&mut reader)?;

    if verify_adler32 {
        reader.align_to_byte();
        let trailer = reader.read_aligned_bytes(4)?;
        let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let actual = adler32(decoder.output());
        if expected != actual {
            return Err(DeflateError::Adler32Mismatch { expected, actual }.into());
        }
    }

    Ok(decoder.output())
}

/// One-shot inflate of a zlib stream into a new `Vec`, checking the trailer.
pub fn decompress_to_vec_zlib(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = DeflateDecoder::new();
    decompress(&mut decoder, data, true).map(<[u8]>::to_vec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_default_header() {
        let header = ZlibHeader::parse(&[0x78, 0x9c]).unwrap();
        assert_eq!(header.window_size(), 32 * 1024);

        for flg in [0x01, 0x5e, 0xda] {
            assert!(ZlibHeader::parse(&[0x78, flg]).is_ok());
        }
    }

    #[test]
    fn rejects_bad_checksum() {
        assert_eq!(
            ZlibHeader::parse(&[0x78, 0x9d]),
            Err(ZlibHeaderError::BadChecksum { cmf: 0x78, flg: 0x9d })
        );
    }

    #[test]
    fn rejects_other_methods() {
        // CMF 0x77 is method 7; 0x77 * 256 + 0x09 is a multiple of 31.
        assert_eq!(ZlibHeader::parse(&[0x77, 0x09]), Err(ZlibHeaderError::UnsupportedMethod(7)));
    }

    #[test]
    fn rejects_large_window() {
        // CMF 0x88 is a 64K window; 0x88 * 256 + 0x1c is a multiple of 31.
        assert_eq!(ZlibHeader::parse(&[0x88, 0x1c]), Err(ZlibHeaderError::WindowTooLarge(8)));
    }

    #[test]
    fn rejects_preset_dictionary() {
        // 0x78 * 256 + 0xbb is a multiple of 31 and has FDICT set.
        assert_eq!(ZlibHeader::parse(&[0x78, 0xbb]), Err(ZlibHeaderError::PresetDictionary));
    }

    #[test]
    fn rejects_short_input() {
        assert_eq!(ZlibHeader::parse(&[0x78]), Err(ZlibHeaderError::MissingBytes));
    }

    #[test]
    fn adler32_known_values() {
        assert_eq!(adler32(&[]), 1);
        assert_eq!(adler32(b"Wikipedia"), 0x11e6_0398);

        // Long enough to need the intermediate reductions.
        let data = vec![0xffu8; 100_000];
        let (mut a, mut b) = (1u64, 0u64);
        for &byte in &data {
            a = (a + u64::from(byte)) % 65521;
            b = (b + a) % 65521;
        }
        assert_eq!(adler32(&data), ((b << 16) | a) as u32);
    }

    fn stored_zlib(data: &[u8]) -> Vec<u8> {
        let mut out = vec![0x78, 0x01, 0x01];
        out.extend_from_slice(&(data.len() as u16).to_le_bytes());
        out.extend_from_slice(&(!(data.len() as u16)).to_le_bytes());
        out.extend_from_slice(data);
        out.extend_from_slice(&adler32(data).to_be_bytes());
        out
    }

    #[test]
    fn decompresses_with_trailer() {
        assert_eq!(decompress_to_vec_zlib(&stored_zlib(b"hello")).unwrap(), b"hello");
    }

    #[test]
    fn adler_mismatch_is_reported_only_when_asked() {
        let mut stream = stored_zlib(b"hello");
        let last = stream.len() - 1;
        stream[last] ^= 0xff;

        assert!(matches!(
            decompress_to_vec_zlib(&stream),
            Err(DecodeError::Deflate(DeflateError::Adler32Mismatch { .. }))
        ));

        let mut decoder = DeflateDecoder::new();
        assert_eq!(decompress(&mut decoder, &stream, false).unwrap(), b"hello");

        stream.truncate(stream.len() - 4);
        assert_eq!(decompress(&mut decoder, &stream, false).unwrap(), b"hello");
        assert_eq!(
            decompress(&mut decoder, &stream, true),
            Err(DeflateError::UnexpectedEndOfInput.into())
        );
    }

    #[test]
    fn header_errors_come_first() {
        let mut stream = stored_zlib(b"hello");
        stream[1] = 0x9d;
        assert_eq!(
            decompress_to_vec_zlib(&stream),
            Err(ZlibHeaderError::BadChecksum { cmf: 0x78, flg: 0x9d }.into())
        );
    }
}
