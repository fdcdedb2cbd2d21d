use crate::error::{DecodeError, FormatError};
use crc32fast::Hasher;
use tracing::trace;

pub const PNG_MAGIC_BYTES: &[u8] = &[137, 80, 78, 71, 13, 10, 26, 10];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChunkType {
    ImageHeader,
    ImageData,
    ImageEnd,
    Unknown([u8; 4]),
}

impl ChunkType {
    fn from_bytes(bytes: &[u8; 4]) -> Self {
        match bytes {
            b"IHDR" => ChunkType::ImageHeader,
            b"IDAT" => ChunkType::ImageData,
            b"IEND" => ChunkType::ImageEnd,
            unknown_chunk_type => ChunkType::Unknown(*unknown_chunk_type),
        }
    }
}

#[derive(Debug)]
pub struct Chunk<'a> {
    pub chunk_type: ChunkType,
    pub data: &'a [u8],
    pub crc: u32,
}

impl<'a> Chunk<'a> {
    pub fn byte_size(&self) -> usize {
        // length bytes + chunk type bytes + data bytes + crc bytes
        4 + 4 + self.data.len() + 4
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

/// Reads the chunk at the front of `bytes`, checking its CRC when asked.
pub fn read_chunk(bytes: &[u8], verify_crc: bool) -> Result<Chunk<'_>, FormatError> {
    if bytes.len() < 8 {
        return Err(FormatError::TruncatedChunk);
    }

    let length = read_u32(bytes, 0) as usize;
    let bytes = &bytes[4..];

    let crc_offset = length.checked_add(4).ok_or(FormatError::TruncatedChunk)?;
    let chunk_end = crc_offset.checked_add(4).ok_or(FormatError::TruncatedChunk)?;
    if bytes.len() < chunk_end {
        return Err(FormatError::TruncatedChunk);
    }

    let type_bytes = [bytes[0], bytes[1], bytes[2], bytes[3]];
    let chunk_type = ChunkType::from_bytes(&type_bytes);

    let crc = read_u32(bytes, crc_offset);

    // The CRC covers the chunk type and data, but not the length.
    let data_for_crc = &bytes[..crc_offset];

    if verify_crc {
        let mut hasher = Hasher::new();
        hasher.update(data_for_crc);

        if crc != hasher.finalize() {
            return Err(FormatError::IncorrectChunkCrc(type_bytes));
        }
    }

    Ok(Chunk { chunk_type, data: &data_for_crc[4..], crc })
}

/// Walks the chunks that follow IHDR.
pub struct Chunks<'a> {
    bytes: &'a [u8],
    verify_crc: bool,
    done: bool,
}

impl<'a> Chunks<'a> {
    pub fn new(bytes: &'a [u8], verify_crc: bool) -> Self {
        Self { bytes, verify_crc, done: false }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<Chunk<'a>, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.bytes.is_empty() {
            self.done = true;
            return Some(Err(FormatError::MissingEndChunk));
        }

        match read_chunk(self.bytes, self.verify_crc) {
            Ok(chunk) => {
                self.bytes = &self.bytes[chunk.byte_size()..];
                if chunk.chunk_type == ChunkType::ImageEnd {
                    self.done = true;
                }
                Some(Ok(chunk))
            },
            Err(e) => {
                self.done = true;
                Some(Err(e))
            },
        }
    }
}

/// Copies the payloads of every IDAT chunk up to IEND into `compressed`.
///
/// The first pass only sums the IDAT lengths so `compressed` is grown at most
/// once; the second copies. `compressed` is cleared but keeps its capacity.
pub fn collect_image_data(
    bytes: &[u8],
    verify_crc: bool,
    compressed: &mut Vec<u8>,
) -> Result<(), DecodeError> {
    let mut total = 0usize;
    let mut chunk_count = 0usize;
    for chunk in Chunks::new(bytes, verify_crc) {
        let chunk = chunk?;
        trace!(chunk_type = ?chunk.chunk_type, len = chunk.data.len(), "chunk");

        if chunk.chunk_type == ChunkType::ImageData {
            total += chunk.data.len();
            chunk_count += 1;
        }
    }

    if total == 0 {
        return Err(FormatError::MissingImageData.into());
    }

    compressed.clear();
    compressed.try_reserve(total)?;

    // Already validated above, so no need to check CRCs a second time.
    for chunk in Chunks::new(bytes, false) {
        let chunk = chunk?;
        if chunk.chunk_type == ChunkType::ImageData {
            compressed.extend_from_slice(chunk.data);
        }
    }

    trace!(idat_chunks = chunk_count, compressed_len = total, "collected image data");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(chunk_type);
        out.extend_from_slice(data);
        let mut hasher = Hasher::new();
        hasher.update(chunk_type);
        hasher.update(data);
        out.extend_from_slice(&hasher.finalize().to_be_bytes());
        out
    }

    #[test]
    fn reads_a_chunk() {
        let bytes = chunk(b"IDAT", &[1, 2, 3]);
        let parsed = read_chunk(&bytes, true).unwrap();
        assert_eq!(parsed.chunk_type, ChunkType::ImageData);
        assert_eq!(parsed.data, &[1, 2, 3]);
        assert_eq!(parsed.byte_size(), bytes.len());
    }

    #[test]
    fn crc_is_checked_only_when_asked() {
        let mut bytes = chunk(b"IDAT", &[1, 2, 3]);
        let last = bytes.len() - 1;
        bytes[last] ^= 1;

        assert_eq!(read_chunk(&bytes, true).unwrap_err(), FormatError::IncorrectChunkCrc(*b"IDAT"));
        assert!(read_chunk(&bytes, false).is_ok());
    }

    #[test]
    fn truncated_chunks() {
        let bytes = chunk(b"IDAT", &[1, 2, 3]);
        for len in 0..bytes.len() {
            assert_eq!(read_chunk(&bytes[..len], false).unwrap_err(), FormatError::TruncatedChunk);
        }

        let mut huge = bytes.clone();
        huge[..4].copy_from_slice(&u32::MAX.to_be_bytes());
        assert_eq!(read_chunk(&huge, false).unwrap_err(), FormatError::TruncatedChunk);
    }

    #[test]
    fn concatenates_idat_payloads() {
        let bytes = [
            chunk(b"IDAT", &[1, 2]),
            chunk(b"tEXt", b"Comment\0hi"),
            chunk(b"IDAT", &[3]),
            chunk(b"IDAT", &[4, 5, 6]),
            chunk(b"IEND", &[]),
            // Anything after IEND is never looked at.
            chunk(b"IDAT", &[7]),
        ]
        .concat();

        let mut compressed = vec![9; 32];
        collect_image_data(&bytes, true, &mut compressed).unwrap();
        assert_eq!(compressed, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn missing_idat() {
        let bytes = [chunk(b"tEXt", b"a\0b"), chunk(b"IEND", &[])].concat();
        let mut compressed = Vec::new();
        assert_eq!(
            collect_image_data(&bytes, true, &mut compressed),
            Err(FormatError::MissingImageData.into())
        );
    }

    #[test]
    fn missing_iend() {
        let bytes = chunk(b"IDAT", &[1, 2]);
        let mut compressed = Vec::new();
        assert_eq!(
            collect_image_data(&bytes, true, &mut compressed),
            Err(FormatError::MissingEndChunk.into())
        );
    }
}
