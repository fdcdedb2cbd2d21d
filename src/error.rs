use std::collections::TryReserveError;
use thiserror::Error;

/// Problems with the PNG container or its header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid PNG signature")]
    InvalidSignature,

    #[error("the first chunk must be IHDR")]
    HeaderChunkNotFirst,

    #[error("IHDR must hold 13 bytes, found {0}")]
    InvalidHeaderLength(usize),

    #[error("image dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    // The width/height specified in the image contains too many
    // bytes to address with a usize on this platform.
    #[error("image dimensions {width}x{height} are too large")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("bit depth not supported: {0}")]
    UnsupportedBitDepth(u8),

    #[error("color type not supported: {0}")]
    UnsupportedColorType(u8),

    #[error("compression method not supported: {0}")]
    UnsupportedCompressionMethod(u8),

    #[error("filter method not supported: {0}")]
    UnsupportedFilterMethod(u8),

    #[error("interlace method not supported: {0}")]
    UnsupportedInterlaceMethod(u8),

    #[error("chunk is truncated")]
    TruncatedChunk,

    #[error("incorrect CRC for chunk {}", String::from_utf8_lossy(.0))]
    IncorrectChunkCrc([u8; 4]),

    #[error("no IDAT data to decode")]
    MissingImageData,

    #[error("PNG must end with IEND chunk")]
    MissingEndChunk,

    #[error("invalid scanline filter type: {0}")]
    InvalidFilterType(u8),

    #[error("image data too short: expected {expected} bytes, got {actual}")]
    ImageDataTooShort { expected: usize, actual: usize },
}

/// Problems with the two byte zlib wrapper in front of the DEFLATE stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZlibHeaderError {
    #[error("zlib header is missing")]
    MissingBytes,

    #[error("invalid zlib header checksum (CMF {cmf:#04x}, FLG {flg:#04x})")]
    BadChecksum { cmf: u8, flg: u8 },

    #[error("invalid compression method: {0}")]
    UnsupportedMethod(u8),

    #[error("invalid window size: {0}")]
    WindowTooLarge(u8),

    #[error("preset dictionary not allowed")]
    PresetDictionary,
}

/// Problems inside the raw DEFLATE bit stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeflateError {
    #[error("unexpected end of compressed data")]
    UnexpectedEndOfInput,

    #[error("stored block length {len:#06x} does not match its complement {nlen:#06x}")]
    StoredLengthMismatch { len: u16, nlen: u16 },

    #[error("reserved block type")]
    ReservedBlockType,

    #[error("decoded from a Huffman table with no symbols")]
    EmptyHuffmanTable,

    #[error("Huffman code longer than 15 bits")]
    CodeTooLong,

    #[error("code length {0} is longer than 15 bits")]
    InvalidCodeLength(u8),

    #[error("repeat code with no previous code length")]
    InvalidCodeLengthRepeat,

    #[error("code length repeat runs past the end of the table")]
    TooManyCodeLengths,

    #[error("invalid symbol: {0}")]
    InvalidSymbol(u16),

    #[error("back-reference distance {distance} exceeds the {available} bytes decoded so far")]
    DistanceTooFar { distance: usize, available: usize },

    #[error("adler-32 mismatch: stream says {expected:#010x}, data hashes to {actual:#010x}")]
    Adler32Mismatch { expected: u32, actual: u32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid PNG: {0}")]
    Format(#[from] FormatError),

    #[error("invalid zlib header: {0}")]
    ZlibHeader(#[from] ZlibHeaderError),

    #[error("corrupt DEFLATE stream: {0}")]
    Deflate(#[from] DeflateError),

    /// The allocator couldn't give us enough space.
    #[error("out of memory")]
    OutOfMemory,
}

impl From<TryReserveError> for DecodeError {
    #[inline]
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

/// Errors from [`Bitmap`](crate::Bitmap) operations on whole regions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitmapError {
    #[error("bitmap sizes differ: {width}x{height} vs {other_width}x{other_height}")]
    SizeMismatch { width: u32, height: u32, other_width: u32, other_height: u32 },

    #[error("{w}x{h} rectangle at ({x}, {y}) is outside the {width}x{height} bitmap")]
    RectOutOfBounds { x: u32, y: u32, w: u32, h: u32, width: u32, height: u32 },
}

/// Errors from [`ImageLoader`](crate::ImageLoader).
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("there is no decoder for extension: {0:?}")]
    NoDecoder(String),

    #[error("already have a decoder for extension: {0:?}")]
    DuplicateExtension(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
