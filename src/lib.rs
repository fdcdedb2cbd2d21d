//! A PNG decoder built on its own DEFLATE implementation.
//!
//! Supports 8-bit RGB and RGBA, non-interlaced images, and always produces
//! RGBA8 pixels.
//!
//! ```no_run
//! let bytes = std::fs::read("image.png").unwrap();
//! let bitmap = png_inflate::decode(&bytes).unwrap();
//! println!("{}x{}", bitmap.width(), bitmap.height());
//! ```

pub mod bit_reader;
pub mod bitmap;
pub mod error;
pub mod huffman;
pub mod inflate;
pub mod loader;
pub mod options;
pub mod png;
pub mod zlib;

pub use bitmap::{Bitmap, Color};
pub use error::{BitmapError, DecodeError, DeflateError, FormatError, LoadError, ZlibHeaderError};
pub use inflate::DeflateDecoder;
pub use loader::{FormatDecoder, ImageLoader};
pub use options::DecodeOptions;
pub use png::{header::PngHeader, PngDecoder};

/// Decodes a PNG with default options. Keep a [`PngDecoder`] around instead
/// when decoding many images to reuse its buffers.
pub fn decode(bytes: &[u8]) -> Result<Bitmap, DecodeError> {
    PngDecoder::new().decode(bytes)
}
