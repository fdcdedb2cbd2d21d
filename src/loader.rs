//! Picks a decoder by file extension.

use crate::{
    bitmap::{Bitmap, Color},
    error::{DecodeError, LoadError},
    png::PngDecoder,
};
use std::{collections::HashMap, path::Path};
use tracing::debug;

/// An image format that can be decoded into RGBA pixels.
pub trait FormatDecoder {
    /// Lowercase file extensions this decoder handles, without the dot.
    fn extensions(&self) -> &[&str];

    /// Decodes `bytes` into `pixels`, reusing its allocation, and returns
    /// the width and height. On success `pixels` holds `width * height`
    /// entries.
    fn decode_into(
        &mut self,
        bytes: &[u8],
        pixels: &mut Vec<Color>,
    ) -> Result<(u32, u32), DecodeError>;

    fn decode(&mut self, bytes: &[u8]) -> Result<Bitmap, DecodeError> {
        let mut bitmap = Bitmap::default();
        self.decode_bitmap(bytes, &mut bitmap)?;
        Ok(bitmap)
    }

    /// Decodes into an existing bitmap, reusing its pixel buffer. If decoding
    /// fails the bitmap keeps its old size, though some of its pixels may
    /// have been overwritten.
    fn decode_bitmap(&mut self, bytes: &[u8], bitmap: &mut Bitmap) -> Result<(), DecodeError> {
        let mut pixels = std::mem::take(&mut bitmap.pixels);

        match self.decode_into(bytes, &mut pixels) {
            Ok((width, height)) => {
                *bitmap = Bitmap { width, height, pixels };
                Ok(())
            },
            Err(e) => {
                pixels.resize(bitmap.width as usize * bitmap.height as usize, Color::TRANSPARENT);
                bitmap.pixels = pixels;
                Err(e)
            },
        }
    }
}

/// Maps file extensions to decoders.
pub struct ImageLoader {
    decoders: Vec<Box<dyn FormatDecoder>>,
    by_extension: HashMap<String, usize>,
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut extensions: Vec<&str> = self.by_extension.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        f.debug_struct("ImageLoader").field("extensions", &extensions).finish()
    }
}

fn normalize(extension: &str) -> String {
    extension.strip_prefix('.').unwrap_or(extension).to_ascii_lowercase()
}

impl ImageLoader {
    /// A loader that knows about PNG.
    pub fn new() -> Self {
        let mut loader = Self::empty();
        loader.decoders.push(Box::new(PngDecoder::new()));
        loader.by_extension.insert("png".to_string(), 0);
        loader
    }

    /// A loader with no decoders registered.
    pub fn empty() -> Self {
        Self { decoders: Vec::new(), by_extension: HashMap::new() }
    }

    /// Registers `decoder` for all of its extensions. Fails without
    /// registering anything if one of them is already taken.
    pub fn add_decoder(&mut self, decoder: Box<dyn FormatDecoder>) -> Result<(), LoadError> {
        let extensions: Vec<String> =
            decoder.extensions().iter().map(|ext| normalize(ext)).collect();

        if let Some(taken) = extensions.iter().find(|ext| self.by_extension.contains_key(*ext)) {
            return Err(LoadError::DuplicateExtension(taken.clone()));
        }

        let index = self.decoders.len();
        self.decoders.push(decoder);
        for extension in extensions {
            self.by_extension.insert(extension, index);
        }

        Ok(())
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.by_extension.contains_key(&normalize(extension))
    }

    /// The decoder for `extension`, which may carry a leading dot and is
    /// matched ignoring ASCII case.
    pub fn decoder_for(&mut self, extension: &str) -> Result<&mut dyn FormatDecoder, LoadError> {
        let index = *self
            .by_extension
            .get(&normalize(extension))
            .ok_or_else(|| LoadError::NoDecoder(extension.to_string()))?;

        Ok(self.decoders[index].as_mut())
    }

    pub fn decode(&mut self, extension: &str, bytes: &[u8]) -> Result<Bitmap, LoadError> {
        Ok(self.decoder_for(extension)?.decode(bytes)?)
    }

    pub fn decode_into_bitmap(
        &mut self,
        extension: &str,
        bytes: &[u8],
        bitmap: &mut Bitmap,
    ) -> Result<(), LoadError> {
        Ok(self.decoder_for(extension)?.decode_bitmap(bytes, bitmap)?)
    }

    /// Reads the file at `path` and decodes it with the decoder registered
    /// for its extension.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Bitmap, LoadError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| LoadError::NoDecoder(path.display().to_string()))?;

        // Look the decoder up first so unknown files are never read.
        self.decoder_for(extension)?;

        let bytes = std::fs::read(path)?;
        debug!(path = %path.display(), len = bytes.len(), "loading image");

        self.decode(extension, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;

    /// Treats every input as a 1x1 image whose single pixel is the first
    /// four bytes.
    struct RawDecoder;

    impl FormatDecoder for RawDecoder {
        fn extensions(&self) -> &[&str] {
            &["raw", "RGBA"]
        }

        fn decode_into(
            &mut self,
            bytes: &[u8],
            pixels: &mut Vec<Color>,
        ) -> Result<(u32, u32), DecodeError> {
            let pixel = match bytes {
                [r, g, b, a, ..] => Color::new(*r, *g, *b, *a),
                _ => return Err(FormatError::TruncatedChunk.into()),
            };
            pixels.clear();
            pixels.push(pixel);
            Ok((1, 1))
        }
    }

    #[test]
    fn png_is_registered() {
        let loader = ImageLoader::new();
        assert!(loader.supports("png"));
        assert!(loader.supports(".PNG"));
        assert!(!loader.supports("jpg"));
    }

    #[test]
    fn custom_decoders_dispatch_by_extension() {
        let mut loader = ImageLoader::new();
        loader.add_decoder(Box::new(RawDecoder)).unwrap();

        let bitmap = loader.decode(".Raw", &[1, 2, 3, 4]).unwrap();
        assert_eq!(bitmap.pixels(), [Color::new(1, 2, 3, 4)]);
        assert!(loader.supports("rgba"));

        let mut bitmap = Bitmap::filled(4, 4, Color::WHITE);
        loader.decode_into_bitmap("rgba", &[5, 6, 7, 8], &mut bitmap).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (1, 1));
        assert_eq!(bitmap.get_pixel(0, 0), Some(Color::new(5, 6, 7, 8)));
    }

    #[test]
    fn duplicate_extensions_are_rejected() {
        let mut loader = ImageLoader::empty();
        loader.add_decoder(Box::new(RawDecoder)).unwrap();

        match loader.add_decoder(Box::new(RawDecoder)) {
            Err(LoadError::DuplicateExtension(ext)) => assert_eq!(ext, "raw"),
            other => panic!("expected a duplicate extension error, got {:?}", other),
        }

        match ImageLoader::new().add_decoder(Box::new(PngDecoder::new())) {
            Err(LoadError::DuplicateExtension(ext)) => assert_eq!(ext, "png"),
            other => panic!("expected a duplicate extension error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_extension() {
        let mut loader = ImageLoader::new();
        assert!(matches!(
            loader.decode("gif", &[]),
            Err(LoadError::NoDecoder(ext)) if ext == "gif"
        ));
        assert!(matches!(loader.load_file("no_extension"), Err(LoadError::NoDecoder(_))));
        assert!(matches!(loader.load_file("picture.bmp"), Err(LoadError::NoDecoder(_))));
    }

    #[test]
    fn failed_decode_keeps_bitmap_size() {
        let mut loader = ImageLoader::new();
        let mut bitmap = Bitmap::filled(2, 2, Color::WHITE);

        let result = loader.decode_into_bitmap("png", b"not a png", &mut bitmap);
        assert!(matches!(
            result,
            Err(LoadError::Decode(DecodeError::Format(FormatError::InvalidSignature)))
        ));
        assert_eq!(bitmap, Bitmap::filled(2, 2, Color::WHITE));
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut loader = ImageLoader::new();
        assert!(matches!(
            loader.load_file("this/file/does/not/exist.png"),
            Err(LoadError::Io(_))
        ));
    }
}
