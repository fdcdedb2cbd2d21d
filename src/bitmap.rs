//! A plain RGBA8 pixel container.

use crate::error::BitmapError;
use bytemuck::{Pod, Zeroable};

/// One RGBA8 pixel, laid out in memory as `[r, g, b, a]`.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// A `width` x `height` image stored row-major, top row first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) pixels: Vec<Color>,
}

impl Bitmap {
    /// A fully transparent bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Color::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let len = width as usize * height as usize;
        Self { width, height, pixels: vec![color; len] }
    }

    /// Wraps an existing pixel buffer. Returns the buffer back if its length
    /// is not `width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Result<Self, Vec<Color>> {
        let expected = (width as usize).checked_mul(height as usize);
        if expected != Some(pixels.len()) {
            return Err(pixels);
        }

        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }

        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Returns `false` without touching anything if `(x, y)` is out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.pixels[i] = color;
                true
            },
            None => false,
        }
    }

    /// Sets every pixel to `color`.
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Fails unless the `w` x `h` rectangle at `(x, y)` lies inside the bitmap.
    fn check_rect(&self, x: u32, y: u32, w: u32, h: u32) -> Result<(), BitmapError> {
        let fits = |start: u32, len: u32, limit: u32| {
            matches!(start.checked_add(len), Some(end) if end <= limit)
        };

        if fits(x, w, self.width) && fits(y, h, self.height) {
            Ok(())
        } else {
            Err(BitmapError::RectOutOfBounds { x, y, w, h, width: self.width, height: self.height })
        }
    }

    /// Sets every pixel of the `w` x `h` rectangle at `(x, y)` to `color`.
    pub fn fill_rect(
        &mut self,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        color: Color,
    ) -> Result<(), BitmapError> {
        self.check_rect(x, y, w, h)?;

        if w == 0 || h == 0 {
            return Ok(());
        }

        let stride = self.width as usize;
        for row in self.pixels.chunks_exact_mut(stride).skip(y as usize).take(h as usize) {
            row[x as usize..(x + w) as usize].fill(color);
        }

        Ok(())
    }

    /// Copies all of `source`, which must have the same dimensions.
    pub fn copy_pixels(&mut self, source: &Bitmap) -> Result<(), BitmapError> {
        if (self.width, self.height) != (source.width, source.height) {
            return Err(BitmapError::SizeMismatch {
                width: self.width,
                height: self.height,
                other_width: source.width,
                other_height: source.height,
            });
        }

        self.pixels.copy_from_slice(&source.pixels);
        Ok(())
    }

    /// Copies the `(x, y, w, h)` rectangle of `source` so its top left corner
    /// lands on `dest`. Both rectangles must fit their bitmaps.
    pub fn copy_rect(
        &mut self,
        source: &Bitmap,
        (x, y, w, h): (u32, u32, u32, u32),
        (dest_x, dest_y): (u32, u32),
    ) -> Result<(), BitmapError> {
        source.check_rect(x, y, w, h)?;
        self.check_rect(dest_x, dest_y, w, h)?;

        if w == 0 || h == 0 {
            return Ok(());
        }

        let source_rows = source.pixels.chunks_exact(source.width as usize).skip(y as usize);
        let dest_rows = self.pixels.chunks_exact_mut(self.width as usize).skip(dest_y as usize);

        for (from, to) in source_rows.zip(dest_rows).take(h as usize) {
            let (x, dest_x, w) = (x as usize, dest_x as usize, w as usize);
            to[dest_x..dest_x + w].copy_from_slice(&from[x..x + w]);
        }

        Ok(())
    }

    /// Copies all of `source` so its top left corner lands on `dest`.
    pub fn copy_from(&mut self, source: &Bitmap, dest: (u32, u32)) -> Result<(), BitmapError> {
        self.copy_rect(source, (0, 0, source.width, source.height), dest)
    }

    /// The smallest `(x, y, w, h)` rectangle holding every pixel whose alpha
    /// is above `alpha_threshold`, or `None` if there are no such pixels.
    pub fn pixel_bounds(&self, alpha_threshold: u8) -> Option<(u32, u32, u32, u32)> {
        if self.width == 0 {
            return None;
        }

        let mut bounds: Option<(u32, u32, u32, u32)> = None;

        for (y, row) in self.pixels.chunks_exact(self.width as usize).enumerate() {
            let mut solid = row.iter().enumerate().filter(|(_, pixel)| pixel.a > alpha_threshold);
            let first = match solid.next() {
                Some((x, _)) => x as u32,
                None => continue,
            };
            let last = solid.last().map_or(first, |(x, _)| x as u32);
            let y = y as u32;

            bounds = Some(match bounds {
                None => (first, y, last, y),
                Some((min_x, min_y, max_x, _)) => (min_x.min(first), min_y, max_x.max(last), y),
            });
        }

        bounds.map(|(min_x, min_y, max_x, max_y)| {
            (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
        })
    }

    /// True when every pixel has an alpha of zero.
    pub fn is_transparent(&self) -> bool {
        self.pixels.iter().all(|pixel| pixel.a == 0)
    }

    /// The pixels as tightly packed RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn into_parts(self) -> (u32, u32, Vec<Color>) {
        (self.width, self.height, self.pixels)
    }
}
