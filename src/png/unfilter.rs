//! Reverses the per-scanline PNG filters, writing RGBA8 pixels.

use super::header::PngHeader;
use crate::error::FormatError;
use num_enum::TryFromPrimitive;

/// Output is always RGBA8.
const OUTPUT_BPP: usize = 4;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

/// A filter as applied to one particular row.
///
/// The first scanline has no row above it, so filters that look up are
/// replaced by variants that treat the row above as zeros.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RowFilter {
    None,
    Sub,
    Up,
    Average,
    Paeth,
    AverageFirst,
    PaethFirst,
}

impl RowFilter {
    fn new(filter_type: FilterType, first_row: bool) -> Self {
        match (filter_type, first_row) {
            (FilterType::None, _) => RowFilter::None,
            (FilterType::Sub, _) => RowFilter::Sub,
            (FilterType::Up, false) => RowFilter::Up,
            (FilterType::Up, true) => RowFilter::None,
            (FilterType::Average, false) => RowFilter::Average,
            (FilterType::Average, true) => RowFilter::AverageFirst,
            (FilterType::Paeth, false) => RowFilter::Paeth,
            (FilterType::Paeth, true) => RowFilter::PaethFirst,
        }
    }
}

#[inline(always)]
pub(crate) fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    // a = left pixel
    // b = above pixel
    // c = upper left
    let (a16, b16, c16) = (i16::from(a), i16::from(b), i16::from(c));
    let p = a16 + b16 - c16;
    let pa = (p - a16).abs();
    let pb = (p - b16).abs();
    let pc = (p - c16).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Rebuilds one row in place. `raw` holds the filtered samples (`bpp` per
/// pixel), `current` and `above` are RGBA rows where only the first `bpp`
/// bytes of each pixel are touched.
///
/// `predict(left, above, upper_left)` gives the value that was subtracted
/// from each sample when the row was filtered.
#[inline(always)]
fn reconstruct<const BPP: usize, F: Fn(u8, u8, u8) -> u8>(
    raw: &[u8],
    current: &mut [u8],
    above: &[u8],
    predict: F,
) {
    let mut left = [0u8; BPP];
    let mut upper_left = [0u8; BPP];

    let pixels = raw.chunks_exact(BPP).zip(current.chunks_exact_mut(OUTPUT_BPP));
    let mut above_pixels = above.chunks_exact(OUTPUT_BPP);

    for (raw_pixel, out_pixel) in pixels {
        let above_pixel = above_pixels.next();

        for i in 0..BPP {
            let up = above_pixel.map_or(0, |pixel| pixel[i]);
            let value = raw_pixel[i].wrapping_add(predict(left[i], up, upper_left[i]));

            out_pixel[i] = value;
            left[i] = value;
            upper_left[i] = up;
        }
    }
}

fn unfilter_row<const BPP: usize>(filter: RowFilter, raw: &[u8], current: &mut [u8], above: &[u8]) {
    match filter {
        RowFilter::None => reconstruct::<BPP, _>(raw, current, above, |_, _, _| 0),
        RowFilter::Sub => reconstruct::<BPP, _>(raw, current, above, |left, _, _| left),
        RowFilter::Up => reconstruct::<BPP, _>(raw, current, above, |_, up, _| up),
        RowFilter::Average => reconstruct::<BPP, _>(raw, current, above, |left, up, _| {
            ((u16::from(left) + u16::from(up)) >> 1) as u8
        }),
        RowFilter::Paeth => reconstruct::<BPP, _>(raw, current, above, paeth_predictor),
        RowFilter::AverageFirst => reconstruct::<BPP, _>(raw, current, &[], |left, _, _| left >> 1),
        RowFilter::PaethFirst => {
            reconstruct::<BPP, _>(raw, current, &[], |left, _, _| paeth_predictor(left, 0, 0))
        },
    }
}

/// Unfilters the inflated scanlines in `filtered` into `output_rgba`, which
/// must hold exactly `width * height * 4` bytes.
///
/// RGB images get an alpha of 255 for every pixel.
pub(crate) fn unfilter(
    header: &PngHeader,
    filtered: &[u8],
    output_rgba: &mut [u8],
) -> Result<(), FormatError> {
    let bytes_per_pixel = header.bytes_per_pixel();
    let bytes_per_scanline = header.bytes_per_scanline()?;
    let expected = header.filtered_len()?;
    let height = header.height as usize;

    if filtered.len() < expected {
        return Err(FormatError::ImageDataTooShort { expected, actual: filtered.len() });
    }

    let output_stride = header.width as usize * OUTPUT_BPP;
    debug_assert_eq!(output_rgba.len(), output_stride * height);

    if bytes_per_pixel < OUTPUT_BPP {
        for pixel in output_rgba.chunks_exact_mut(OUTPUT_BPP) {
            pixel[3] = 255;
        }
    }

    let rows = filtered.chunks_exact(bytes_per_scanline + 1).take(height);
    let mut last_row: Option<&[u8]> = None;
    let mut remaining = output_rgba;

    for (y, row) in rows.enumerate() {
        let filter_type =
            FilterType::try_from(row[0]).map_err(|_| FormatError::InvalidFilterType(row[0]))?;
        let filter = RowFilter::new(filter_type, y == 0);

        let (current, tail) = core::mem::take(&mut remaining).split_at_mut(output_stride);
        let above = last_row.unwrap_or(&[]);

        match bytes_per_pixel {
            3 => unfilter_row::<3>(filter, &row[1..], current, above),
            _ => unfilter_row::<4>(filter, &row[1..], current, above),
        }

        last_row = Some(current);
        remaining = tail;
    }

    Ok(())
}
