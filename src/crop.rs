// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    error::{Error, Result},
    image::{Image, Rect},
};

/// Copies the `rect` region of `src` into `dst`.
///
/// `dst` must have the format of `src` and the dimensions of `rect`. Each
/// row is copied as one contiguous block.
pub fn crop<S, D>(src: &Image<S>, dst: &mut Image<D>, rect: Rect) -> Result<()>
where
    S: AsRef<[u8]>,
    D: AsRef<[u8]> + AsMut<[u8]>,
{
    if src.format() != dst.format() {
        return Err(Error::FormatMismatch {
            expected: src.format(),
            found: dst.format(),
        });
    }
    if dst.width() != rect.width || dst.height() != rect.height {
        return Err(Error::SizeMismatch {
            expected_width: rect.width,
            expected_height: rect.height,
            width: dst.width(),
            height: dst.height(),
        });
    }
    rect.check_within(src.width(), src.height())?;

    let pixel_size = src.format().bytes_per_pixel();
    let src_stride = src.row_stride();
    let line_size = dst.row_stride();
    let left = rect.x as usize * pixel_size;
    let top = rect.y as usize;

    if line_size == 0 {
        return Ok(());
    }

    let input = src.as_bytes();
    for (i, out) in dst.as_bytes_mut().chunks_exact_mut(line_size).enumerate() {
        let start = (top + i) * src_stride + left;
        out.copy_from_slice(&input[start..start + line_size]);
    }
    Ok(())
}

/// Crops the centered `dst`-sized region of `src`.
///
/// The horizontal offset comes from the width difference and the vertical
/// offset from the height difference, rounded down.
pub fn crop_center<S, D>(src: &Image<S>, dst: &mut Image<D>) -> Result<()>
where
    S: AsRef<[u8]>,
    D: AsRef<[u8]> + AsMut<[u8]>,
{
    let rect = center_rect(src.width(), src.height(), dst.width(), dst.height())?;
    crop(src, dst, rect)
}

/// The `width`x`height` rectangle centered in a `src_width`x`src_height`
/// image.
pub fn center_rect(src_width: u32, src_height: u32, width: u32, height: u32) -> Result<Rect> {
    if width > src_width || height > src_height {
        return Err(Error::RegionOutOfBounds {
            rect: Rect::new(0, 0, width, height),
            width: src_width,
            height: src_height,
        });
    }
    Ok(Rect::new(
        (src_width - width) / 2,
        (src_height - height) / 2,
        width,
        height,
    ))
}
