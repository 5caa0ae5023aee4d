// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Color space conversions between grayscale and the RGB encodings.
//!
//! All conversions take a source and destination image of identical
//! dimensions, check the formats against the conversion's accepted set and
//! run single-pass over the pixels in raster order.

use crate::{
    error::{Error, Result},
    image::{Image, PixelFormat},
};

/// ITU-R BT.601 luma weights in 16.16 fixed point; they sum to 65536.
const LUMA_R: u32 = 19595;
const LUMA_G: u32 = 38470;
const LUMA_B: u32 = 7471;

/// BT.601 luma of an 8-bit RGB triple, rounded to nearest.
pub const fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B;
    ((y + 0x8000) >> 16) as u8
}

/// Unpacks a 5-6-5 word to 8-bit channels, copying the high bits of each
/// field into the freed low bits.
pub const fn unpack_rgb565(pixel: u16) -> [u8; 3] {
    let r = ((pixel >> 11) & 0x1f) as u8;
    let g = ((pixel >> 5) & 0x3f) as u8;
    let b = (pixel & 0x1f) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

/// Packs 8-bit channels into a 5-6-5 word by truncation.
pub const fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    (((r as u16) >> 3) << 11) | (((g as u16) >> 2) << 5) | ((b as u16) >> 3)
}

fn check_conversion<S, D>(
    src: &Image<S>,
    dst: &Image<D>,
    accepted: &[PixelFormat],
    target: PixelFormat,
) -> Result<()>
where
    S: AsRef<[u8]>,
    D: AsRef<[u8]>,
{
    if dst.format() != target {
        return Err(Error::FormatMismatch {
            expected: target,
            found: dst.format(),
        });
    }
    if !accepted.contains(&src.format()) {
        return Err(Error::UnsupportedFormat(src.format()));
    }
    if src.width() != dst.width() || src.height() != dst.height() {
        return Err(Error::SizeMismatch {
            expected_width: src.width(),
            expected_height: src.height(),
            width: dst.width(),
            height: dst.height(),
        });
    }
    Ok(())
}

/// Converts an RGB565 or RGB888 image to GRAY8.
pub fn to_grayscale<S, D>(src: &Image<S>, dst: &mut Image<D>) -> Result<()>
where
    S: AsRef<[u8]>,
    D: AsRef<[u8]> + AsMut<[u8]>,
{
    check_conversion(
        src,
        dst,
        &[PixelFormat::Rgb565, PixelFormat::Rgb888],
        PixelFormat::Gray8,
    )?;

    let out = dst.as_bytes_mut();
    match src.format() {
        PixelFormat::Rgb565 => {
            for (px, y) in src.as_bytes().chunks_exact(2).zip(out) {
                let [r, g, b] = unpack_rgb565(u16::from_le_bytes([px[0], px[1]]));
                *y = luma(r, g, b);
            }
        }
        _ => {
            for (px, y) in src.as_bytes().chunks_exact(3).zip(out) {
                *y = luma(px[0], px[1], px[2]);
            }
        }
    }
    Ok(())
}

/// Converts an RGB888 image to RGB565.
pub fn to_rgb565<S, D>(src: &Image<S>, dst: &mut Image<D>) -> Result<()>
where
    S: AsRef<[u8]>,
    D: AsRef<[u8]> + AsMut<[u8]>,
{
    check_conversion(src, dst, &[PixelFormat::Rgb888], PixelFormat::Rgb565)?;

    for (px, out) in src
        .as_bytes()
        .chunks_exact(3)
        .zip(dst.as_bytes_mut().chunks_exact_mut(2))
    {
        out.copy_from_slice(&pack_rgb565(px[0], px[1], px[2]).to_le_bytes());
    }
    Ok(())
}

/// Converts a GRAY8 or RGB565 image to RGB888.
pub fn to_rgb888<S, D>(src: &Image<S>, dst: &mut Image<D>) -> Result<()>
where
    S: AsRef<[u8]>,
    D: AsRef<[u8]> + AsMut<[u8]>,
{
    check_conversion(
        src,
        dst,
        &[PixelFormat::Gray8, PixelFormat::Rgb565],
        PixelFormat::Rgb888,
    )?;

    let out = dst.as_bytes_mut().chunks_exact_mut(3);
    match src.format() {
        PixelFormat::Gray8 => {
            for (&y, px) in src.as_bytes().iter().zip(out) {
                px.fill(y);
            }
        }
        _ => {
            for (word, px) in src.as_bytes().chunks_exact(2).zip(out) {
                px.copy_from_slice(&unpack_rgb565(u16::from_le_bytes([word[0], word[1]])));
            }
        }
    }
    Ok(())
}

/// Converts a GRAY8, RGB565 or RGB888 image to ARGB8888 with opaque alpha.
pub fn to_argb8888<S, D>(src: &Image<S>, dst: &mut Image<D>) -> Result<()>
where
    S: AsRef<[u8]>,
    D: AsRef<[u8]> + AsMut<[u8]>,
{
    check_conversion(
        src,
        dst,
        &[PixelFormat::Gray8, PixelFormat::Rgb565, PixelFormat::Rgb888],
        PixelFormat::Argb8888,
    )?;

    let out = dst.as_bytes_mut().chunks_exact_mut(4);
    match src.format() {
        PixelFormat::Gray8 => {
            for (&y, px) in src.as_bytes().iter().zip(out) {
                px.copy_from_slice(&[0xff, y, y, y]);
            }
        }
        PixelFormat::Rgb565 => {
            for (word, px) in src.as_bytes().chunks_exact(2).zip(out) {
                let [r, g, b] = unpack_rgb565(u16::from_le_bytes([word[0], word[1]]));
                px.copy_from_slice(&[0xff, r, g, b]);
            }
        }
        _ => {
            for (rgb, px) in src.as_bytes().chunks_exact(3).zip(out) {
                px.copy_from_slice(&[0xff, rgb[0], rgb[1], rgb[2]]);
            }
        }
    }
    Ok(())
}

/// Converts `src` into the format of `dst`, picking the conversion from the
/// destination format. Equal formats are copied as is.
pub fn convert<S, D>(src: &Image<S>, dst: &mut Image<D>) -> Result<()>
where
    S: AsRef<[u8]>,
    D: AsRef<[u8]> + AsMut<[u8]>,
{
    if src.format() == dst.format() {
        check_conversion(src, dst, &[src.format()], src.format())?;
        dst.as_bytes_mut().copy_from_slice(src.as_bytes());
        return Ok(());
    }

    match dst.format() {
        PixelFormat::Gray8 => to_grayscale(src, dst),
        PixelFormat::Rgb565 => to_rgb565(src, dst),
        PixelFormat::Rgb888 => to_rgb888(src, dst),
        PixelFormat::Argb8888 => to_argb8888(src, dst),
        PixelFormat::Float32 => Err(Error::UnsupportedFormat(PixelFormat::Float32)),
    }
}
