// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Software image scaling.
//!
//! Two interpolation methods are provided, both optionally restricted to a
//! region of interest of the source image:
//!
//! - **Nearest neighbor** maps each destination pixel to a source pixel with
//!   a 16.16 fixed-point ratio. The ratio is rounded up by one unit so the
//!   mapped coordinate never reaches past the last row or column of the
//!   region.
//! - **Bilinear** blends the four neighboring source pixels with weights
//!   taken from the fractional source coordinate. At the right and bottom
//!   edges the second sample is clamped to the last row or column of the
//!   region, so no memory outside the region is read.

use crate::{
    error::{Error, Result},
    image::{Image, PixelFormat, Rect},
};
use tracing::debug;

/// Interpolation method for [`resize`] and [`resize_crop`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

/// Scales the whole of `src` into `dst`.
pub fn resize<S, D>(src: &Image<S>, dst: &mut Image<D>, method: Interpolation) -> Result<()>
where
    S: AsRef<[u8]>,
    D: AsRef<[u8]> + AsMut<[u8]>,
{
    let roi = Rect::new(0, 0, src.width(), src.height());
    resize_crop(src, dst, roi, method)
}

/// Scales the `roi` region of `src` into the whole of `dst`.
///
/// Source and destination formats must match.
pub fn resize_crop<S, D>(
    src: &Image<S>,
    dst: &mut Image<D>,
    roi: Rect,
    method: Interpolation,
) -> Result<()>
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
    roi.check_within(src.width(), src.height())?;
    if dst.pixel_count() == 0 {
        return Ok(());
    }
    if roi.width == 0 || roi.height == 0 {
        return Err(Error::InvalidJob("empty region of interest"));
    }

    debug!("resize {} roi {} -> {} ({:?})", src, roi, dst, method);
    let scale = Scale {
        src_width: src.width() as usize,
        pixel_size: src.format().bytes_per_pixel(),
        roi,
        dst_width: dst.width() as usize,
        dst_height: dst.height() as usize,
    };
    match method {
        Interpolation::Nearest => scale.nearest(src.as_bytes(), dst.as_bytes_mut()),
        Interpolation::Bilinear => scale.bilinear(src.format(), src.as_bytes(), dst.as_bytes_mut()),
    }
    Ok(())
}

struct Scale {
    src_width: usize,
    pixel_size: usize,
    roi: Rect,
    dst_width: usize,
    dst_height: usize,
}

/// Bilinear weights of one destination pixel.
#[derive(Copy, Clone)]
struct Weights {
    dx1: f32,
    dx2: f32,
    dy1: f32,
    dy2: f32,
}

impl Weights {
    /// Blends top-left, top-right, bottom-left and bottom-right samples.
    #[inline]
    fn apply(&self, p: [f32; 4]) -> f32 {
        self.dy2 * (self.dx2 * p[0] + self.dx1 * p[1]) + self.dy1 * (self.dx2 * p[2] + self.dx1 * p[3])
    }
}

/// Integer part, clamped second sample and fractional weight along one axis.
fn sample_axis(dst: usize, ratio: f32, origin: u32, last: usize) -> (usize, usize, f32) {
    let pos = dst as f32 * ratio + origin as f32;
    let first = (pos as usize).min(last);
    let second = if first == last { first } else { first + 1 };
    (first, second, pos - first as f32)
}

impl Scale {
    fn nearest(&self, src: &[u8], dst: &mut [u8]) {
        let ps = self.pixel_size;
        let x_ratio = (u64::from(self.roi.width) << 16) / self.dst_width as u64 + 1;
        let y_ratio = (u64::from(self.roi.height) << 16) / self.dst_height as u64 + 1;
        let last_x = u64::from(self.roi.width) - 1;
        let last_y = u64::from(self.roi.height) - 1;

        for (y, row) in dst.chunks_exact_mut(self.dst_width * ps).enumerate() {
            let sy = ((y as u64 * y_ratio) >> 16).min(last_y) as usize + self.roi.y as usize;
            let src_row = &src[sy * self.src_width * ps..];

            for (x, px) in row.chunks_exact_mut(ps).enumerate() {
                let sx = ((x as u64 * x_ratio) >> 16).min(last_x) as usize + self.roi.x as usize;
                px.copy_from_slice(&src_row[sx * ps..(sx + 1) * ps]);
            }
        }
    }

    fn bilinear(&self, format: PixelFormat, src: &[u8], dst: &mut [u8]) {
        let ps = self.pixel_size;
        let stride = self.src_width * ps;
        let width_ratio = self.roi.width as f32 / self.dst_width as f32;
        let height_ratio = self.roi.height as f32 / self.dst_height as f32;
        let last_x = (self.roi.x + self.roi.width - 1) as usize;
        let last_y = (self.roi.y + self.roi.height - 1) as usize;

        let columns: Vec<_> = (0..self.dst_width)
            .map(|x| sample_axis(x, width_ratio, self.roi.x, last_x))
            .collect();

        for (y, row) in dst.chunks_exact_mut(self.dst_width * ps).enumerate() {
            let (y1, y2, dy1) = sample_axis(y, height_ratio, self.roi.y, last_y);
            let top = &src[y1 * stride..(y1 + 1) * stride];
            let bottom = &src[y2 * stride..(y2 + 1) * stride];

            for (px, &(x1, x2, dx1)) in row.chunks_exact_mut(ps).zip(&columns) {
                let w = Weights {
                    dx1,
                    dx2: 1.0 - dx1,
                    dy1,
                    dy2: 1.0 - dy1,
                };
                let (o1, o2) = (x1 * ps, x2 * ps);
                match format {
                    PixelFormat::Rgb565 => {
                        let word = |row: &[u8], o: usize| u16::from_le_bytes([row[o], row[o + 1]]);
                        let p = [word(top, o1), word(top, o2), word(bottom, o1), word(bottom, o2)];
                        let field = |shift: u16, mask: u16| {
                            let c = p.map(|v| f32::from((v >> shift) & mask));
                            (w.apply(c) as u16) << shift
                        };
                        let v = field(11, 0x1f) | field(5, 0x3f) | field(0, 0x1f);
                        px.copy_from_slice(&v.to_le_bytes());
                    }
                    PixelFormat::Float32 => {
                        let value = |row: &[u8], o: usize| {
                            f32::from_ne_bytes([row[o], row[o + 1], row[o + 2], row[o + 3]])
                        };
                        let p = [value(top, o1), value(top, o2), value(bottom, o1), value(bottom, o2)];
                        px.copy_from_slice(&w.apply(p).to_ne_bytes());
                    }
                    _ => {
                        for (ch, out) in px.iter_mut().enumerate() {
                            let p = [top[o1 + ch], top[o2 + ch], bottom[o1 + ch], bottom[o2 + ch]];
                            *out = w.apply(p.map(f32::from)) as u8;
                        }
                    }
                }
            }
        }
    }
}
