// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::{Error, Result};
use core::fmt;
use dma2d::ColorMode;

/// Pixel encodings handled by the imaging routines.
///
/// Multi-byte formats are stored channel by channel in memory order:
/// `RGB888` as `R, G, B`, `ARGB8888` as `A, R, G, B`. `RGB565` is a
/// little-endian 16-bit word `rrrrrggg gggbbbbb`. `FLOAT32` is a single
/// native-endian `f32` channel and is not accepted by the color conversions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Gray8,
    Rgb565,
    Rgb888,
    Argb8888,
    Float32,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        bytes_per_pixel(self)
    }
}

/// Byte width of one pixel of `format`.
pub const fn bytes_per_pixel(format: PixelFormat) -> usize {
    match format {
        PixelFormat::Gray8 => 1,
        PixelFormat::Rgb565 => 2,
        PixelFormat::Rgb888 => 3,
        PixelFormat::Argb8888 => 4,
        PixelFormat::Float32 => 4,
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PixelFormat::Gray8 => "GRAY8",
            PixelFormat::Rgb565 => "RGB565",
            PixelFormat::Rgb888 => "RGB888",
            PixelFormat::Argb8888 => "ARGB8888",
            PixelFormat::Float32 => "FLOAT32",
        };
        f.write_str(name)
    }
}

impl TryFrom<PixelFormat> for ColorMode {
    type Error = Error;

    fn try_from(format: PixelFormat) -> Result<Self> {
        match format {
            PixelFormat::Gray8 => Ok(ColorMode::L8),
            PixelFormat::Rgb565 => Ok(ColorMode::Rgb565),
            PixelFormat::Rgb888 => Ok(ColorMode::Rgb888),
            PixelFormat::Argb8888 => Ok(ColorMode::Argb8888),
            PixelFormat::Float32 => Err(Error::UnsupportedFormat(format)),
        }
    }
}

/// Rectangle specification for crop and region-of-interest operations.
///
/// Coordinates are in pixels of the image the rectangle refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Rect {
    /// X coordinate of top-left corner
    pub x: u32,
    /// Y coordinate of top-left corner
    pub y: u32,
    /// Width of the rectangle in pixels
    pub width: u32,
    /// Height of the rectangle in pixels
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns an error unless the rectangle lies within a `width`x`height`
    /// image.
    pub fn check_within(&self, width: u32, height: u32) -> Result<()> {
        let right = u64::from(self.x) + u64::from(self.width);
        let bottom = u64::from(self.y) + u64::from(self.height);
        if right > u64::from(width) || bottom > u64::from(height) {
            return Err(Error::RegionOutOfBounds {
                rect: *self,
                width,
                height,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

const fn format_row_stride(format: PixelFormat, width: u32) -> usize {
    bytes_per_pixel(format) * width as usize
}

const fn image_size(width: u32, height: u32, format: PixelFormat) -> usize {
    format_row_stride(format, width) * height as usize
}

/// Image descriptor over a caller-provided pixel buffer.
///
/// Pixels are row-major with no padding between rows. The buffer `B` can be
/// anything exposing bytes: a borrowed slice for a non-owning view, or a
/// `Vec<u8>` for an owned image. The buffer may be longer than the image,
/// never shorter.
///
/// # Example
///
/// ```
/// use edgefirst_imgproc::image::{Image, PixelFormat};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = Image::new(320, 240, PixelFormat::Rgb565);
/// assert_eq!(img.size(), 320 * 240 * 2);
///
/// let frame = vec![0u8; 640 * 480 * 3];
/// let view = Image::from_data(&frame[..], 640, 480, PixelFormat::Rgb888)?;
/// assert_eq!(view.row_stride(), 1920);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Image<B = Vec<u8>> {
    data: B,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl Image<Vec<u8>> {
    /// Allocates a zeroed image.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Image {
            data: vec![0; image_size(width, height, format)],
            width,
            height,
            format,
        }
    }
}

impl<B: AsRef<[u8]>> Image<B> {
    /// Wraps `data` as a `width`x`height` image of `format`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `data` holds fewer than
    /// `width * height * bytes_per_pixel(format)` bytes.
    pub fn from_data(data: B, width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let needed = image_size(width, height, format);
        let actual = data.as_ref().len();
        if actual < needed {
            return Err(Error::BufferTooSmall { needed, actual });
        }
        Ok(Image {
            data,
            width,
            height,
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn row_stride(&self) -> usize {
        format_row_stride(self.format, self.width)
    }

    /// Size in bytes of the pixel data (excluding any trailing buffer).
    pub fn size(&self) -> usize {
        image_size(self.width, self.height, self.format)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data.as_ref()[..self.size()]
    }

    pub fn view(&self) -> Image<&[u8]> {
        Image {
            data: self.as_bytes(),
            width: self.width,
            height: self.height,
            format: self.format,
        }
    }

    pub fn into_inner(self) -> B {
        self.data
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Image<B> {
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let size = self.size();
        &mut self.data.as_mut()[..size]
    }
}

impl<B: AsRef<[u8]>> fmt::Display for Image<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.format)
    }
}
