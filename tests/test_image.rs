// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edgefirst_imgproc::{
    convert::{self, luma, pack_rgb565, unpack_rgb565},
    crop::{center_rect, crop, crop_center},
    image::{Image, PixelFormat, Rect},
    resize::{resize, resize_crop, Interpolation},
    Error,
};
use std::error::Error as StdError;

/// Grayscale image whose pixel at (x, y) holds `y * width + x`.
fn ramp(width: u32, height: u32) -> Result<Image, Box<dyn StdError>> {
    let data = (0..width * height).map(|v| v as u8).collect::<Vec<_>>();
    Ok(Image::from_data(data, width, height, PixelFormat::Gray8)?)
}

fn rgb565_image(width: u32, height: u32, words: &[u16]) -> Result<Image, Box<dyn StdError>> {
    let data = words.iter().flat_map(|w| w.to_le_bytes()).collect::<Vec<_>>();
    Ok(Image::from_data(data, width, height, PixelFormat::Rgb565)?)
}

fn rgb565_words(img: &Image) -> Vec<u16> {
    img.as_bytes()
        .chunks_exact(2)
        .map(|w| u16::from_le_bytes([w[0], w[1]]))
        .collect()
}

#[test]
fn test_formats() -> Result<(), Box<dyn StdError>> {
    let mut img = Image::new(1920, 1080, PixelFormat::Gray8);
    println!("{}", img);
    assert_eq!(img.size(), 2073600);

    img = Image::new(1920, 1080, PixelFormat::Rgb565);
    println!("{}", img);
    assert_eq!(img.size(), 4147200);

    img = Image::new(1920, 1080, PixelFormat::Rgb888);
    println!("{}", img);
    assert_eq!(img.size(), 6220800);
    assert_eq!(img.row_stride(), 5760);

    img = Image::new(1920, 1080, PixelFormat::Argb8888);
    println!("{}", img);
    assert_eq!(img.size(), 8294400);

    img = Image::new(1920, 1080, PixelFormat::Float32);
    assert_eq!(img.size(), 8294400);
    assert_eq!(img.to_string(), "1920x1080 FLOAT32");

    Ok(())
}

#[test]
fn test_from_data() -> Result<(), Box<dyn StdError>> {
    let frame = vec![0u8; 100];
    let view = Image::from_data(&frame[..], 4, 4, PixelFormat::Rgb565)?;
    assert_eq!(view.as_bytes().len(), 32);

    let err = Image::from_data(&frame[..], 10, 10, PixelFormat::Rgb888).unwrap_err();
    assert!(matches!(
        err,
        Error::BufferTooSmall {
            needed: 300,
            actual: 100
        }
    ));

    let empty = Image::from_data(Vec::new(), 0, 480, PixelFormat::Argb8888)?;
    assert_eq!(empty.size(), 0);
    assert_eq!(empty.pixel_count(), 0);
    Ok(())
}

#[test]
fn test_rgb565_expansion() -> Result<(), Box<dyn StdError>> {
    assert_eq!(unpack_rgb565(0xF800), [255, 0, 0]);
    assert_eq!(unpack_rgb565(0x07E0), [0, 255, 0]);
    assert_eq!(unpack_rgb565(0x001F), [0, 0, 255]);
    assert_eq!(unpack_rgb565(0x0000), [0, 0, 0]);
    assert_eq!(pack_rgb565(255, 128, 64), 0xFC08);

    let src = rgb565_image(2, 1, &[0xF800, 0xFFFF])?;
    let mut dst = Image::new(2, 1, PixelFormat::Rgb888);
    convert::to_rgb888(&src, &mut dst)?;
    assert_eq!(dst.as_bytes(), &[255, 0, 0, 255, 255, 255]);
    Ok(())
}

#[test]
fn test_grayscale() -> Result<(), Box<dyn StdError>> {
    assert_eq!(luma(255, 255, 255), 255);
    assert_eq!(luma(0, 0, 0), 0);

    let src = rgb565_image(4, 1, &[0xF800, 0x07E0, 0xFFFF, 0x0000])?;
    let mut gray = Image::new(4, 1, PixelFormat::Gray8);
    convert::to_grayscale(&src, &mut gray)?;
    assert_eq!(gray.as_bytes(), &[76, 150, 255, 0]);

    let rgb = Image::from_data(vec![255, 0, 0, 0, 255, 0], 2, 1, PixelFormat::Rgb888)?;
    let mut gray = Image::new(2, 1, PixelFormat::Gray8);
    convert::to_grayscale(&rgb, &mut gray)?;
    assert_eq!(gray.as_bytes(), &[76, 150]);
    Ok(())
}

#[test]
fn test_gray_round_trip() -> Result<(), Box<dyn StdError>> {
    let src = ramp(16, 16)?;
    let mut rgb = Image::new(16, 16, PixelFormat::Rgb888);
    let mut gray = Image::new(16, 16, PixelFormat::Gray8);

    convert::to_rgb888(&src, &mut rgb)?;
    convert::to_grayscale(&rgb, &mut gray)?;
    assert_eq!(gray.as_bytes(), src.as_bytes());
    Ok(())
}

#[test]
fn test_argb8888() -> Result<(), Box<dyn StdError>> {
    let gray = Image::from_data(vec![0x40], 1, 1, PixelFormat::Gray8)?;
    let mut argb = Image::new(1, 1, PixelFormat::Argb8888);
    convert::to_argb8888(&gray, &mut argb)?;
    assert_eq!(argb.as_bytes(), &[0xff, 0x40, 0x40, 0x40]);

    let rgb = Image::from_data(vec![1, 2, 3], 1, 1, PixelFormat::Rgb888)?;
    convert::to_argb8888(&rgb, &mut argb)?;
    assert_eq!(argb.as_bytes(), &[0xff, 1, 2, 3]);

    let rgb565 = rgb565_image(1, 1, &[0x001F])?;
    convert::convert(&rgb565, &mut argb)?;
    assert_eq!(argb.as_bytes(), &[0xff, 0, 0, 255]);
    Ok(())
}

#[test]
fn test_rgb565_pack() -> Result<(), Box<dyn StdError>> {
    let rgb = Image::from_data(vec![255, 128, 64, 7, 3, 7], 2, 1, PixelFormat::Rgb888)?;
    let mut dst = Image::new(2, 1, PixelFormat::Rgb565);
    convert::to_rgb565(&rgb, &mut dst)?;
    assert_eq!(rgb565_words(&dst), vec![0xFC08, 0x0000]);
    Ok(())
}

#[test]
fn test_conversion_errors() -> Result<(), Box<dyn StdError>> {
    let gray = ramp(4, 4)?;
    let mut rgb565 = Image::new(4, 4, PixelFormat::Rgb565);
    let err = convert::to_rgb565(&gray, &mut rgb565).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(PixelFormat::Gray8)));

    let rgb = Image::new(4, 4, PixelFormat::Rgb888);
    let mut wrong = Image::new(4, 4, PixelFormat::Rgb888);
    let err = convert::to_grayscale(&rgb, &mut wrong).unwrap_err();
    assert!(matches!(
        err,
        Error::FormatMismatch {
            expected: PixelFormat::Gray8,
            found: PixelFormat::Rgb888
        }
    ));

    let mut small = Image::new(2, 4, PixelFormat::Gray8);
    let err = convert::to_grayscale(&rgb, &mut small).unwrap_err();
    assert!(matches!(err, Error::SizeMismatch { width: 2, .. }));
    assert!(small.as_bytes().iter().all(|&b| b == 0));

    let float = Image::new(4, 4, PixelFormat::Float32);
    let mut gray = Image::new(4, 4, PixelFormat::Gray8);
    assert!(convert::convert(&float, &mut gray).is_err());

    let mut same = Image::new(4, 4, PixelFormat::Gray8);
    convert::convert(&ramp(4, 4)?, &mut same)?;
    assert_eq!(same.as_bytes(), ramp(4, 4)?.as_bytes());
    Ok(())
}

#[test]
fn test_crop() -> Result<(), Box<dyn StdError>> {
    let src = ramp(4, 4)?;
    let mut dst = Image::new(2, 2, PixelFormat::Gray8);
    crop(&src, &mut dst, Rect::new(1, 1, 2, 2))?;
    assert_eq!(dst.as_bytes(), &[5, 6, 9, 10]);

    crop(&src, &mut dst, Rect::new(2, 2, 2, 2))?;
    assert_eq!(dst.as_bytes(), &[10, 11, 14, 15]);

    let err = crop(&src, &mut dst, Rect::new(3, 3, 2, 2)).unwrap_err();
    assert!(matches!(err, Error::RegionOutOfBounds { .. }));

    let mut wrong_size = Image::new(3, 2, PixelFormat::Gray8);
    let err = crop(&src, &mut wrong_size, Rect::new(0, 0, 2, 2)).unwrap_err();
    assert!(matches!(err, Error::SizeMismatch { .. }));
    Ok(())
}

#[test]
fn test_crop_whole_region() -> Result<(), Box<dyn StdError>> {
    let src = ramp(8, 6)?;
    let mut region = Image::new(5, 3, PixelFormat::Gray8);
    crop(&src, &mut region, Rect::new(2, 1, 5, 3))?;

    let mut again = Image::new(5, 3, PixelFormat::Gray8);
    crop(&region, &mut again, Rect::new(0, 0, 5, 3))?;
    assert_eq!(again.as_bytes(), region.as_bytes());
    Ok(())
}

#[test]
fn test_crop_rgb888() -> Result<(), Box<dyn StdError>> {
    let data = (0..4 * 3 * 3).map(|v| v as u8).collect::<Vec<_>>();
    let src = Image::from_data(data, 4, 3, PixelFormat::Rgb888)?;
    let mut dst = Image::new(2, 1, PixelFormat::Rgb888);
    crop(&src, &mut dst, Rect::new(1, 2, 2, 1))?;
    assert_eq!(dst.as_bytes(), &[27, 28, 29, 30, 31, 32]);
    Ok(())
}

#[test]
fn test_crop_center() -> Result<(), Box<dyn StdError>> {
    // Wide source: the horizontal offset comes from the width difference.
    let src = ramp(6, 4)?;
    let mut dst = Image::new(2, 2, PixelFormat::Gray8);
    crop_center(&src, &mut dst)?;
    assert_eq!(dst.as_bytes(), &[8, 9, 14, 15]);

    // Tall source: the vertical offset comes from the height difference.
    let src = ramp(4, 8)?;
    crop_center(&src, &mut dst)?;
    assert_eq!(dst.as_bytes(), &[13, 14, 17, 18]);

    assert_eq!(center_rect(640, 480, 224, 224)?, Rect::new(208, 128, 224, 224));
    assert_eq!(center_rect(5, 5, 2, 2)?, Rect::new(1, 1, 2, 2));
    assert!(center_rect(100, 100, 101, 50).is_err());
    Ok(())
}

#[test]
fn test_resize_uniform() -> Result<(), Box<dyn StdError>> {
    let red = [255u8, 0, 0].repeat(128 * 128);
    let src = Image::from_data(red, 128, 128, PixelFormat::Rgb888)?;

    for method in [Interpolation::Nearest, Interpolation::Bilinear] {
        let mut dst = Image::new(32, 32, PixelFormat::Rgb888);
        resize(&src, &mut dst, method)?;
        assert!(
            dst.as_bytes().chunks_exact(3).all(|px| px == [255, 0, 0]),
            "{method:?}"
        );
    }

    let gray = Image::from_data(vec![100; 4], 2, 2, PixelFormat::Gray8)?;
    let mut up = Image::new(4, 4, PixelFormat::Gray8);
    resize(&gray, &mut up, Interpolation::Bilinear)?;
    assert!(up.as_bytes().iter().all(|&v| v == 100));
    Ok(())
}

#[test]
fn test_resize_nearest() -> Result<(), Box<dyn StdError>> {
    let src = ramp(4, 4)?;
    let mut dst = Image::new(2, 2, PixelFormat::Gray8);
    resize(&src, &mut dst, Interpolation::Nearest)?;
    assert_eq!(dst.as_bytes(), &[0, 2, 8, 10]);

    // A same-sized region of interest is a crop.
    resize_crop(&src, &mut dst, Rect::new(1, 1, 2, 2), Interpolation::Nearest)?;
    assert_eq!(dst.as_bytes(), &[5, 6, 9, 10]);

    let mut same = Image::new(4, 4, PixelFormat::Gray8);
    resize(&src, &mut same, Interpolation::Nearest)?;
    assert_eq!(same.as_bytes(), src.as_bytes());

    let mut up = Image::new(8, 8, PixelFormat::Gray8);
    resize(&src, &mut up, Interpolation::Nearest)?;
    assert_eq!(&up.as_bytes()[..8], &[0, 0, 1, 1, 2, 2, 3, 3]);
    assert_eq!(up.as_bytes()[63], 15);
    Ok(())
}

#[test]
fn test_resize_bilinear_edges() -> Result<(), Box<dyn StdError>> {
    let src = Image::from_data(vec![0, 200], 2, 1, PixelFormat::Gray8)?;
    let mut dst = Image::new(4, 1, PixelFormat::Gray8);
    resize(&src, &mut dst, Interpolation::Bilinear)?;
    assert_eq!(dst.as_bytes(), &[0, 100, 200, 200]);

    // The right edge of the region is clamped inside the region, not the image.
    let src = Image::from_data(vec![0, 200, 50, 50], 4, 1, PixelFormat::Gray8)?;
    resize_crop(&src, &mut dst, Rect::new(0, 0, 2, 1), Interpolation::Bilinear)?;
    assert_eq!(dst.as_bytes(), &[0, 100, 200, 200]);
    Ok(())
}

#[test]
fn test_resize_bilinear_rgb565() -> Result<(), Box<dyn StdError>> {
    let src = rgb565_image(2, 1, &[0x0000, 0xF800])?;
    let mut dst = Image::new(4, 1, PixelFormat::Rgb565);
    resize(&src, &mut dst, Interpolation::Bilinear)?;
    assert_eq!(rgb565_words(&dst), vec![0x0000, 0x7800, 0xF800, 0xF800]);
    Ok(())
}

#[test]
fn test_resize_bilinear_float32() -> Result<(), Box<dyn StdError>> {
    let data = [0.0f32, 1.0]
        .iter()
        .flat_map(|v| v.to_ne_bytes())
        .collect::<Vec<_>>();
    let src = Image::from_data(data, 2, 1, PixelFormat::Float32)?;
    let mut dst = Image::new(4, 1, PixelFormat::Float32);
    resize(&src, &mut dst, Interpolation::Bilinear)?;

    let values = dst
        .as_bytes()
        .chunks_exact(4)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect::<Vec<_>>();
    assert_eq!(values, vec![0.0, 0.5, 1.0, 1.0]);
    Ok(())
}

#[test]
fn test_resize_interior_roi() -> Result<(), Box<dyn StdError>> {
    // 8x8 black frame with a 3x3 block of 200 at (3, 2)
    let data = (0..64u32)
        .map(|i| {
            let (x, y) = (i % 8, i / 8);
            if (3..6).contains(&x) && (2..5).contains(&y) {
                200
            } else {
                0
            }
        })
        .collect::<Vec<u8>>();
    let src = Image::from_data(data, 8, 8, PixelFormat::Gray8)?;
    let roi = Rect::new(3, 2, 3, 3);

    let mut dst = Image::new(4, 4, PixelFormat::Gray8);
    resize_crop(&src, &mut dst, roi, Interpolation::Bilinear)?;
    assert_eq!(dst.as_bytes(), [200u8; 16]);

    let mut dst = Image::new(3, 3, PixelFormat::Gray8);
    resize_crop(&src, &mut dst, roi, Interpolation::Nearest)?;
    assert_eq!(dst.as_bytes(), [200u8; 9]);
    Ok(())
}

#[test]
fn test_resize_errors() -> Result<(), Box<dyn StdError>> {
    let src = ramp(4, 4)?;

    let mut rgb = Image::new(2, 2, PixelFormat::Rgb888);
    let err = resize(&src, &mut rgb, Interpolation::Nearest).unwrap_err();
    assert!(matches!(err, Error::FormatMismatch { .. }));

    let mut dst = Image::new(2, 2, PixelFormat::Gray8);
    let err = resize_crop(&src, &mut dst, Rect::new(2, 2, 3, 3), Interpolation::Bilinear)
        .unwrap_err();
    assert!(matches!(err, Error::RegionOutOfBounds { .. }));

    let err = resize_crop(&src, &mut dst, Rect::new(1, 1, 0, 2), Interpolation::Bilinear)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidJob(_)));

    let mut empty = Image::new(0, 0, PixelFormat::Gray8);
    resize(&src, &mut empty, Interpolation::Bilinear)?;
    Ok(())
}
