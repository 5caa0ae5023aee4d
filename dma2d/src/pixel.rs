// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{AlphaMode, ColorMode, Layer};

/// Expanded 8-bit-per-channel pixel as seen inside the blender.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Argb {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Argb {
    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Argb { a, r, g, b }
    }

    /// Decodes one pixel stored in `mode` from the start of `bytes`.
    pub fn decode(mode: ColorMode, bytes: &[u8]) -> Self {
        match mode {
            ColorMode::Argb8888 => Argb::new(bytes[0], bytes[1], bytes[2], bytes[3]),
            ColorMode::Rgb888 => Argb::new(0xff, bytes[0], bytes[1], bytes[2]),
            ColorMode::Rgb565 => {
                let v = u16::from_le_bytes([bytes[0], bytes[1]]);
                Argb::new(
                    0xff,
                    expand5((v >> 11) as u8),
                    expand6((v >> 5) as u8 & 0x3f),
                    expand5(v as u8 & 0x1f),
                )
            }
            ColorMode::Argb1555 => {
                let v = u16::from_le_bytes([bytes[0], bytes[1]]);
                Argb::new(
                    if v & 0x8000 != 0 { 0xff } else { 0 },
                    expand5((v >> 10) as u8 & 0x1f),
                    expand5((v >> 5) as u8 & 0x1f),
                    expand5(v as u8 & 0x1f),
                )
            }
            ColorMode::Argb4444 => {
                let v = u16::from_le_bytes([bytes[0], bytes[1]]);
                Argb::new(
                    expand4((v >> 12) as u8),
                    expand4((v >> 8) as u8 & 0xf),
                    expand4((v >> 4) as u8 & 0xf),
                    expand4(v as u8 & 0xf),
                )
            }
            ColorMode::L8 => Argb::new(0xff, bytes[0], bytes[0], bytes[0]),
        }
    }

    /// Encodes into `mode` at the start of `bytes`.
    ///
    /// `mode` must be an output mode; L8 is rejected before a transfer runs.
    pub fn encode(self, mode: ColorMode, bytes: &mut [u8]) {
        match mode {
            ColorMode::Argb8888 => bytes[..4].copy_from_slice(&[self.a, self.r, self.g, self.b]),
            ColorMode::Rgb888 => bytes[..3].copy_from_slice(&[self.r, self.g, self.b]),
            ColorMode::Rgb565 => {
                let v = (u16::from(self.r >> 3) << 11)
                    | (u16::from(self.g >> 2) << 5)
                    | u16::from(self.b >> 3);
                bytes[..2].copy_from_slice(&v.to_le_bytes());
            }
            ColorMode::Argb1555 => {
                let v = (u16::from(self.a >> 7) << 15)
                    | (u16::from(self.r >> 3) << 10)
                    | (u16::from(self.g >> 3) << 5)
                    | u16::from(self.b >> 3);
                bytes[..2].copy_from_slice(&v.to_le_bytes());
            }
            ColorMode::Argb4444 => {
                let v = (u16::from(self.a >> 4) << 12)
                    | (u16::from(self.r >> 4) << 8)
                    | (u16::from(self.g >> 4) << 4)
                    | u16::from(self.b >> 4);
                bytes[..2].copy_from_slice(&v.to_le_bytes());
            }
            ColorMode::L8 => unreachable!("L8 is not an output color mode"),
        }
    }

    /// Applies a layer's alpha register to the alpha read from memory.
    pub fn with_layer_alpha(self, layer: &Layer) -> Self {
        let a = match layer.alpha_mode {
            AlphaMode::NoModify => self.a,
            AlphaMode::Replace => layer.alpha,
            AlphaMode::Combine => div255(u32::from(self.a) * u32::from(layer.alpha)),
        };
        Argb { a, ..self }
    }

    /// Porter-Duff "over" of `self` (foreground) onto `background`.
    pub fn over(self, background: Argb) -> Argb {
        let af = u32::from(self.a);
        let ab = u32::from(background.a);
        let a_mult = af * ab / 255;
        let a_out = af + ab - a_mult;
        if a_out == 0 {
            return Argb::default();
        }

        let mix = |cf: u8, cb: u8| {
            let (cf, cb) = (u32::from(cf), u32::from(cb));
            ((cf * af + cb * ab - cb * a_mult + a_out / 2) / a_out) as u8
        };
        Argb {
            a: a_out as u8,
            r: mix(self.r, background.r),
            g: mix(self.g, background.g),
            b: mix(self.b, background.b),
        }
    }
}

fn div255(v: u32) -> u8 {
    ((v + 127) / 255) as u8
}

fn expand4(c: u8) -> u8 {
    (c << 4) | c
}

fn expand5(c: u8) -> u8 {
    (c << 3) | (c >> 2)
}

fn expand6(c: u8) -> u8 {
    (c << 2) | (c >> 4)
}
