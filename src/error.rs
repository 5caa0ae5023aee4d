// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::image::{PixelFormat, Rect};
use std::time::Duration;

/// Errors reported by the imaging routines and the resize engine.
///
/// Everything except [`Error::Transfer`] and [`Error::Watchdog`] is a caller
/// contract violation detected before any pixel is written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported pixel format {0}")]
    UnsupportedFormat(PixelFormat),

    #[error("pixel format mismatch: expected {expected}, found {found}")]
    FormatMismatch {
        expected: PixelFormat,
        found: PixelFormat,
    },

    #[error("image size mismatch: expected {expected_width}x{expected_height}, found {width}x{height}")]
    SizeMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    #[error("buffer too small: {needed} bytes needed, {actual} available")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("region {rect} exceeds {width}x{height} image")]
    RegionOutOfBounds { rect: Rect, width: u32, height: u32 },

    #[error("invalid resize job: {0}")]
    InvalidJob(&'static str),

    #[error("accelerator busy")]
    Busy,

    #[error("accelerator transfer error")]
    Transfer,

    #[error("accelerator watchdog expired after {0:?}")]
    Watchdog(Duration),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
