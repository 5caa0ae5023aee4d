// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edgefirst_imgproc::{
    image::{PixelFormat, Rect},
    resize::Interpolation,
};
use std::{path::PathBuf, time::Duration};

/// Pixel format selection.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum Format {
    /// 8-bit grayscale
    Gray8,
    /// 16-bit packed 5-6-5 RGB
    Rgb565,
    /// 24-bit RGB
    Rgb888,
    /// 32-bit ARGB
    Argb8888,
}

impl From<Format> for PixelFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Gray8 => PixelFormat::Gray8,
            Format::Rgb565 => PixelFormat::Rgb565,
            Format::Rgb888 => PixelFormat::Rgb888,
            Format::Argb8888 => PixelFormat::Argb8888,
        }
    }
}

/// Resize implementation selection.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum Method {
    /// Software nearest-neighbor
    Nearest,
    /// Software bilinear
    Bilinear,
    /// Two-pass bilinear on the emulated blend accelerator
    Accelerated,
}

impl Method {
    pub fn interpolation(self) -> Option<Interpolation> {
        match self {
            Method::Nearest => Some(Interpolation::Nearest),
            Method::Bilinear => Some(Interpolation::Bilinear),
            Method::Accelerated => None,
        }
    }
}

/// Command-line arguments for the EdgeFirst resize tool.
///
/// Resizes a synthetic test pattern with the selected method and reports the
/// timing. Arguments can be specified via command line or environment
/// variables.
///
/// # Example
///
/// ```bash
/// # Via command line
/// edgefirst-imgproc --source-size "1920 1080" --output-size "640 360" --method accelerated
///
/// # Via environment variables
/// export METHOD=nearest
/// edgefirst-imgproc
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Source image resolution in pixels (width height)
    #[arg(
        long,
        env = "SOURCE_SIZE",
        default_value = "640 480",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub source_size: Vec<u32>,

    /// Output image resolution in pixels (width height)
    #[arg(
        short,
        long,
        env = "OUTPUT_SIZE",
        default_value = "224 224",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub output_size: Vec<u32>,

    /// Pixel format of source and output
    #[arg(long, env = "FORMAT", default_value = "rgb888", value_enum)]
    pub format: Format,

    /// Resize method
    #[arg(short, long, env = "METHOD", default_value = "bilinear", value_enum)]
    pub method: Method,

    /// Source region of interest (x y width height), software methods only
    #[arg(long, env = "ROI", value_delimiter = ' ', num_args = 4)]
    pub roi: Option<Vec<u32>>,

    /// Accelerator watchdog timeout in milliseconds
    #[arg(long, env = "WATCHDOG_MS", default_value = "100")]
    pub watchdog_ms: u64,

    /// Number of resizes to run
    #[arg(short = 'n', long, env = "ITERATIONS", default_value = "1")]
    pub iterations: u32,

    /// Write the last output image as raw pixels to this path
    #[arg(long, env = "OUTPUT_PATH")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,
}

impl Args {
    pub fn watchdog(&self) -> Duration {
        Duration::from_millis(self.watchdog_ms)
    }

    pub fn roi(&self) -> Option<Rect> {
        self.roi
            .as_ref()
            .map(|r| Rect::new(r[0], r[1], r[2], r[3]))
    }
}
