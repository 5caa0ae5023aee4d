// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # EdgeFirst Image Processing Library
//!
//! This library provides the image transformations of an embedded vision
//! pipeline: pixel format conversion, cropping and resizing on the CPU, plus
//! a bilinear resize offloaded to a 2D blend accelerator and driven entirely
//! by the accelerator's completion interrupts.
//!
//! ## Features
//!
//! - **Pixel Formats**: GRAY8, RGB565, RGB888 and ARGB8888 images described
//!   by [`image::Image`] over caller-owned buffers.
//! - **Color Conversion**: BT.601 grayscale in fixed point, RGB565 expansion
//!   with bit replication, opaque ARGB8888 output.
//! - **Crop**: rectangular and centered sub-region extraction.
//! - **Software Resize**: nearest-neighbor and bilinear scaling with an
//!   optional region of interest.
//! - **Accelerated Resize**: two-pass separable bilinear resize on a blend
//!   accelerator through the [`dma2d::AcceleratorPort`] abstraction, with
//!   software emulation for hosts without the peripheral.
//!
//! ## Example
//!
//! ```
//! use edgefirst_imgproc::{
//!     convert,
//!     image::{Image, PixelFormat},
//!     resize::{resize, Interpolation},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let camera = Image::new(128, 128, PixelFormat::Rgb888);
//! let mut small = Image::new(32, 32, PixelFormat::Rgb888);
//! let mut gray = Image::new(32, 32, PixelFormat::Gray8);
//!
//! resize(&camera, &mut small, Interpolation::Bilinear)?;
//! convert::to_grayscale(&small, &mut gray)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Safety
//!
//! The accelerator works on raw bus addresses. Arming an accelerated job is
//! `unsafe`: the caller guarantees the buffers outlive the job. The software
//! routines are entirely safe.

pub mod convert;
pub mod crop;
pub mod engine;
pub mod error;
pub mod image;
pub mod resize;

pub use crate::error::{Error, Result};
