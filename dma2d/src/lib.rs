// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # DMA2D Accelerator Model
//!
//! Register-level model of a 2D blit/blend accelerator: a memory-to-memory
//! engine that copies rectangles, converts pixel formats on the fly and
//! alpha-blends a foreground layer over a background layer with a single
//! scalar alpha per transfer. Completion is signalled by an interrupt.
//!
//! Drivers program the accelerator through the [`AcceleratorPort`] trait and
//! receive interrupts from an [`InterruptLine`]. Two software emulations are
//! provided for hosts without the peripheral:
//!
//! - [`SoftDma2d`] executes each transfer synchronously inside
//!   [`AcceleratorPort::start`] and raises the interrupt immediately.
//! - [`ThreadedDma2d`] executes transfers on a worker thread, so interrupts
//!   arrive asynchronously as they would from real hardware.
//!
//! ## Memory Layout
//!
//! Pixels are addressed by raw address, the way the peripheral sees bus
//! memory. Byte order per [`ColorMode`]:
//!
//! | Mode       | Bytes | Layout                                |
//! |------------|-------|---------------------------------------|
//! | `Argb8888` | 4     | `A, R, G, B`                          |
//! | `Rgb888`   | 3     | `R, G, B`                             |
//! | `Rgb565`   | 2     | little-endian `rrrrrggg gggbbbbb`     |
//! | `Argb1555` | 2     | little-endian `arrrrrgg gggbbbbb`     |
//! | `Argb4444` | 2     | little-endian `aaaarrrr ggggbbbb`     |
//! | `L8`       | 1     | luminance (input only)                |
//!
//! ## Safety
//!
//! [`AcceleratorPort::start`] is `unsafe`: the accelerator reads and writes
//! the addresses in the [`Transfer`] without any bounds information. Callers
//! must guarantee every line of the transfer lies inside live allocations
//! until the matching interrupt has been received.

mod pixel;
mod soft;
mod threaded;

use std::{fmt, time::Duration};

pub use crate::pixel::Argb;
pub use crate::soft::{Fault, SoftDma2d};
pub use crate::threaded::ThreadedDma2d;

/// Longest line, in pixels, a single transfer can cover.
pub const MAX_PIXELS_PER_LINE: u16 = 0x3fff;

/// Largest line offset the layer and output registers can hold.
pub const MAX_LINE_OFFSET: u16 = 0x3fff;

/// Pixel encodings understood by the accelerator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColorMode {
    Argb8888,
    Rgb888,
    Rgb565,
    Argb1555,
    Argb4444,
    L8,
}

impl ColorMode {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            ColorMode::Argb8888 => 4,
            ColorMode::Rgb888 => 3,
            ColorMode::Rgb565 | ColorMode::Argb1555 | ColorMode::Argb4444 => 2,
            ColorMode::L8 => 1,
        }
    }

    /// Whether the output stage can encode this mode.
    pub const fn is_output(self) -> bool {
        !matches!(self, ColorMode::L8)
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ColorMode::Argb8888 => "ARGB8888",
            ColorMode::Rgb888 => "RGB888",
            ColorMode::Rgb565 => "RGB565",
            ColorMode::Argb1555 => "ARGB1555",
            ColorMode::Argb4444 => "ARGB4444",
            ColorMode::L8 => "L8",
        };
        f.write_str(name)
    }
}

/// Operating mode of the transfer engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    /// Raw copy, foreground and output must share a byte width.
    #[default]
    MemoryToMemory,
    /// Copy with foreground to output pixel format conversion.
    PixelFormatConversion,
    /// Blend foreground over background into output.
    Blend,
}

/// How a layer's alpha register combines with the alpha read from memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum AlphaMode {
    #[default]
    NoModify,
    /// Use the layer alpha register instead of the pixel alpha.
    Replace,
    /// Multiply the pixel alpha by the layer alpha register.
    Combine,
}

/// Input layer configuration (foreground or background).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    pub color_mode: ColorMode,
    pub alpha_mode: AlphaMode,
    pub alpha: u8,
    /// Pixels skipped at the end of each line.
    pub line_offset: u16,
}

impl Default for Layer {
    fn default() -> Self {
        Layer {
            color_mode: ColorMode::Argb8888,
            alpha_mode: AlphaMode::NoModify,
            alpha: 0xff,
            line_offset: 0,
        }
    }
}

/// Output stage configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Output {
    pub color_mode: ColorMode,
    /// Pixels skipped at the end of each line.
    pub line_offset: u16,
}

impl Default for Output {
    fn default() -> Self {
        Output {
            color_mode: ColorMode::Argb8888,
            line_offset: 0,
        }
    }
}

/// The programmable register set, minus the per-transfer addresses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Registers {
    pub mode: Mode,
    pub foreground: Layer,
    pub background: Layer,
    pub output: Output,
}

impl Registers {
    /// Checks whether `transfer` can run with this configuration, the way the
    /// peripheral raises a configuration error instead of starting.
    pub fn check(&self, transfer: &Transfer) -> Result<(), &'static str> {
        if transfer.pixels_per_line == 0 || transfer.lines == 0 {
            return Err("empty transfer");
        }
        if transfer.pixels_per_line > MAX_PIXELS_PER_LINE {
            return Err("line exceeds accelerator limit");
        }
        if self.foreground.line_offset > MAX_LINE_OFFSET
            || self.background.line_offset > MAX_LINE_OFFSET
            || self.output.line_offset > MAX_LINE_OFFSET
        {
            return Err("line offset exceeds accelerator limit");
        }
        if !self.output.color_mode.is_output() {
            return Err("output color mode is input only");
        }
        if self.mode == Mode::MemoryToMemory
            && self.foreground.color_mode.bytes_per_pixel()
                != self.output.color_mode.bytes_per_pixel()
        {
            return Err("memory-to-memory copy requires matching pixel widths");
        }
        Ok(())
    }
}

/// Addresses and geometry of one accelerator transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub foreground: usize,
    /// Ignored unless the mode is [`Mode::Blend`].
    pub background: usize,
    pub output: usize,
    pub pixels_per_line: u16,
    pub lines: u16,
}

/// Interrupt sources raised at the end of a transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interrupt {
    TransferComplete,
    TransferError,
    ConfigurationError,
}

impl Interrupt {
    pub fn is_error(self) -> bool {
        !matches!(self, Interrupt::TransferComplete)
    }
}

/// Driver-side access to a blend accelerator.
///
/// A port is the register file of the peripheral. It is programmed with
/// [`configure`](AcceleratorPort::configure), the per-transfer foreground
/// alpha is patched with
/// [`set_foreground_alpha`](AcceleratorPort::set_foreground_alpha) and a
/// transfer is kicked off with [`start`](AcceleratorPort::start). Completion
/// is reported on the [`InterruptLine`] paired with the port; the driver
/// clears it with [`acknowledge`](AcceleratorPort::acknowledge).
pub trait AcceleratorPort {
    fn configure(&mut self, registers: &Registers);

    fn set_foreground_alpha(&mut self, alpha: u8);

    /// Starts a transfer using the current register set.
    ///
    /// # Safety
    ///
    /// Every line described by `transfer` (foreground, background when
    /// blending, and output) must lie within allocations that stay valid,
    /// and are not accessed by the CPU, until the interrupt for this
    /// transfer has been received.
    unsafe fn start(&mut self, transfer: &Transfer);

    fn acknowledge(&mut self, interrupt: Interrupt);
}

/// Creates a connected interrupt source and line.
pub fn interrupt_line() -> (InterruptSource, InterruptLine) {
    let (tx, rx) = kanal::unbounded();
    (InterruptSource(tx), InterruptLine(rx))
}

/// Raising end of an interrupt line, held by the accelerator.
#[derive(Clone)]
pub struct InterruptSource(kanal::Sender<Interrupt>);

impl InterruptSource {
    /// Raises `interrupt`, returning `false` once the line has been dropped.
    pub fn raise(&self, interrupt: Interrupt) -> bool {
        self.0.send(interrupt).is_ok()
    }
}

/// Receiving end of an interrupt line, serviced by the driver.
pub struct InterruptLine(kanal::Receiver<Interrupt>);

impl InterruptLine {
    /// Returns the next pending interrupt without blocking.
    pub fn pending(&self) -> Option<Interrupt> {
        self.0.try_recv().ok().flatten()
    }

    /// Blocks until an interrupt is raised or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> Option<Interrupt> {
        self.0.recv_timeout(timeout).ok()
    }

    /// Discards every pending interrupt, returning how many were dropped.
    pub fn drain(&self) -> usize {
        let mut count = 0;
        while self.pending().is_some() {
            count += 1;
        }
        count
    }
}
