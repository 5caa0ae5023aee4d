// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # Accelerated Bilinear Resize
//!
//! [`ResizeEngine`] performs a bilinear resize on a blend accelerator that
//! can only blend two equally sized lines with one scalar alpha per
//! transfer. The resize is split into two separable passes, each made of
//! single-line transfers:
//!
//! 1. **Vertical pass**: for every output row, the two source rows around the
//!    sampling position are blended into one row of a work buffer holding
//!    `source_width x output_height` ARGB8888 pixels. The wide intermediate
//!    format keeps full channel precision between the passes.
//! 2. **Horizontal pass**: for every output column, the two work buffer
//!    columns around the sampling position are blended into the output
//!    surface, converting to the output color mode on the way.
//!
//! Sampling positions are tracked in Q21 fixed point. For a pass producing
//! `n` lines from `m` source lines the step is `((m - 1) << 21) / n` and the
//! first position is half a step, sampling at pixel centers. The integer
//! part selects the background line, the line after it is the foreground,
//! and the top 8 bits of the fractional part are the foreground alpha.
//!
//! ## State Machine
//!
//! ```text
//!        setup()             last row             last column
//! IDLE ----------> FIRST_LOOP ------> SECOND_LOOP -----------> DONE --> IDLE
//!                       |                  |
//!                       +---- error -------+-----------------> ERROR -> IDLE
//! ```
//!
//! Every transition after [`ResizeEngine::setup`] is driven by an accelerator
//! interrupt handed to [`ResizeEngine::on_interrupt`]; the caller is never
//! blocked. The completion callback runs exactly once per job, with
//! [`Stage::Done`] or [`Stage::Error`], right before the engine returns to
//! [`Stage::Idle`].
//!
//! ## Example
//!
//! ```
//! use dma2d::{ColorMode, SoftDma2d};
//! use edgefirst_imgproc::engine::{ResizeEngine, ResizeJob, Stage, Surface};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (port, line) = SoftDma2d::new();
//! let mut engine = ResizeEngine::new(port).with_callback(|stage| println!("{stage:?}"));
//!
//! let src = vec![0x80u8; 64 * 64 * 3];
//! let mut dst = vec![0u8; 32 * 32 * 2];
//! let mut work = vec![0u32; 64 * 32];
//!
//! let job = ResizeJob::new(
//!     Surface::new(&src, 64, ColorMode::Rgb888, 64, 64),
//!     Surface::new_mut(&mut dst, 32, ColorMode::Rgb565, 32, 32),
//!     &mut work,
//! );
//! // SAFETY: the buffers outlive the job, which is serviced to completion below.
//! assert_eq!(unsafe { engine.setup(&job)? }, Stage::SetupDone);
//! assert_eq!(engine.service(&line, Duration::from_millis(100))?, Stage::Done);
//! # Ok(())
//! # }
//! ```

use crate::{
    error::{Error, Result},
    image::Image,
};
use dma2d::{
    AcceleratorPort, AlphaMode, ColorMode, Interrupt, InterruptLine, Layer, Mode, Output,
    Registers, Transfer, MAX_LINE_OFFSET, MAX_PIXELS_PER_LINE,
};
use std::{
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    time::Duration,
};
use tracing::{debug, error, trace, warn};

/// Fractional bits of the blend position.
const Q21: u32 = 21;

/// Shift bringing the top 8 fractional bits down to an alpha value.
const ALPHA_SHIFT: u32 = Q21 - 8;

/// Resize engine stages, also used as [`ResizeEngine::setup`] results.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Idle = 0,
    FirstLoop = 1,
    SecondLoop = 2,
    Done = 3,
    Error = 4,
    SetupBusy = 5,
    SetupDone = 6,
}

impl Stage {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Stage::Idle,
            1 => Stage::FirstLoop,
            2 => Stage::SecondLoop,
            3 => Stage::Done,
            4 => Stage::Error,
            5 => Stage::SetupBusy,
            6 => Stage::SetupDone,
            _ => unreachable!("invalid resize stage {raw}"),
        }
    }

    /// Whether a resize job is in flight.
    pub fn is_busy(self) -> bool {
        matches!(self, Stage::FirstLoop | Stage::SecondLoop)
    }
}

/// Read-only view of an engine's stage, usable from other contexts.
#[derive(Clone, Debug)]
pub struct StageMonitor(Arc<AtomicU8>);

impl StageMonitor {
    pub fn stage(&self) -> Stage {
        Stage::from_raw(self.0.load(Ordering::Acquire))
    }
}

/// Default completion callback: halts forever on [`Stage::Error`].
///
/// Production code is expected to install its own callback with
/// [`ResizeEngine::with_callback`] and recover, retry or propagate instead.
pub fn halt_on_error(stage: Stage) {
    if stage == Stage::Error {
        error!("resize transfer error, halting");
        loop {
            std::hint::spin_loop();
        }
    }
}

/// A pitched pixel region in memory, as the accelerator addresses it.
///
/// `pitch` is the buffer's row length in pixels; the region starts at
/// (`x`, `y`) and spans `width` x `height` pixels. The surface records the
/// buffer's address and length but does not borrow it: keeping the buffer
/// alive while a job uses it is the caller's responsibility.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    pub address: usize,
    pub len: usize,
    pub pitch: u16,
    pub color_mode: ColorMode,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Surface {
    /// Surface over `buffer` for reading, region at the origin.
    pub fn new(buffer: &[u8], pitch: u16, color_mode: ColorMode, width: u16, height: u16) -> Self {
        Surface {
            address: buffer.as_ptr() as usize,
            len: buffer.len(),
            pitch,
            color_mode,
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Surface over `buffer` for writing, region at the origin.
    pub fn new_mut(
        buffer: &mut [u8],
        pitch: u16,
        color_mode: ColorMode,
        width: u16,
        height: u16,
    ) -> Self {
        Surface {
            address: buffer.as_mut_ptr() as usize,
            ..Surface::new(buffer, pitch, color_mode, width, height)
        }
    }

    /// Moves the region to (`x`, `y`) in the buffer.
    pub fn at(self, x: u16, y: u16) -> Self {
        Surface { x, y, ..self }
    }

    fn pitch_bytes(&self) -> usize {
        usize::from(self.pitch) * self.color_mode.bytes_per_pixel()
    }

    /// Address of the region's top-left pixel.
    fn origin(&self) -> usize {
        self.address
            + usize::from(self.y) * self.pitch_bytes()
            + usize::from(self.x) * self.color_mode.bytes_per_pixel()
    }

    fn check(&self) -> Result<()> {
        if self.address == 0 {
            return Err(Error::InvalidJob("null buffer"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidJob("empty region"));
        }
        if usize::from(self.x) + usize::from(self.width) > usize::from(self.pitch) {
            return Err(Error::InvalidJob("region exceeds pitch"));
        }
        let end = (usize::from(self.y) + usize::from(self.height) - 1) * usize::from(self.pitch)
            + usize::from(self.x)
            + usize::from(self.width);
        let needed = end * self.color_mode.bytes_per_pixel();
        if needed > self.len {
            return Err(Error::BufferTooSmall {
                needed,
                actual: self.len,
            });
        }
        Ok(())
    }
}

fn dimension(value: u32) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::InvalidJob("image too large for accelerator"))
}

impl<B: AsRef<[u8]>> TryFrom<&Image<B>> for Surface {
    type Error = Error;

    fn try_from(img: &Image<B>) -> Result<Self> {
        let width = dimension(img.width())?;
        Ok(Surface::new(
            img.as_bytes(),
            width,
            img.format().try_into()?,
            width,
            dimension(img.height())?,
        ))
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> TryFrom<&mut Image<B>> for Surface {
    type Error = Error;

    fn try_from(img: &mut Image<B>) -> Result<Self> {
        let width = dimension(img.width())?;
        let height = dimension(img.height())?;
        let color_mode = img.format().try_into()?;
        Ok(Surface::new_mut(
            img.as_bytes_mut(),
            width,
            color_mode,
            width,
            height,
        ))
    }
}

/// Number of 32-bit words the work buffer of a resize needs.
pub const fn work_buffer_words(source_width: u16, output_height: u16) -> usize {
    source_width as usize * output_height as usize
}

/// Parameters of one accelerated resize.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResizeJob {
    pub source: Surface,
    pub output: Surface,
    /// Address of the intermediate ARGB8888 buffer.
    pub work_buffer: usize,
    /// Length of the intermediate buffer in 32-bit words.
    pub work_buffer_words: usize,
}

impl ResizeJob {
    pub fn new(source: Surface, output: Surface, work_buffer: &mut [u32]) -> Self {
        ResizeJob {
            source,
            output,
            work_buffer: work_buffer.as_mut_ptr() as usize,
            work_buffer_words: work_buffer.len(),
        }
    }

    /// Checks the job against the accelerator's and the algorithm's limits.
    pub fn validate(&self) -> Result<()> {
        if self.source.width < 2 || self.source.height < 2 {
            return Err(Error::InvalidJob("source region must be at least 2x2"));
        }
        if self.source.width > MAX_PIXELS_PER_LINE {
            return Err(Error::InvalidJob("source width exceeds accelerator line length"));
        }
        if !self.output.color_mode.is_output() {
            return Err(Error::InvalidJob("output color mode is input only"));
        }
        if self.output.width > MAX_PIXELS_PER_LINE {
            return Err(Error::InvalidJob("output width exceeds accelerator line length"));
        }
        self.source.check()?;
        self.output.check()?;
        if self.output.pitch - 1 > MAX_LINE_OFFSET {
            return Err(Error::InvalidJob("output pitch exceeds accelerator line offset"));
        }
        if self.work_buffer == 0 {
            return Err(Error::InvalidJob("null work buffer"));
        }
        let needed = work_buffer_words(self.source.width, self.output.height);
        if self.work_buffer_words < needed {
            return Err(Error::BufferTooSmall {
                needed: needed * 4,
                actual: self.work_buffer_words * 4,
            });
        }
        Ok(())
    }
}

/// Loop parameters of one pass.
#[derive(Copy, Clone, Debug, Default)]
struct Pass {
    /// Lines still to be produced, including the one in flight.
    counter: u32,
    base_address: usize,
    /// Q21 position of the current line.
    blend_index: u64,
    /// Q21 step between output lines.
    blend_coeff: u64,
    /// Distance between two adjacent source lines.
    source_pitch_bytes: usize,
    /// Distance between two adjacent output lines.
    output_pitch_bytes: usize,
    pixels_per_line: u16,
    lines: u16,
}

impl Pass {
    fn new(outputs: u16, sources: u16, base_address: usize) -> Self {
        let blend_coeff = (u64::from(sources - 1) << Q21) / u64::from(outputs);
        Pass {
            counter: u32::from(outputs),
            base_address,
            blend_index: blend_coeff / 2,
            blend_coeff,
            ..Pass::default()
        }
    }

    fn transfer(&self, output: usize) -> (Transfer, u8) {
        let first_line = (self.blend_index >> Q21) as usize;
        let background = self.base_address + first_line * self.source_pitch_bytes;
        let transfer = Transfer {
            foreground: background + self.source_pitch_bytes,
            background,
            output,
            pixels_per_line: self.pixels_per_line,
            lines: self.lines,
        };
        (transfer, (self.blend_index >> ALPHA_SHIFT) as u8)
    }
}

/// Interrupt-driven two-pass bilinear resize on a blend accelerator.
///
/// The engine owns the accelerator port, so there is one engine per
/// accelerator and it cannot be cloned. At most one job is in flight: a
/// [`setup`](ResizeEngine::setup) while busy returns [`Stage::SetupBusy`]
/// without touching the running job.
pub struct ResizeEngine<P> {
    port: P,
    stage: Arc<AtomicU8>,
    first: Pass,
    second: Pass,
    second_registers: Registers,
    second_output: usize,
    output_address: usize,
    /// Transfers of abandoned jobs whose interrupt has not arrived yet.
    orphaned: usize,
    callback: Box<dyn FnMut(Stage) + Send>,
}

impl<P: AcceleratorPort> ResizeEngine<P> {
    pub fn new(port: P) -> Self {
        ResizeEngine {
            port,
            stage: Arc::new(AtomicU8::new(Stage::Idle as u8)),
            first: Pass::default(),
            second: Pass::default(),
            second_registers: Registers::default(),
            second_output: 0,
            output_address: 0,
            orphaned: 0,
            callback: Box::new(halt_on_error),
        }
    }

    /// Replaces the completion callback.
    pub fn with_callback(mut self, callback: impl FnMut(Stage) + Send + 'static) -> Self {
        self.callback = Box::new(callback);
        self
    }

    pub fn stage(&self) -> Stage {
        Stage::from_raw(self.stage.load(Ordering::Acquire))
    }

    pub fn monitor(&self) -> StageMonitor {
        StageMonitor(self.stage.clone())
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Number of transfers left running by a watchdog expiry whose
    /// interrupts are still outstanding. While non-zero the accelerator is
    /// busy and no new job or conversion is accepted; see
    /// [`settle`](ResizeEngine::settle).
    pub fn orphaned_transfers(&self) -> usize {
        self.orphaned
    }

    /// Arms a resize job and starts its first transfer.
    ///
    /// Returns [`Stage::SetupDone`] once the job is running, or
    /// [`Stage::SetupBusy`] if another job is in flight or a transfer
    /// abandoned by the watchdog has not signalled completion yet, in which
    /// case nothing is changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the job fails [`ResizeJob::validate`].
    ///
    /// # Safety
    ///
    /// The source, output and work buffers described by `job` must stay
    /// valid, and must not be accessed by the CPU, until the completion
    /// callback has run (or [`service`](ResizeEngine::service) returned).
    pub unsafe fn setup(&mut self, job: &ResizeJob) -> Result<Stage> {
        if self.stage() != Stage::Idle || self.orphaned != 0 {
            debug!("resize setup rejected, engine busy");
            return Ok(Stage::SetupBusy);
        }
        job.validate()?;

        let source = &job.source;
        let output = &job.output;
        let work_bpp = ColorMode::Argb8888.bytes_per_pixel();

        let mut first = Pass::new(output.height, source.height, source.origin());
        first.source_pitch_bytes = source.pitch_bytes();
        first.output_pitch_bytes = usize::from(source.width) * work_bpp;
        first.pixels_per_line = source.width;
        first.lines = 1;

        let mut second = Pass::new(output.width, source.width, job.work_buffer);
        second.source_pitch_bytes = work_bpp;
        second.output_pitch_bytes = output.color_mode.bytes_per_pixel();
        second.pixels_per_line = 1;
        second.lines = output.height;

        let first_registers = blend_registers(
            source.color_mode,
            0,
            Output {
                color_mode: ColorMode::Argb8888,
                line_offset: 0,
            },
        );
        let second_registers = blend_registers(
            ColorMode::Argb8888,
            source.width - 1,
            Output {
                color_mode: output.color_mode,
                line_offset: output.pitch - 1,
            },
        );

        self.first = first;
        self.second = second;
        self.second_registers = second_registers;
        self.second_output = output.origin();
        self.output_address = job.work_buffer;
        self.stage.store(Stage::FirstLoop as u8, Ordering::Release);

        debug!(
            "resize {}x{} {} -> {}x{} {}",
            source.width,
            source.height,
            source.color_mode,
            output.width,
            output.height,
            output.color_mode
        );
        self.port.configure(&first_registers);
        self.blend_line();
        Ok(Stage::SetupDone)
    }

    /// Interrupt service routine: acknowledges `interrupt` and advances the
    /// job.
    ///
    /// Returns the terminal stage when this interrupt ended the job.
    /// Interrupts of orphaned transfers, and interrupts arriving while no job
    /// is in flight, are acknowledged and otherwise ignored.
    pub fn on_interrupt(&mut self, interrupt: Interrupt) -> Option<Stage> {
        self.port.acknowledge(interrupt);
        if self.orphaned != 0 {
            // The accelerator completes transfers in order, so this one
            // belongs to the oldest abandoned transfer.
            self.orphaned -= 1;
            debug!("{:?} of orphaned transfer discarded", interrupt);
            return None;
        }
        match interrupt {
            Interrupt::TransferComplete => self.transfer_complete(),
            Interrupt::TransferError | Interrupt::ConfigurationError => {
                self.transfer_error(interrupt)
            }
        }
    }

    /// Services interrupts from `line` until the current job ends.
    ///
    /// This is the hosted replacement for the interrupt vector. If no
    /// interrupt arrives within `watchdog` the job is failed: the callback
    /// receives [`Stage::Error`], the engine returns to [`Stage::Idle`] and
    /// [`Error::Watchdog`] is returned. The transfer still running on the
    /// accelerator at that point becomes orphaned: its buffers stay in use
    /// and the engine stays unavailable until its interrupt has been
    /// consumed, see [`settle`](ResizeEngine::settle).
    pub fn service(&mut self, line: &InterruptLine, watchdog: Duration) -> Result<Stage> {
        while self.stage().is_busy() {
            let Some(interrupt) = line.wait(watchdog) else {
                warn!("no accelerator interrupt within {:?}", watchdog);
                self.orphaned += 1;
                self.finish(Stage::Error);
                return Err(Error::Watchdog(watchdog));
            };
            match self.on_interrupt(interrupt) {
                Some(Stage::Error) => return Err(Error::Transfer),
                Some(stage) => return Ok(stage),
                None => {}
            }
        }
        Ok(self.stage())
    }

    /// Waits up to `timeout` per transfer for the interrupts of orphaned
    /// transfers, making the accelerator available again.
    ///
    /// If an interrupt does not arrive in time the transfer is presumed lost,
    /// the orphan count is cleared and [`Error::Watchdog`] is returned.
    pub fn settle(&mut self, line: &InterruptLine, timeout: Duration) -> Result<()> {
        while self.orphaned != 0 {
            let Some(interrupt) = line.wait(timeout) else {
                warn!(
                    "{} orphaned transfers never completed, presumed lost",
                    self.orphaned
                );
                self.orphaned = 0;
                return Err(Error::Watchdog(timeout));
            };
            self.on_interrupt(interrupt);
        }
        Ok(())
    }

    /// Copies `source` into `output` in one accelerator transfer, converting
    /// the pixel format and forcing alpha to opaque, then waits up to
    /// `timeout` for completion.
    ///
    /// Both surfaces must have the same region size. The output region may
    /// sit anywhere inside a larger pitched buffer, e.g. a frame buffer.
    ///
    /// # Errors
    ///
    /// [`Error::Busy`] while a resize or an orphaned transfer is in flight,
    /// [`Error::InvalidJob`] or
    /// [`Error::BufferTooSmall`] for bad surfaces, [`Error::Transfer`] and
    /// [`Error::Watchdog`] for accelerator failures.
    ///
    /// # Safety
    ///
    /// Both buffers must stay valid until this function returns. After a
    /// [`Error::Watchdog`] the accelerator may still be writing the output:
    /// the buffers must then stay valid until [`settle`](ResizeEngine::settle)
    /// succeeds.
    pub unsafe fn convert_blocking(
        &mut self,
        source: &Surface,
        output: &Surface,
        line: &InterruptLine,
        timeout: Duration,
    ) -> Result<()> {
        if self.stage() != Stage::Idle || self.orphaned != 0 {
            return Err(Error::Busy);
        }
        source.check()?;
        output.check()?;
        if source.width != output.width || source.height != output.height {
            return Err(Error::InvalidJob("surface regions differ in size"));
        }
        if source.width > MAX_PIXELS_PER_LINE {
            return Err(Error::InvalidJob("width exceeds accelerator line length"));
        }
        if !output.color_mode.is_output() {
            return Err(Error::InvalidJob("output color mode is input only"));
        }
        if source.pitch - source.width > MAX_LINE_OFFSET
            || output.pitch - output.width > MAX_LINE_OFFSET
        {
            return Err(Error::InvalidJob("pitch exceeds accelerator line offset"));
        }

        self.port.configure(&Registers {
            mode: Mode::PixelFormatConversion,
            foreground: Layer {
                color_mode: source.color_mode,
                alpha_mode: AlphaMode::Replace,
                alpha: 0xff,
                line_offset: source.pitch - source.width,
            },
            output: Output {
                color_mode: output.color_mode,
                line_offset: output.pitch - output.width,
            },
            ..Registers::default()
        });
        self.port.start(&Transfer {
            foreground: source.origin(),
            background: 0,
            output: output.origin(),
            pixels_per_line: source.width,
            lines: source.height,
        });

        let Some(interrupt) = line.wait(timeout) else {
            warn!("no accelerator interrupt within {:?}", timeout);
            self.orphaned += 1;
            return Err(Error::Watchdog(timeout));
        };
        self.port.acknowledge(interrupt);
        if interrupt.is_error() {
            error!("pixel format conversion failed: {:?}", interrupt);
            return Err(Error::Transfer);
        }
        Ok(())
    }

    fn transfer_complete(&mut self) -> Option<Stage> {
        let stage = self.stage();
        let pass = match stage {
            Stage::FirstLoop => &mut self.first,
            Stage::SecondLoop => &mut self.second,
            _ => {
                trace!("transfer complete with no resize in flight");
                return None;
            }
        };

        pass.counter -= 1;
        if pass.counter != 0 {
            self.output_address += pass.output_pitch_bytes;
            pass.blend_index += pass.blend_coeff;
            self.blend_line();
            return None;
        }

        if stage == Stage::FirstLoop {
            debug!("vertical pass done");
            self.port.configure(&self.second_registers);
            self.output_address = self.second_output;
            self.stage.store(Stage::SecondLoop as u8, Ordering::Release);
            self.blend_line();
            None
        } else {
            debug!("resize done");
            Some(self.finish(Stage::Done))
        }
    }

    fn transfer_error(&mut self, interrupt: Interrupt) -> Option<Stage> {
        if !self.stage().is_busy() {
            trace!("{:?} with no resize in flight", interrupt);
            return None;
        }
        error!("resize aborted by {:?}", interrupt);
        Some(self.finish(Stage::Error))
    }

    /// Publishes the terminal stage, runs the callback and returns to idle.
    fn finish(&mut self, outcome: Stage) -> Stage {
        self.stage.store(outcome as u8, Ordering::Release);
        (self.callback)(outcome);
        self.stage.store(Stage::Idle as u8, Ordering::Release);
        outcome
    }

    /// Points the accelerator at the two lines around the current blend
    /// position and starts the transfer.
    fn blend_line(&mut self) {
        let pass = match self.stage() {
            Stage::SecondLoop => &self.second,
            _ => &self.first,
        };
        let (transfer, alpha) = pass.transfer(self.output_address);
        trace!(
            "blend bg {:#x} fg {:#x} alpha {} -> {:#x}",
            transfer.background,
            transfer.foreground,
            alpha,
            transfer.output
        );
        self.port.set_foreground_alpha(alpha);
        // SAFETY: the addresses derive from a job that passed validation in
        // `setup`, whose caller keeps the buffers alive until completion.
        unsafe { self.port.start(&transfer) };
    }
}

fn blend_registers(input: ColorMode, line_offset: u16, output: Output) -> Registers {
    Registers {
        mode: Mode::Blend,
        foreground: Layer {
            color_mode: input,
            alpha_mode: AlphaMode::Replace,
            alpha: 0,
            line_offset,
        },
        background: Layer {
            color_mode: input,
            alpha_mode: AlphaMode::Replace,
            alpha: 0xff,
            line_offset,
        },
        output,
    }
}
