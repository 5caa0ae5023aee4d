// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    interrupt_line, AcceleratorPort, Argb, Interrupt, InterruptLine, InterruptSource, Mode,
    Registers, Transfer,
};
use std::slice::{from_raw_parts, from_raw_parts_mut};
use tracing::{trace, warn};

/// Failure injected into the emulator, counted in started transfers
/// (1-based).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// The transfer raises a transfer error instead of completing.
    TransferError { at: usize },
    /// The transfer runs but its interrupt never reaches the line.
    LostInterrupt { at: usize },
}

/// Synchronous software emulation of the accelerator.
///
/// [`start`](AcceleratorPort::start) performs the whole transfer before
/// returning and raises the resulting interrupt on the line returned by
/// [`SoftDma2d::new`]. Nothing re-enters the driver: the interrupt waits on
/// the line until the driver services it.
pub struct SoftDma2d {
    registers: Registers,
    irq: InterruptSource,
    fault: Option<Fault>,
    transfers: usize,
    acknowledged: usize,
}

impl SoftDma2d {
    pub fn new() -> (Self, InterruptLine) {
        let (irq, line) = interrupt_line();
        let port = SoftDma2d {
            registers: Registers::default(),
            irq,
            fault: None,
            transfers: 0,
            acknowledged: 0,
        };
        (port, line)
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Number of transfers started so far.
    pub fn transfers(&self) -> usize {
        self.transfers
    }

    /// Number of interrupts the driver has acknowledged.
    pub fn acknowledged(&self) -> usize {
        self.acknowledged
    }
}

impl AcceleratorPort for SoftDma2d {
    fn configure(&mut self, registers: &Registers) {
        self.registers = *registers;
    }

    fn set_foreground_alpha(&mut self, alpha: u8) {
        self.registers.foreground.alpha = alpha;
    }

    unsafe fn start(&mut self, transfer: &Transfer) {
        self.transfers += 1;
        let interrupt = match self.fault {
            Some(Fault::TransferError { at }) if at == self.transfers => {
                warn!("injected transfer error on transfer {}", at);
                Interrupt::TransferError
            }
            _ => execute(&self.registers, transfer),
        };
        if let Some(Fault::LostInterrupt { at }) = self.fault {
            if at == self.transfers {
                warn!("dropping interrupt of transfer {}", at);
                return;
            }
        }
        self.irq.raise(interrupt);
    }

    fn acknowledge(&mut self, interrupt: Interrupt) {
        trace!("ack {:?}", interrupt);
        self.acknowledged += 1;
    }
}

/// Runs one transfer against raw memory and returns the interrupt it raises.
///
/// # Safety
///
/// See [`AcceleratorPort::start`].
pub(crate) unsafe fn execute(registers: &Registers, transfer: &Transfer) -> Interrupt {
    if let Err(reason) = registers.check(transfer) {
        warn!("configuration error: {}", reason);
        return Interrupt::ConfigurationError;
    }

    let fg = &registers.foreground;
    let bg = &registers.background;
    let out = &registers.output;
    let fg_bpp = fg.color_mode.bytes_per_pixel();
    let bg_bpp = bg.color_mode.bytes_per_pixel();
    let out_bpp = out.color_mode.bytes_per_pixel();
    let pixels = usize::from(transfer.pixels_per_line);

    for line in 0..usize::from(transfer.lines) {
        let fg_line = transfer.foreground + line * (pixels + usize::from(fg.line_offset)) * fg_bpp;
        let bg_line = transfer.background + line * (pixels + usize::from(bg.line_offset)) * bg_bpp;
        let out_line = transfer.output + line * (pixels + usize::from(out.line_offset)) * out_bpp;

        if registers.mode == Mode::MemoryToMemory {
            std::ptr::copy(
                fg_line as *const u8,
                out_line as *mut u8,
                pixels * out_bpp,
            );
            continue;
        }

        for px in 0..pixels {
            let fg_px = from_raw_parts((fg_line + px * fg_bpp) as *const u8, fg_bpp);
            let color = Argb::decode(fg.color_mode, fg_px).with_layer_alpha(fg);
            let color = match registers.mode {
                Mode::Blend => {
                    let bg_px = from_raw_parts((bg_line + px * bg_bpp) as *const u8, bg_bpp);
                    color.over(Argb::decode(bg.color_mode, bg_px).with_layer_alpha(bg))
                }
                _ => color,
            };
            let out_px = from_raw_parts_mut((out_line + px * out_bpp) as *mut u8, out_bpp);
            color.encode(out.color_mode, out_px);
        }
    }

    Interrupt::TransferComplete
}
