// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    interrupt_line, soft::execute, AcceleratorPort, Interrupt, InterruptLine, Registers, Transfer,
};
use std::{
    io,
    thread::{self, JoinHandle},
};
use tracing::{debug, trace};

/// Software accelerator running transfers on its own thread.
///
/// Each [`start`](AcceleratorPort::start) queues the current register set and
/// transfer to a worker, which raises the interrupt once the transfer has
/// been carried out. The driver observes completion asynchronously through
/// the [`InterruptLine`], as with the real peripheral.
pub struct ThreadedDma2d {
    registers: Registers,
    jobs: Option<kanal::Sender<(Registers, Transfer)>>,
    worker: Option<JoinHandle<()>>,
}

impl ThreadedDma2d {
    pub fn new() -> io::Result<(Self, InterruptLine)> {
        let (irq, line) = interrupt_line();
        let (jobs, queue) = kanal::unbounded::<(Registers, Transfer)>();

        let worker = thread::Builder::new()
            .name("dma2d".to_string())
            .spawn(move || {
                while let Ok((registers, transfer)) = queue.recv() {
                    // SAFETY: the driver upheld the `start` contract when
                    // queueing this transfer.
                    let interrupt = unsafe { execute(&registers, &transfer) };
                    if !irq.raise(interrupt) {
                        break;
                    }
                }
                debug!("dma2d worker stopped");
            })?;

        let port = ThreadedDma2d {
            registers: Registers::default(),
            jobs: Some(jobs),
            worker: Some(worker),
        };
        Ok((port, line))
    }
}

impl AcceleratorPort for ThreadedDma2d {
    fn configure(&mut self, registers: &Registers) {
        self.registers = *registers;
    }

    fn set_foreground_alpha(&mut self, alpha: u8) {
        self.registers.foreground.alpha = alpha;
    }

    unsafe fn start(&mut self, transfer: &Transfer) {
        if let Some(jobs) = &self.jobs {
            if jobs.send((self.registers, *transfer)).is_err() {
                debug!("dma2d worker is gone, transfer dropped");
            }
        }
    }

    fn acknowledge(&mut self, interrupt: Interrupt) {
        trace!("ack {:?}", interrupt);
    }
}

impl Drop for ThreadedDma2d {
    fn drop(&mut self) {
        drop(self.jobs.take());
        if let Some(worker) = self.worker.take() {
            _ = worker.join();
        }
    }
}
