//! Simulated 10-bit ADC on a half-duplex bus.
//!
//! Answers every 3-byte request with the framing a real converter uses:
//! a don't-care first byte, the two high sample bits in the second byte
//! (upper bits noisy) and the low eight bits in the third.

use glove_traits::{BoxError, SpiBus};
use tracing::trace;

use crate::error::HwError;

/// Largest 10-bit sample.
const SAMPLE_MAX: u16 = 0x03FF;

pub struct SimulatedBus {
    open: u16,
    closed: u16,
    calibration_reads: usize,
    step: u16,
    reads: usize,
    sweep: u16,
    rising: bool,
    fail_after: Option<usize>,
}

impl SimulatedBus {
    /// A glove that reports `open` for the first `calibration_reads` samples,
    /// `closed` for the next `calibration_reads`, then sweeps back and forth
    /// between the two in steps of `step`.
    pub fn new(open: u16, closed: u16, calibration_reads: usize, step: u16) -> Self {
        let open = open.min(SAMPLE_MAX);
        let closed = closed.min(SAMPLE_MAX);
        Self {
            open,
            closed,
            calibration_reads,
            step: step.max(1),
            reads: 0,
            sweep: open.min(closed),
            rising: true,
            fail_after: None,
        }
    }

    /// Make every transfer after the first `n` fail.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    fn next_sample(&mut self) -> u16 {
        let n = self.reads;
        if n < self.calibration_reads {
            return self.open;
        }
        if n < self.calibration_reads.saturating_mul(2) {
            return self.closed;
        }
        let (lo, hi) = (self.open.min(self.closed), self.open.max(self.closed));
        let current = self.sweep;
        if self.rising {
            self.sweep = current.saturating_add(self.step).min(hi);
            if self.sweep == hi {
                self.rising = false;
            }
        } else {
            self.sweep = current.saturating_sub(self.step).max(lo);
            if self.sweep == lo {
                self.rising = true;
            }
        }
        current
    }
}

impl SpiBus for SimulatedBus {
    fn transfer(&mut self, buf: &mut [u8]) -> Result<(), BoxError> {
        if buf.is_empty() {
            return Err(HwError::EmptyTransfer.into());
        }
        if self.fail_after.is_some_and(|n| self.reads >= n) {
            return Err(HwError::Transfer(std::io::Error::other("simulated bus fault")).into());
        }
        let sample = self.next_sample();
        self.reads += 1;
        buf.fill(0);
        if let [_, hi, lo, ..] = buf {
            *hi = 0xF8 | ((sample >> 8) as u8 & 0x03);
            *lo = (sample & 0xFF) as u8;
        }
        trace!(sample, "sim: transfer");
        Ok(())
    }
}
