//! Simulated tick source.
//!
//! [`SimulatedSource`] stands in for the timer peripheral in tests, benches
//! and host-side simulation. It feeds deterministic tick sequences and
//! records the control requests the estimator issues.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use crate::source::TickSource;

/// Atomics-backed [`TickSource`] test double.
#[derive(Debug)]
pub struct SimulatedSource {
    counter: AtomicI32,
    edge_timestamp: AtomicU32,
    counting: AtomicBool,
    counter_resets: AtomicU32,
    arm_requests: AtomicU32,
    disarm_requests: AtomicU32,
    counter_bits: u32,
    reference_bits: u32,
    reference_clock_hz: f32,
}

impl SimulatedSource {
    /// Full-width counter and reference timer at `reference_clock_hz`.
    pub fn new(reference_clock_hz: f32) -> Self {
        Self::with_widths(reference_clock_hz, 32, 32)
    }

    /// Source with explicit counter and reference timer widths.
    pub fn with_widths(reference_clock_hz: f32, counter_bits: u32, reference_bits: u32) -> Self {
        Self {
            counter: AtomicI32::new(0),
            edge_timestamp: AtomicU32::new(0),
            counting: AtomicBool::new(false),
            counter_resets: AtomicU32::new(0),
            arm_requests: AtomicU32::new(0),
            disarm_requests: AtomicU32::new(0),
            counter_bits,
            reference_bits,
            reference_clock_hz,
        }
    }

    /// Move the counter by `ticks`. Reads wrap at the counter width.
    ///
    /// Ticks are applied even while disarmed so tests can model a shaft
    /// that moves before the estimator exists.
    pub fn advance(&self, ticks: i32) {
        self.counter.fetch_add(ticks, Ordering::AcqRel);
    }

    /// Set the counter to an absolute value.
    pub fn set_counter(&self, value: i32) {
        self.counter.store(value, Ordering::Release);
    }

    /// Latch a new edge timestamp.
    pub fn latch_edge(&self, timestamp: u32) {
        let mask = width_mask(self.reference_bits);
        self.edge_timestamp
            .store(timestamp & mask, Ordering::Release);
    }

    /// Move the counter and latch an edge `elapsed` reference ticks after
    /// the previous one.
    pub fn step(&self, ticks: i32, elapsed: u32) {
        self.advance(ticks);
        let next = self
            .edge_timestamp
            .load(Ordering::Acquire)
            .wrapping_add(elapsed);
        self.latch_edge(next);
    }

    /// Number of counter resets requested so far.
    pub fn counter_resets(&self) -> u32 {
        self.counter_resets.load(Ordering::Acquire)
    }

    /// Number of arm requests so far.
    pub fn arm_requests(&self) -> u32 {
        self.arm_requests.load(Ordering::Acquire)
    }

    /// Number of disarm requests so far.
    pub fn disarm_requests(&self) -> u32 {
        self.disarm_requests.load(Ordering::Acquire)
    }

    /// Whether the counter is currently armed.
    pub fn is_counting(&self) -> bool {
        self.counting.load(Ordering::Acquire)
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new(1_000_000.0)
    }
}

impl TickSource for SimulatedSource {
    fn counter(&self) -> i32 {
        let raw = self.counter.load(Ordering::Acquire);
        if self.counter_bits >= 32 {
            raw
        } else {
            // sign-extend like a hardware counter read into a signed register
            let shift = 32 - self.counter_bits;
            raw.wrapping_shl(shift).wrapping_shr(shift)
        }
    }

    fn counter_bits(&self) -> u32 {
        self.counter_bits
    }

    fn edge_timestamp(&self) -> u32 {
        self.edge_timestamp.load(Ordering::Acquire)
    }

    fn reference_bits(&self) -> u32 {
        self.reference_bits
    }

    fn reference_clock_hz(&self) -> f32 {
        self.reference_clock_hz
    }

    fn reset_counter(&self) {
        self.counter.store(0, Ordering::Release);
        self.counter_resets.fetch_add(1, Ordering::AcqRel);
    }

    fn set_counting(&self, enabled: bool) {
        self.counting.store(enabled, Ordering::Release);
        if enabled {
            self.arm_requests.fetch_add(1, Ordering::AcqRel);
        } else {
            self.disarm_requests.fetch_add(1, Ordering::AcqRel);
        }
    }
}

fn width_mask(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}
