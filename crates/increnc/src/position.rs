//! Position integration.
//!
//! The integrator keeps an unbounded tick count in `i64`, so the hardware
//! counter may wrap any number of times without the raw position wrapping
//! with it. Only [`position`](PositionIntegrator::position) folds the count
//! into a single rotation.
//!
//! Once the count has been re-based at a zero index it holds the ticks since
//! that index, and the whole rotations live in the turn counter instead.

use core::f32::consts::TAU;

use crate::calibration::Calibration;

/// Offset-corrected tick accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionIntegrator {
    accumulated: i64,
    offset: i32,
    indexed: bool,
}

impl PositionIntegrator {
    /// Start at zero ticks with `offset`.
    pub fn new(offset: i32) -> Self {
        Self {
            accumulated: 0,
            offset,
            indexed: false,
        }
    }

    /// Add an oriented tick delta.
    #[inline]
    pub fn advance(&mut self, ticks: i32) {
        self.accumulated = self.accumulated.wrapping_add(i64::from(ticks));
    }

    /// Restart counting from the zero index, `ticks_since_index` oriented
    /// ticks ago.
    #[inline]
    pub fn rebase(&mut self, ticks_since_index: i32) {
        self.accumulated = i64::from(ticks_since_index);
        self.indexed = true;
    }

    /// Whether the count has been re-based at a zero index since the last
    /// reset.
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// Offset-corrected position in ticks.
    #[inline]
    pub fn raw_position(&self) -> i64 {
        self.accumulated.wrapping_add(i64::from(self.offset))
    }

    /// Angle within one rotation in `[0, 2π)`.
    #[inline]
    pub fn position(&self, calibration: &Calibration) -> f32 {
        calibration.position_of(self.raw_position())
    }

    /// Continuous angle in radians.
    ///
    /// Until the count is re-based at an index the unbounded raw position
    /// already holds every rotation, and `turn` is not added again. After a
    /// re-base it is `turn × 2π` plus the angle since the index, with the
    /// offset as a constant bias. `turn` must be the count that belongs to
    /// the last re-base.
    #[inline]
    pub fn absolute_position(&self, turn: i32, calibration: &Calibration) -> f32 {
        let position_const = calibration.position_const();
        if !self.indexed {
            return self.raw_position() as f32 * position_const;
        }
        turn as f32 * TAU
            + calibration.position_of(self.accumulated)
            + self.offset as f32 * position_const
    }

    /// Configured offset in ticks.
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Replace the offset. The raw position moves by the difference at once.
    pub fn set_offset(&mut self, offset: i32) {
        self.offset = offset;
    }

    /// Drop the accumulated ticks and the index reference, keeping the
    /// offset.
    pub fn reset(&mut self) {
        self.accumulated = 0;
        self.indexed = false;
    }
}
