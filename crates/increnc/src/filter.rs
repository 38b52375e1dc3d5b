//! Single-pole speed filter.
//!
//! Backward-Euler discretisation of `H(s) = ω / (s + ω)` with `ω = 2πf`:
//!
//! ```text
//! y[n] = a * x[n] + b * y[n-1]
//! a = ωT / (1 + ωT),  b = 1 / (1 + ωT)
//! ```
//!
//! The coefficients are fixed when the filter is built or retimed.

use core::f32::consts::TAU;

use crate::config::validate_cutoff;
use crate::error::EncoderResult;

/// Low-pass filter state.
///
/// # RT Safety
///
/// - `#[repr(C)]` for stable ABI
/// - No heap allocations
/// - O(1) time complexity
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LowPassFilter {
    /// Input coefficient.
    pub a: f32,
    /// Feedback coefficient.
    pub b: f32,
    /// Previous output.
    pub out: f32,
    cutoff_hz: f32,
}

impl LowPassFilter {
    /// Build a filter with `cutoff_hz` sampled every `update_period` seconds.
    ///
    /// The cutoff must be positive and strictly below Nyquist.
    ///
    /// # Example
    ///
    /// ```
    /// use increnc::LowPassFilter;
    ///
    /// let mut filter = LowPassFilter::new(250.0, 100e-6)?;
    /// let y = filter.apply(100.0);
    /// assert!(y > 0.0 && y < 100.0);
    /// # Ok::<(), increnc::EncoderError>(())
    /// ```
    pub fn new(cutoff_hz: f32, update_period: f32) -> EncoderResult<Self> {
        validate_cutoff(cutoff_hz, update_period)?;
        let mut filter = Self {
            a: 1.0,
            b: 0.0,
            out: 0.0,
            cutoff_hz,
        };
        filter.set_coefficients(update_period);
        Ok(filter)
    }

    /// Recompute the coefficients for a new sample period, keeping the
    /// output state.
    pub fn retime(&mut self, update_period: f32) -> EncoderResult<()> {
        validate_cutoff(self.cutoff_hz, update_period)?;
        self.set_coefficients(update_period);
        Ok(())
    }

    fn set_coefficients(&mut self, update_period: f32) {
        let wt = TAU * self.cutoff_hz * update_period;
        self.a = wt / (1.0 + wt);
        self.b = 1.0 / (1.0 + wt);
    }

    /// Cutoff frequency in Hz.
    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    /// Feed one sample and return the new output.
    #[inline]
    pub fn apply(&mut self, input: f32) -> f32 {
        self.out = self.a * input + self.b * self.out;
        self.out
    }

    /// Clear the output state.
    pub fn reset(&mut self) {
        self.out = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(cutoff: f32, period: f32) -> LowPassFilter {
        match LowPassFilter::new(cutoff, period) {
            Ok(f) => f,
            Err(e) => panic!("filter construction failed: {e}"),
        }
    }

    #[test]
    fn test_coefficients_sum_to_one() {
        let f = filter(250.0, 100e-6);
        assert!((f.a + f.b - 1.0).abs() < 1e-6);
        assert!(f.a > 0.0 && f.a < 1.0);
    }

    #[test]
    fn test_first_sample_is_scaled_by_a() {
        let mut f = filter(250.0, 100e-6);
        let a = f.a;
        assert_eq!(f.apply(100.0), a * 100.0);
    }

    #[test]
    fn test_step_response_converges() {
        let mut f = filter(250.0, 100e-6);
        let mut prev = 0.0;
        for _ in 0..500 {
            let y = f.apply(100.0);
            assert!(y >= prev);
            assert!(y <= 100.0);
            prev = y;
        }
        assert!((prev - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_reset_clears_output_only() {
        let mut f = filter(250.0, 100e-6);
        let (a, b) = (f.a, f.b);
        f.apply(10.0);
        f.reset();
        assert_eq!(f.out, 0.0);
        assert_eq!((f.a, f.b), (a, b));
    }

    #[test]
    fn test_retime_keeps_state_and_rejects_nyquist() {
        let mut f = filter(250.0, 100e-6);
        f.apply(50.0);
        let out = f.out;
        let a = f.a;

        assert!(f.retime(200e-6).is_ok());
        assert_eq!(f.out, out);
        assert!(f.a > a);

        // 2 ms period -> 250 Hz Nyquist
        assert!(f.retime(2e-3).is_err());
    }

    #[test]
    fn test_rejects_invalid_cutoff() {
        assert!(LowPassFilter::new(0.0, 100e-6).is_err());
        assert!(LowPassFilter::new(5_000.0, 100e-6).is_err());
        assert!(LowPassFilter::new(f32::NAN, 100e-6).is_err());
    }
}
