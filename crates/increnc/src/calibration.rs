//! Derived calibration constants.
//!
//! Computed once from an [`EncoderConfig`] and the reference clock of the
//! tick source; recomputed only when the refresh period changes.

use core::f32::consts::TAU;

use crate::config::EncoderConfig;
use crate::error::{EncoderError, EncoderResult};

/// Constants converting raw ticks into engineering units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    ticks_per_rotation: u32,
    position_const: f32,
    speed_const_pulse_count: f32,
    speed_const_time_diff: f32,
    speed_mode_threshold: f32,
    speed_mode_threshold_ticks: i32,
    reference_clock_hz: f32,
    update_period: f32,
}

impl Calibration {
    /// Derive constants for `config` with a reference timer running at
    /// `reference_clock_hz`.
    pub fn new(config: &EncoderConfig, reference_clock_hz: f32) -> EncoderResult<Self> {
        config.validate()?;
        if !reference_clock_hz.is_finite() || reference_clock_hz <= 0.0 {
            return Err(EncoderError::invalid_source(format!(
                "reference clock must be positive, got {reference_clock_hz} Hz"
            )));
        }
        let ticks_per_rotation = config.ticks_per_rotation().ok_or_else(|| {
            EncoderError::invalid_config("resolution", "ticks per rotation overflow the counter range")
        })?;
        let ticks = ticks_per_rotation as f32;

        let mut calibration = Self {
            ticks_per_rotation,
            position_const: TAU / ticks,
            speed_const_pulse_count: 0.0,
            speed_const_time_diff: TAU * reference_clock_hz / ticks,
            speed_mode_threshold: config.speed_mode_threshold,
            speed_mode_threshold_ticks: 0,
            reference_clock_hz,
            update_period: config.update_period,
        };
        calibration.retime(config.update_period);
        Ok(calibration)
    }

    /// Recompute the period-dependent constants.
    pub(crate) fn retime(&mut self, update_period: f32) {
        self.update_period = update_period;
        self.speed_const_pulse_count = TAU / (self.ticks_per_rotation as f32 * update_period);
        let ticks = (self.speed_mode_threshold / self.speed_const_pulse_count).ceil();
        self.speed_mode_threshold_ticks = if ticks >= i32::MAX as f32 {
            i32::MAX
        } else {
            ticks as i32
        };
    }

    /// Ticks per mechanical rotation after edge multiplication.
    pub fn ticks_per_rotation(&self) -> u32 {
        self.ticks_per_rotation
    }

    /// Radians per tick.
    pub fn position_const(&self) -> f32 {
        self.position_const
    }

    /// Multiplies a per-period tick delta into rad/s.
    pub fn speed_const_pulse_count(&self) -> f32 {
        self.speed_const_pulse_count
    }

    /// Divided by the reference ticks between edges to give rad/s.
    pub fn speed_const_time_diff(&self) -> f32 {
        self.speed_const_time_diff
    }

    /// Mode switching threshold in rad/s.
    pub fn speed_mode_threshold(&self) -> f32 {
        self.speed_mode_threshold
    }

    /// Mode switching threshold expressed as ticks per update period.
    pub fn speed_mode_threshold_ticks(&self) -> i32 {
        self.speed_mode_threshold_ticks
    }

    /// Reference timer frequency in Hz.
    pub fn reference_clock_hz(&self) -> f32 {
        self.reference_clock_hz
    }

    /// Update period the speed constants were derived for.
    pub fn update_period(&self) -> f32 {
        self.update_period
    }

    /// Angle within the current rotation, in `[0, 2π)`, for a raw position.
    #[inline]
    pub fn position_of(&self, raw_position: i64) -> f32 {
        let within = raw_position.rem_euclid(i64::from(self.ticks_per_rotation));
        within as f32 * self.position_const
    }
}
