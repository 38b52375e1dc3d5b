//! Position sensor capability.
//!
//! Consumers that only need "a rotary position/speed sensor" talk to
//! [`PositionSensor`]; they never see how the underlying timer is wired.

use serde::{Deserialize, Serialize};

use crate::classifier::{Direction, FaultStatus};
use crate::error::EncoderResult;

/// Kind of rotary sensor behind a [`PositionSensor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum SensorType {
    /// Incremental quadrature encoder.
    Encoder,
}

/// Rotary position and speed sensor.
///
/// Object safe: drivers are usable as `&mut dyn PositionSensor`.
pub trait PositionSensor {
    /// Periodic step. Call once per refresh period.
    fn update(&mut self);

    /// Zero-index event from the sensor's index signal.
    fn on_zero_index_event(&mut self);

    /// Mechanical speed in rad/s.
    fn speed(&self) -> f32;

    /// Angle within the current rotation in `[0, 2π)`.
    fn position(&self) -> f32;

    /// Continuous angle across turns in rad.
    fn absolute_position(&self) -> f32;

    /// Offset-corrected position in ticks.
    fn raw_position(&self) -> i64;

    /// Rotation direction.
    fn direction(&self) -> Direction;

    /// Whole turns counted at the zero index.
    fn turn(&self) -> i32;

    /// Latched fault bits.
    fn fault(&self) -> FaultStatus;

    /// Raw position offset in ticks.
    fn offset(&self) -> i32;

    /// Replace the raw position offset.
    fn set_offset(&mut self, offset: i32);

    /// Period between two `update` calls in seconds.
    fn refresh_period(&self) -> f32;

    /// Change the period between two `update` calls.
    fn set_refresh_period(&mut self, update_period: f32) -> EncoderResult<()>;

    /// Ticks per mechanical rotation.
    fn resolution(&self) -> u32;

    /// Signal periods per mechanical rotation.
    fn period_per_rotation(&self) -> u16;

    /// Sensor kind.
    fn sensor_type(&self) -> SensorType;

    /// Return to the power-on state.
    fn reset(&mut self);

    /// Clear latched faults.
    fn reset_faults(&mut self);
}
