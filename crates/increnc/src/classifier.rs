//! Direction and fault classification.

use core::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::speed::SpeedMode;

/// Rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Counting up.
    Forward,
    /// Counting down.
    Backward,
    /// No tick has been observed yet.
    #[default]
    Unknown,
}

impl Direction {
    /// Direction implied by a tick delta.
    ///
    /// A zero delta keeps `previous`, so a momentary stop does not flicker
    /// the reported direction.
    #[inline]
    pub fn from_delta(delta: i32, previous: Direction) -> Self {
        match delta {
            d if d > 0 => Direction::Forward,
            d if d < 0 => Direction::Backward,
            _ => previous,
        }
    }

    /// Sign applied to unsigned speed magnitudes.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Direction::Backward => -1.0,
            Direction::Forward | Direction::Unknown => 1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
            Direction::Unknown => write!(f, "unknown"),
        }
    }
}

bitflags! {
    /// Latched fault bits.
    ///
    /// An empty set is the only state in which speed and direction can be
    /// trusted. Bits accumulate across updates until
    /// [`reset_faults`](crate::IncrementalEncoder::reset_faults) clears them.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FaultStatus: u8 {
        /// Measured speed magnitude exceeded `max_speed`.
        const SPEED_OUT_OF_RANGE = 0b0000_0001;

        /// Reading contradicts the estimator state (non-finite estimate, or
        /// a full rotation within one period while below the mode threshold).
        const INCONSISTENT       = 0b0000_0010;
    }
}

impl FaultStatus {
    /// No fault is latched.
    pub const NO_FAULT: FaultStatus = FaultStatus::empty();

    /// Returns true if no fault bit is set.
    #[inline]
    pub fn is_ok(self) -> bool {
        self.is_empty()
    }
}

impl fmt::Display for FaultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no fault");
        }
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "{}", name.to_ascii_lowercase())?;
            first = false;
        }
        Ok(())
    }
}

/// Outcome of checking one raw speed estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Estimate to feed into the filter, clamped to the plausible range.
    pub speed: f32,
    /// Faults raised by this sample alone.
    pub faults: FaultStatus,
}

/// Plausible speed range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedLimits {
    /// Magnitudes below this read as exactly 0.
    pub min_speed: f32,
    /// Magnitudes above this are a fault.
    pub max_speed: f32,
}

impl SpeedLimits {
    /// Check a raw estimate taken in `mode` from a delta of `tick_delta`.
    ///
    /// Overspeed clamps the estimate to `±max_speed`. A non-finite estimate
    /// is replaced by 0.
    pub fn classify(
        &self,
        raw_speed: f32,
        mode: SpeedMode,
        tick_delta: i32,
        ticks_per_rotation: u32,
    ) -> Classification {
        let mut faults = FaultStatus::NO_FAULT;

        if mode == SpeedMode::TimeDiff && tick_delta.unsigned_abs() >= ticks_per_rotation {
            faults |= FaultStatus::INCONSISTENT;
        }

        if !raw_speed.is_finite() {
            faults |= FaultStatus::INCONSISTENT;
            return Classification { speed: 0.0, faults };
        }

        let speed = if raw_speed.abs() > self.max_speed {
            faults |= FaultStatus::SPEED_OUT_OF_RANGE;
            raw_speed.clamp(-self.max_speed, self.max_speed)
        } else {
            raw_speed
        };

        Classification { speed, faults }
    }

    /// Coerce magnitudes below `min_speed` to exactly 0.
    #[inline]
    pub fn floor(&self, speed: f32) -> f32 {
        if speed.abs() < self.min_speed {
            0.0
        } else {
            speed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: SpeedLimits = SpeedLimits {
        min_speed: 10.0,
        max_speed: 500.0,
    };

    #[test]
    fn test_direction_from_delta() {
        assert_eq!(Direction::from_delta(3, Direction::Unknown), Direction::Forward);
        assert_eq!(Direction::from_delta(-1, Direction::Forward), Direction::Backward);
        assert_eq!(Direction::from_delta(0, Direction::Backward), Direction::Backward);
        assert_eq!(Direction::from_delta(0, Direction::Unknown), Direction::Unknown);
    }

    #[test]
    fn test_fault_status_display() {
        assert_eq!(FaultStatus::NO_FAULT.to_string(), "no fault");
        assert_eq!(
            FaultStatus::SPEED_OUT_OF_RANGE.to_string(),
            "speed_out_of_range"
        );
        assert_eq!(
            (FaultStatus::SPEED_OUT_OF_RANGE | FaultStatus::INCONSISTENT).to_string(),
            "speed_out_of_range | inconsistent"
        );
    }

    #[test]
    fn test_overspeed_clamps_and_flags() {
        let c = LIMITS.classify(600.0, SpeedMode::PulseCount, 78, 8192);
        assert_eq!(c.speed, 500.0);
        assert_eq!(c.faults, FaultStatus::SPEED_OUT_OF_RANGE);

        let c = LIMITS.classify(-600.0, SpeedMode::PulseCount, -78, 8192);
        assert_eq!(c.speed, -500.0);
    }

    #[test]
    fn test_in_range_passes_through() {
        let c = LIMITS.classify(499.0, SpeedMode::PulseCount, 65, 8192);
        assert_eq!(c.speed, 499.0);
        assert!(c.faults.is_ok());
    }

    #[test]
    fn test_full_rotation_in_time_diff_is_inconsistent() {
        let c = LIMITS.classify(1.0, SpeedMode::TimeDiff, 8192, 8192);
        assert!(c.faults.contains(FaultStatus::INCONSISTENT));

        let c = LIMITS.classify(1.0, SpeedMode::PulseCount, 8192, 8192);
        assert!(!c.faults.contains(FaultStatus::INCONSISTENT));
    }

    #[test]
    fn test_non_finite_is_inconsistent() {
        let c = LIMITS.classify(f32::NAN, SpeedMode::PulseCount, 0, 8192);
        assert_eq!(c.speed, 0.0);
        assert!(c.faults.contains(FaultStatus::INCONSISTENT));
    }

    #[test]
    fn test_floor() {
        assert_eq!(LIMITS.floor(9.99), 0.0);
        assert_eq!(LIMITS.floor(-9.99), 0.0);
        assert_eq!(LIMITS.floor(10.0), 10.0);
        assert_eq!(LIMITS.floor(-42.0), -42.0);
    }
}
