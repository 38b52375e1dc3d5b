//! Dual-mode speed estimation.
//!
//! High speeds are measured by counting ticks over one fixed update period;
//! low speeds by timing the ticks counted between the edges latched at two
//! consecutive updates. The mode for an update is chosen from the previous
//! output only, so exactly one estimator runs per call.

use serde::{Deserialize, Serialize};

use crate::calibration::Calibration;

/// Speed estimation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedMode {
    /// Tick delta over one update period. Fine tick resolution.
    PulseCount,
    /// Reference timer ticks between edges. Fine time resolution.
    #[default]
    TimeDiff,
}

/// Raw inputs of one estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedSample {
    /// Oriented tick delta since the previous update.
    pub tick_delta: i32,
    /// Reference timer ticks between the edges latched at the previous and
    /// the current update.
    pub elapsed_reference_ticks: u32,
}

impl SpeedMode {
    /// Mode for the next update given the previous speed output.
    ///
    /// No hysteresis: the comparison is `|previous| >= threshold`.
    #[inline]
    pub fn select(previous_speed: f32, threshold: f32) -> Self {
        if previous_speed.abs() >= threshold {
            SpeedMode::PulseCount
        } else {
            SpeedMode::TimeDiff
        }
    }

    /// Raw speed estimate in rad/s.
    #[inline]
    pub fn estimate(self, sample: &SpeedSample, calibration: &Calibration) -> f32 {
        match self {
            SpeedMode::PulseCount => pulse_count(sample.tick_delta, calibration),
            SpeedMode::TimeDiff => {
                time_diff(sample.tick_delta, sample.elapsed_reference_ticks, calibration)
            }
        }
    }
}

/// `delta × speed_const_pulse_count`.
#[inline]
pub fn pulse_count(tick_delta: i32, calibration: &Calibration) -> f32 {
    tick_delta as f32 * calibration.speed_const_pulse_count()
}

/// `speed_const_time_diff × delta / elapsed`.
///
/// `delta` is the number of ticks counted between the two latched edges, so
/// a single tick reduces to `±speed_const_time_diff / elapsed`. Without a
/// new edge (`elapsed == 0`) or without ticks the result is 0.
#[inline]
pub fn time_diff(tick_delta: i32, elapsed_reference_ticks: u32, calibration: &Calibration) -> f32 {
    if elapsed_reference_ticks == 0 || tick_delta == 0 {
        return 0.0;
    }
    calibration.speed_const_time_diff() * tick_delta as f32 / elapsed_reference_ticks as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncoderConfig;

    fn calibration() -> Calibration {
        match Calibration::new(&EncoderConfig::default(), 1_000_000.0) {
            Ok(c) => c,
            Err(e) => panic!("calibration failed: {e}"),
        }
    }

    #[test]
    fn test_select_threshold_is_inclusive() {
        assert_eq!(SpeedMode::select(200.0, 200.0), SpeedMode::PulseCount);
        assert_eq!(SpeedMode::select(-200.0, 200.0), SpeedMode::PulseCount);
        assert_eq!(SpeedMode::select(199.99, 200.0), SpeedMode::TimeDiff);
        assert_eq!(SpeedMode::select(0.0, 200.0), SpeedMode::TimeDiff);
    }

    #[test]
    fn test_pulse_count_reference_scenario() {
        let c = calibration();
        let speed = pulse_count(82, &c);
        // 82 / (8192 * 100 us) * 2π
        assert!((speed - 628.92).abs() < 0.05, "speed = {speed}");
        assert_eq!(speed, 82.0 * c.speed_const_pulse_count());
    }

    #[test]
    fn test_time_diff_zero_elapsed_is_zero() {
        let c = calibration();
        assert_eq!(time_diff(1, 0, &c), 0.0);
        assert_eq!(time_diff(-40, 0, &c), 0.0);
        assert_eq!(time_diff(0, 250, &c), 0.0);
    }

    #[test]
    fn test_time_diff_single_tick() {
        let c = calibration();
        let forward = time_diff(1, 1_000, &c);
        assert_eq!(forward, c.speed_const_time_diff() / 1_000.0);
        assert_eq!(time_diff(-1, 1_000, &c), -forward);
    }

    #[test]
    fn test_time_diff_scales_with_ticks_between_edges() {
        let c = calibration();
        // 13 ticks in 100 us at 8192 ticks/rotation
        let speed = time_diff(13, 100, &c);
        assert!((speed - 99.71).abs() < 0.01, "speed = {speed}");

        // Same shaft speed as pulse counting would see over one period
        let pulse = pulse_count(82, &c);
        let timed = time_diff(82, 100, &c);
        assert!((pulse - timed).abs() < 1e-2, "{pulse} vs {timed}");
        assert!(time_diff(-82, 100, &c) < 0.0);
    }

    #[test]
    fn test_estimate_dispatches_on_mode() {
        let c = calibration();
        let sample = SpeedSample {
            tick_delta: -3,
            elapsed_reference_ticks: 500,
        };
        assert_eq!(
            SpeedMode::PulseCount.estimate(&sample, &c),
            pulse_count(-3, &c)
        );
        assert_eq!(
            SpeedMode::TimeDiff.estimate(&sample, &c),
            time_diff(-3, 500, &c)
        );
    }
}
