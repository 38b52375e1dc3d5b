//! Reference configurations and a simulated test rig.
//!
//! All fixtures use a 2048-line encoder with four-fold decoding (8192
//! ticks per rotation), a 100 µs update period and a 1 MHz reference clock
//! unless they say otherwise.

use std::sync::Arc;

use increnc::{
    EncoderConfig, EncoderResult, IncrementalEncoder, SimulatedSource, ZeroIndexHandle, ZeroMode,
};

use crate::must::must;

/// Reference timer frequency of every fixture source.
pub const REFERENCE_CLOCK_HZ: f32 = 1_000_000.0;

/// Reference timer ticks in one 100 µs update period.
pub const TICKS_PER_PERIOD: u32 = 100;

/// Canonical setup with the speed ceiling raised to 1000 rad/s so the
/// 82-tick reference sample (about 628.9 rad/s) stays in range.
pub fn reference_config() -> EncoderConfig {
    EncoderConfig::default().with_speed_limits(10.0, 1_000.0)
}

/// Pulse-count mode on every update: a zero threshold is always met.
pub fn pulse_count_config() -> EncoderConfig {
    EncoderConfig::default()
        .with_speed_mode_threshold(0.0)
        .with_speed_limits(0.0, 1_000_000.0)
}

/// Time-diff mode on every update: the threshold is out of reach of the
/// speed ceiling and there is no floor.
pub fn time_diff_config() -> EncoderConfig {
    EncoderConfig::default()
        .with_speed_mode_threshold(1.0e9)
        .with_speed_limits(0.0, 1_000_000.0)
}

/// Counter reset at the index.
pub fn reset_counter_config() -> EncoderConfig {
    reference_config().with_zero_mode(ZeroMode::ResetCounter)
}

/// The reference setup as JSON, as a configuration file would carry it.
pub fn reference_config_json() -> String {
    must(serde_json::to_string_pretty(&reference_config()))
}

/// Simulated source wired to an estimator.
///
/// ```rust
/// use increnc_test_helpers::fixtures::{EncoderRig, reference_config};
///
/// let mut rig = EncoderRig::new(reference_config());
/// rig.tick(4, 100);
/// assert_eq!(rig.encoder.raw_position(), 4);
/// ```
#[derive(Debug)]
pub struct EncoderRig {
    /// Source shared with the estimator.
    pub source: Arc<SimulatedSource>,
    /// Estimator under test.
    pub encoder: IncrementalEncoder<SimulatedSource>,
}

impl EncoderRig {
    /// Build a rig, panicking if `config` is rejected.
    #[track_caller]
    pub fn new(config: EncoderConfig) -> Self {
        must(Self::try_new(config))
    }

    /// Build a rig.
    pub fn try_new(config: EncoderConfig) -> EncoderResult<Self> {
        Self::with_source(config, SimulatedSource::new(REFERENCE_CLOCK_HZ))
    }

    /// Build a rig around a custom source.
    pub fn with_source(config: EncoderConfig, source: SimulatedSource) -> EncoderResult<Self> {
        let source = Arc::new(source);
        let encoder = IncrementalEncoder::new(config, Arc::clone(&source))?;
        Ok(Self { source, encoder })
    }

    /// Move `ticks`, latch the edge of the last one `elapsed` reference
    /// ticks after the previously latched edge and run one update. Returns
    /// the new speed.
    ///
    /// Constant motion latches one edge per period:
    /// `tick(n, TICKS_PER_PERIOD)`.
    pub fn tick(&mut self, ticks: i32, elapsed: u32) -> f32 {
        self.source.step(ticks, elapsed);
        self.encoder.update();
        self.encoder.speed()
    }

    /// Move `ticks` over one update period without latching a new edge.
    pub fn count(&mut self, ticks: i32) -> f32 {
        self.source.advance(ticks);
        self.encoder.update();
        self.encoder.speed()
    }

    /// Run `updates` updates with the shaft standing still.
    pub fn hold(&mut self, updates: usize) {
        for _ in 0..updates {
            self.encoder.update();
        }
    }

    /// Turn at a constant `ticks` per update period, latching one edge per
    /// period, until the estimator has selected pulse-count mode for the
    /// next update or `max_updates` ran out.
    ///
    /// Returns the number of updates it took.
    pub fn spin_up(&mut self, ticks: i32, max_updates: usize) -> Option<usize> {
        let threshold = self.encoder.calibration().speed_mode_threshold();
        for n in 1..=max_updates {
            self.tick(ticks, TICKS_PER_PERIOD);
            if self.encoder.speed().abs() >= threshold {
                return Some(n);
            }
        }
        None
    }

    /// Post one zero-index event.
    pub fn zero_index(&self) {
        self.encoder.on_zero_index_event();
    }

    /// Handle for posting zero-index events from another thread.
    pub fn zero_index_handle(&self) -> ZeroIndexHandle<SimulatedSource> {
        self.encoder.zero_index_handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_configs_are_valid() {
        for config in [
            reference_config(),
            pulse_count_config(),
            time_diff_config(),
            reset_counter_config(),
        ] {
            must(config.validate());
        }
    }

    #[test]
    fn test_reference_json_parses_back() {
        let parsed = must(EncoderConfig::from_json(&reference_config_json()));
        assert_eq!(parsed, reference_config());
    }

    #[test]
    fn test_spin_up_reaches_pulse_count() {
        let mut rig = EncoderRig::new(reference_config());
        let updates = rig.spin_up(82, 10);
        assert_eq!(updates, Some(1));
    }

    #[test]
    fn test_rig_tracks_ticks() {
        let mut rig = EncoderRig::new(reference_config());
        rig.tick(5, TICKS_PER_PERIOD);
        rig.count(-2);
        rig.hold(3);
        assert_eq!(rig.encoder.raw_position(), 3);
        assert_eq!(rig.source.arm_requests(), 1);
    }
}
