//! Estimator configuration.
//!
//! [`EncoderConfig`] carries everything the estimator needs that is not a
//! property of the tick source itself. It is validated once at construction;
//! the derived constants live in [`Calibration`](crate::Calibration).

use serde::{Deserialize, Serialize};

use crate::error::{EncoderError, EncoderResult};

/// Number of countable edges derived per encoder signal period line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionFactor {
    /// Both edges of one channel are counted.
    TwoFold,
    /// Both edges of both channels are counted.
    #[default]
    FourFold,
}

impl ResolutionFactor {
    /// Edge multiplier applied to the line resolution.
    pub fn multiplier(self) -> u32 {
        match self {
            ResolutionFactor::TwoFold => 2,
            ResolutionFactor::FourFold => 4,
        }
    }
}

/// What the zero-index handler does besides counting turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroMode {
    /// Count turns only; the hardware counter keeps running.
    #[default]
    CountTurns,
    /// Count turns and reset the hardware counter at the index, re-basing
    /// the position so that the index is angle zero.
    ResetCounter,
}

/// Incremental encoder configuration.
///
/// # Example
///
/// ```
/// use increnc::{EncoderConfig, ResolutionFactor};
///
/// let config = EncoderConfig::default()
///     .with_resolution(1024, ResolutionFactor::TwoFold)
///     .with_speed_limits(5.0, 800.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Raw position offset in ticks.
    pub offset: i32,
    /// Invert the counting direction.
    pub reversed: bool,
    /// Encoder lines per signal period, before edge multiplication.
    pub resolution: i32,
    /// Signal periods per mechanical rotation.
    pub period_per_rotation: u16,
    /// Edge multiplication.
    pub resolution_factor: ResolutionFactor,
    /// Period between two `update` calls, in seconds.
    pub update_period: f32,
    /// Speed in rad/s at or above which pulse-count mode is used.
    pub speed_mode_threshold: f32,
    /// Speeds below this magnitude (rad/s) read as exactly 0.
    pub min_speed: f32,
    /// Speeds above this magnitude (rad/s) are a fault.
    pub max_speed: f32,
    /// Enable the single-pole speed filter.
    pub speed_filter_enabled: bool,
    /// Speed filter cutoff in Hz.
    pub speed_filter_cutoff_frequency: f32,
    /// Zero-index behavior.
    pub zero_mode: ZeroMode,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            offset: 0,
            reversed: false,
            resolution: 2048,
            period_per_rotation: 1,
            resolution_factor: ResolutionFactor::FourFold,
            update_period: 100e-6,
            speed_mode_threshold: 200.0,
            min_speed: 10.0,
            max_speed: 500.0,
            speed_filter_enabled: false,
            speed_filter_cutoff_frequency: 250.0,
            zero_mode: ZeroMode::CountTurns,
        }
    }
}

impl EncoderConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// The parsed configuration is validated before it is returned.
    pub fn from_json(text: &str) -> EncoderResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set line resolution and edge multiplication.
    pub fn with_resolution(mut self, resolution: i32, factor: ResolutionFactor) -> Self {
        self.resolution = resolution;
        self.resolution_factor = factor;
        self
    }

    /// Set the update period in seconds.
    pub fn with_update_period(mut self, update_period: f32) -> Self {
        self.update_period = update_period;
        self
    }

    /// Set the plausible speed range in rad/s.
    pub fn with_speed_limits(mut self, min_speed: f32, max_speed: f32) -> Self {
        self.min_speed = min_speed;
        self.max_speed = max_speed;
        self
    }

    /// Set the pulse-count / time-diff switching threshold in rad/s.
    pub fn with_speed_mode_threshold(mut self, threshold: f32) -> Self {
        self.speed_mode_threshold = threshold;
        self
    }

    /// Enable the speed filter with the given cutoff in Hz.
    pub fn with_speed_filter(mut self, cutoff_hz: f32) -> Self {
        self.speed_filter_enabled = true;
        self.speed_filter_cutoff_frequency = cutoff_hz;
        self
    }

    /// Set the raw position offset in ticks.
    pub fn with_offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }

    /// Invert the counting direction.
    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    /// Select the zero-index behavior.
    pub fn with_zero_mode(mut self, zero_mode: ZeroMode) -> Self {
        self.zero_mode = zero_mode;
        self
    }

    /// Set the number of signal periods per mechanical rotation.
    pub fn with_period_per_rotation(mut self, periods: u16) -> Self {
        self.period_per_rotation = periods;
        self
    }

    /// Ticks per mechanical rotation, if it fits the counter arithmetic.
    pub fn ticks_per_rotation(&self) -> Option<u32> {
        let lines = u32::try_from(self.resolution).ok()?;
        lines
            .checked_mul(self.resolution_factor.multiplier())?
            .checked_mul(u32::from(self.period_per_rotation))
            .filter(|ticks| *ticks > 0 && *ticks <= i32::MAX as u32)
    }

    /// Validate every field.
    pub fn validate(&self) -> EncoderResult<()> {
        if self.resolution <= 0 {
            return Err(EncoderError::invalid_config(
                "resolution",
                "must be greater than 0",
            ));
        }
        if self.period_per_rotation == 0 {
            return Err(EncoderError::invalid_config(
                "period_per_rotation",
                "must be greater than 0",
            ));
        }
        if self.ticks_per_rotation().is_none() {
            return Err(EncoderError::invalid_config(
                "resolution",
                "ticks per rotation overflow the counter range",
            ));
        }
        validate_update_period(self.update_period)?;
        for (field, value) in [
            ("speed_mode_threshold", self.speed_mode_threshold),
            ("min_speed", self.min_speed),
            ("max_speed", self.max_speed),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EncoderError::invalid_config(
                    field,
                    "must be finite and not negative",
                ));
            }
        }
        if self.min_speed >= self.max_speed {
            return Err(EncoderError::invalid_config(
                "min_speed",
                format!(
                    "must be below max_speed ({} >= {})",
                    self.min_speed, self.max_speed
                ),
            ));
        }
        if self.speed_filter_enabled {
            validate_cutoff(self.speed_filter_cutoff_frequency, self.update_period)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_update_period(update_period: f32) -> EncoderResult<()> {
    if !update_period.is_finite() || update_period <= 0.0 {
        return Err(EncoderError::invalid_config(
            "update_period",
            "must be finite and greater than 0",
        ));
    }
    Ok(())
}

pub(crate) fn validate_cutoff(cutoff_hz: f32, update_period: f32) -> EncoderResult<()> {
    if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 {
        return Err(EncoderError::invalid_config(
            "speed_filter_cutoff_frequency",
            "must be finite and greater than 0",
        ));
    }
    let nyquist = 0.5 / update_period;
    if cutoff_hz >= nyquist {
        return Err(EncoderError::invalid_config(
            "speed_filter_cutoff_frequency",
            format!("must be below the Nyquist frequency {nyquist} Hz"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EncoderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ticks_per_rotation(), Some(8192));
    }

    #[test]
    fn test_rejects_non_positive_resolution() {
        for resolution in [0, -1, -2048] {
            let config = EncoderConfig::default().with_resolution(resolution, ResolutionFactor::FourFold);
            let err = config.validate().err();
            assert_eq!(err.and_then(|e| e.field()), Some("resolution"));
        }
    }

    #[test]
    fn test_rejects_inverted_speed_limits() {
        let config = EncoderConfig::default().with_speed_limits(500.0, 500.0);
        assert_eq!(config.validate().err().and_then(|e| e.field()), Some("min_speed"));

        let config = EncoderConfig::default().with_speed_limits(600.0, 500.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_update_period() {
        for period in [0.0, -1e-4, f32::NAN, f32::INFINITY] {
            let config = EncoderConfig::default().with_update_period(period);
            assert_eq!(
                config.validate().err().and_then(|e| e.field()),
                Some("update_period")
            );
        }
    }

    #[test]
    fn test_filter_cutoff_must_be_below_nyquist() {
        // 100 us period -> 5 kHz Nyquist
        let ok = EncoderConfig::default().with_speed_filter(4_999.0);
        assert!(ok.validate().is_ok());

        let at_nyquist = EncoderConfig::default().with_speed_filter(5_000.0);
        assert_eq!(
            at_nyquist.validate().err().and_then(|e| e.field()),
            Some("speed_filter_cutoff_frequency")
        );

        let zero = EncoderConfig::default().with_speed_filter(0.0);
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_disabled_filter_cutoff_is_not_checked() {
        let mut config = EncoderConfig::default();
        config.speed_filter_cutoff_frequency = -1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_period_per_rotation_scales_ticks() {
        let config = EncoderConfig::default()
            .with_resolution(512, ResolutionFactor::TwoFold)
            .with_period_per_rotation(4);
        assert_eq!(config.ticks_per_rotation(), Some(4096));

        let zero = EncoderConfig::default().with_period_per_rotation(0);
        assert_eq!(
            zero.validate().err().and_then(|e| e.field()),
            Some("period_per_rotation")
        );
    }

    #[test]
    fn test_ticks_per_rotation_overflow() {
        let config = EncoderConfig::default()
            .with_resolution(i32::MAX, ResolutionFactor::FourFold);
        assert_eq!(config.ticks_per_rotation(), None);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_partial_uses_defaults() {
        let config = EncoderConfig::from_json(
            r#"{ "resolution": 1000, "resolution_factor": "two_fold", "zero_mode": "reset_counter" }"#,
        );
        let Ok(config) = config else {
            panic!("valid JSON must parse: {config:?}");
        };
        assert_eq!(config.resolution, 1000);
        assert_eq!(config.resolution_factor, ResolutionFactor::TwoFold);
        assert_eq!(config.zero_mode, ZeroMode::ResetCounter);
        assert_eq!(config.max_speed, 500.0);
    }

    #[test]
    fn test_from_json_validates() {
        let err = EncoderConfig::from_json(r#"{ "min_speed": 900.0 }"#).err();
        assert_eq!(err.and_then(|e| e.field()), Some("min_speed"));

        let err = EncoderConfig::from_json("{ resolution: }").err();
        assert!(matches!(err, Some(EncoderError::Parse(_))));
    }
}
