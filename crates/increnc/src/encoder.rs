//! Incremental encoder estimator.
//!
//! [`IncrementalEncoder`] binds the tick source, the speed estimator, the
//! position integrator, the classifier and the speed filter into the two
//! entry points the rest of the system calls: the periodic
//! [`update`](IncrementalEncoder::update) and the interrupt-driven
//! [`on_zero_index_event`](IncrementalEncoder::on_zero_index_event).

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::calibration::Calibration;
use crate::classifier::{Direction, FaultStatus, SpeedLimits};
use crate::config::{EncoderConfig, ZeroMode, validate_cutoff, validate_update_period};
use crate::error::{EncoderError, EncoderResult};
use crate::filter::LowPassFilter;
use crate::position::PositionIntegrator;
use crate::sensor::{PositionSensor, SensorType};
use crate::source::{TickSource, reference_elapsed, valid_width};
use crate::speed::{SpeedMode, SpeedSample};
use crate::zero_index::{ZeroIndexHandle, ZeroIndexLatch, ZeroIndexStats};

/// Position, speed, direction, turn and fault estimator for a quadrature
/// encoder.
///
/// A value only exists once configuration succeeded, so `update` can never
/// run on an unconfigured estimator. The counter is armed on construction
/// and disarmed on drop.
///
/// # RT Safety
///
/// `update` and `on_zero_index_event` do not allocate, block or loop. The
/// state shared with the interrupt path is touched in one short critical
/// section per call.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use increnc::{Direction, EncoderConfig, IncrementalEncoder, SimulatedSource};
///
/// let source = Arc::new(SimulatedSource::default());
/// let mut encoder = IncrementalEncoder::new(EncoderConfig::default(), Arc::clone(&source))?;
///
/// source.step(4, 100);
/// encoder.update();
/// assert_eq!(encoder.raw_position(), 4);
/// assert_eq!(encoder.direction(), Direction::Forward);
/// # Ok::<(), increnc::EncoderError>(())
/// ```
#[derive(Debug)]
pub struct IncrementalEncoder<S: TickSource> {
    source: Arc<S>,
    latch: Arc<ZeroIndexLatch>,
    calibration: Calibration,
    limits: SpeedLimits,
    filter: Option<LowPassFilter>,
    position: PositionIntegrator,
    latched_turn: i32,
    speed: f32,
    speed_mode: SpeedMode,
    status: FaultStatus,
    last_edge: u32,
    reference_bits: u32,
    reversed: bool,
    period_per_rotation: u16,
}

impl<S: TickSource> IncrementalEncoder<S> {
    /// Validate `config`, derive the calibration and arm the counter.
    pub fn new(config: EncoderConfig, source: Arc<S>) -> EncoderResult<Self> {
        let calibration = Calibration::new(&config, source.reference_clock_hz())?;

        let counter_bits = source.counter_bits();
        if !valid_width(counter_bits) {
            return Err(EncoderError::invalid_source(format!(
                "counter width must be 2..=32 bits, got {counter_bits}"
            )));
        }
        let reference_bits = source.reference_bits();
        if !valid_width(reference_bits) {
            return Err(EncoderError::invalid_source(format!(
                "reference timer width must be 2..=32 bits, got {reference_bits}"
            )));
        }

        let filter = if config.speed_filter_enabled {
            Some(LowPassFilter::new(
                config.speed_filter_cutoff_frequency,
                config.update_period,
            )?)
        } else {
            None
        };

        source.set_counting(true);
        let latch = Arc::new(ZeroIndexLatch::new(
            config.zero_mode,
            counter_bits,
            source.counter(),
        ));
        let last_edge = source.edge_timestamp();

        debug!(
            "Incremental encoder configured: {} ticks/rotation, position_const={}, \
             speed_const_pulse_count={}, speed_const_time_diff={}, threshold={} ticks, zero_mode={:?}",
            calibration.ticks_per_rotation(),
            calibration.position_const(),
            calibration.speed_const_pulse_count(),
            calibration.speed_const_time_diff(),
            calibration.speed_mode_threshold_ticks(),
            config.zero_mode
        );

        Ok(Self {
            source,
            latch,
            calibration,
            limits: SpeedLimits {
                min_speed: config.min_speed,
                max_speed: config.max_speed,
            },
            filter,
            position: PositionIntegrator::new(config.offset),
            latched_turn: 0,
            speed: 0.0,
            speed_mode: SpeedMode::TimeDiff,
            status: FaultStatus::NO_FAULT,
            last_edge,
            reference_bits,
            reversed: config.reversed,
            period_per_rotation: config.period_per_rotation,
        })
    }

    /// Periodic step.
    ///
    /// Reads the counter and edge timestamp once, integrates the position,
    /// estimates the speed in the mode chosen by the previous output and
    /// latches any new fault.
    pub fn update(&mut self) {
        let mode = SpeedMode::select(self.speed, self.calibration.speed_mode_threshold());

        let latched = self.latch.latch(&*self.source, self.reversed);
        match latched.since_index {
            Some(ticks) => self.position.rebase(ticks),
            None => self.position.advance(latched.delta),
        }
        self.latched_turn = latched.turn;

        let edge = self.source.edge_timestamp();
        let elapsed = reference_elapsed(edge, self.last_edge, self.reference_bits);
        self.last_edge = edge;

        let sample = SpeedSample {
            tick_delta: latched.delta,
            elapsed_reference_ticks: elapsed,
        };
        let raw = mode.estimate(&sample, &self.calibration);
        let checked = self.limits.classify(
            raw,
            mode,
            latched.delta,
            self.calibration.ticks_per_rotation(),
        );

        let filtered = match self.filter.as_mut() {
            Some(filter) => filter.apply(checked.speed),
            None => checked.speed,
        };
        self.speed = self.limits.floor(filtered);
        self.speed_mode = mode;
        self.latch_faults(checked.faults, raw);
    }

    fn latch_faults(&mut self, faults: FaultStatus, raw_speed: f32) {
        let new = faults.difference(self.status);
        if !new.is_empty() {
            warn!(
                "Encoder fault latched: {} (raw speed {} rad/s, mode {:?})",
                new, raw_speed, self.speed_mode
            );
        }
        self.status |= faults;
    }

    /// Zero-index event. Safe to call from the index interrupt.
    #[inline]
    pub fn on_zero_index_event(&self) {
        self.latch.on_zero_index(&*self.source);
    }

    /// Handle for posting zero-index events without a borrow of the
    /// estimator.
    pub fn zero_index_handle(&self) -> ZeroIndexHandle<S> {
        ZeroIndexHandle::new(Arc::clone(&self.latch), Arc::clone(&self.source))
    }

    /// Mechanical speed in rad/s, filtered when the filter is enabled.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Mode used by the last update.
    pub fn speed_mode(&self) -> SpeedMode {
        self.speed_mode
    }

    /// Angle within the current rotation in `[0, 2π)`.
    pub fn position(&self) -> f32 {
        self.position.position(&self.calibration)
    }

    /// Angle in radians, continuous across rotations.
    ///
    /// With [`ZeroMode::CountTurns`] this is the raw position in radians. With
    /// [`ZeroMode::ResetCounter`] the first index re-bases it; from then on
    /// it is `turn × 2π` plus the angle since the index. Both parts come from
    /// the same update, so an index posted after it shows up at the next one.
    pub fn absolute_position(&self) -> f32 {
        self.position
            .absolute_position(self.latched_turn, &self.calibration)
    }

    /// Offset-corrected position in ticks. Not bounded to one rotation.
    pub fn raw_position(&self) -> i64 {
        self.position.raw_position()
    }

    /// Direction after the last non-zero tick delta.
    pub fn direction(&self) -> Direction {
        self.latch.direction()
    }

    /// Whole turns counted at the zero index.
    pub fn turn(&self) -> i32 {
        self.latch.turn()
    }

    /// Latched fault bits.
    pub fn fault(&self) -> FaultStatus {
        self.status
    }

    /// Zero-index event counters.
    pub fn zero_index_stats(&self) -> ZeroIndexStats {
        self.latch.stats()
    }

    /// Zero-index behavior.
    pub fn zero_mode(&self) -> ZeroMode {
        self.latch.zero_mode()
    }

    /// Derived constants.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// The injected tick source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Raw position offset in ticks.
    pub fn offset(&self) -> i32 {
        self.position.offset()
    }

    /// Replace the offset. The raw position moves by the difference at once.
    pub fn set_offset(&mut self, offset: i32) {
        debug!("Encoder offset {} -> {}", self.position.offset(), offset);
        self.position.set_offset(offset);
    }

    /// Period between two `update` calls in seconds.
    pub fn refresh_period(&self) -> f32 {
        self.calibration.update_period()
    }

    /// Change the update period, rescaling the pulse-count constant and the
    /// filter coefficients.
    ///
    /// Nothing changes when the period is rejected.
    pub fn set_refresh_period(&mut self, update_period: f32) -> EncoderResult<()> {
        validate_update_period(update_period)?;
        if let Some(filter) = self.filter.as_ref() {
            validate_cutoff(filter.cutoff_hz(), update_period)?;
        }
        if let Some(filter) = self.filter.as_mut() {
            filter.retime(update_period)?;
        }
        let previous = self.calibration.update_period();
        self.calibration.retime(update_period);
        info!(
            "Encoder refresh period {} s -> {} s (threshold {} ticks)",
            previous,
            update_period,
            self.calibration.speed_mode_threshold_ticks()
        );
        Ok(())
    }

    /// Ticks per mechanical rotation.
    pub fn resolution(&self) -> u32 {
        self.calibration.ticks_per_rotation()
    }

    /// Signal periods per mechanical rotation.
    pub fn period_per_rotation(&self) -> u16 {
        self.period_per_rotation
    }

    /// Always [`SensorType::Encoder`].
    pub fn sensor_type(&self) -> SensorType {
        SensorType::Encoder
    }

    /// Return to the power-on state.
    ///
    /// Requests a hardware counter reset and re-baselines on the reset
    /// counter and the current edge timestamp. The offset is kept.
    pub fn reset(&mut self) {
        self.latch.reset(&*self.source);
        self.last_edge = self.source.edge_timestamp();
        self.position.reset();
        self.latched_turn = 0;
        if let Some(filter) = self.filter.as_mut() {
            filter.reset();
        }
        self.speed = 0.0;
        self.speed_mode = SpeedMode::TimeDiff;
        self.status = FaultStatus::NO_FAULT;
        info!("Encoder reset");
    }

    /// Clear latched faults.
    pub fn reset_faults(&mut self) {
        if !self.status.is_ok() {
            debug!("Encoder faults cleared: {}", self.status);
        }
        self.status = FaultStatus::NO_FAULT;
    }
}

impl<S: TickSource> Drop for IncrementalEncoder<S> {
    fn drop(&mut self) {
        self.source.set_counting(false);
    }
}

impl<S: TickSource> PositionSensor for IncrementalEncoder<S> {
    fn update(&mut self) {
        IncrementalEncoder::update(self);
    }

    fn on_zero_index_event(&mut self) {
        IncrementalEncoder::on_zero_index_event(self);
    }

    fn speed(&self) -> f32 {
        IncrementalEncoder::speed(self)
    }

    fn position(&self) -> f32 {
        IncrementalEncoder::position(self)
    }

    fn absolute_position(&self) -> f32 {
        IncrementalEncoder::absolute_position(self)
    }

    fn raw_position(&self) -> i64 {
        IncrementalEncoder::raw_position(self)
    }

    fn direction(&self) -> Direction {
        IncrementalEncoder::direction(self)
    }

    fn turn(&self) -> i32 {
        IncrementalEncoder::turn(self)
    }

    fn fault(&self) -> FaultStatus {
        IncrementalEncoder::fault(self)
    }

    fn offset(&self) -> i32 {
        IncrementalEncoder::offset(self)
    }

    fn set_offset(&mut self, offset: i32) {
        IncrementalEncoder::set_offset(self, offset);
    }

    fn refresh_period(&self) -> f32 {
        IncrementalEncoder::refresh_period(self)
    }

    fn set_refresh_period(&mut self, update_period: f32) -> EncoderResult<()> {
        IncrementalEncoder::set_refresh_period(self, update_period)
    }

    fn resolution(&self) -> u32 {
        IncrementalEncoder::resolution(self)
    }

    fn period_per_rotation(&self) -> u16 {
        IncrementalEncoder::period_per_rotation(self)
    }

    fn sensor_type(&self) -> SensorType {
        IncrementalEncoder::sensor_type(self)
    }

    fn reset(&mut self) {
        IncrementalEncoder::reset(self);
    }

    fn reset_faults(&mut self) {
        IncrementalEncoder::reset_faults(self);
    }
}
