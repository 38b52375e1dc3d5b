//! Zero-index handling.
//!
//! The index interrupt and the periodic update share a handful of fields:
//! the turn count, the counter baseline, the direction and the ticks carried
//! across a counter reset. They live in a [`critical_section::Mutex`] and
//! every access is one short critical section. Nothing else of the
//! estimator is reachable from interrupt context.

use core::cell::Cell;
use std::sync::Arc;

use critical_section::Mutex;

use crate::classifier::Direction;
use crate::config::ZeroMode;
use crate::source::{TickSource, counter_delta};

/// Counts of zero-index events seen since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZeroIndexStats {
    /// Events that moved the turn count.
    pub accepted: u32,
    /// Events received while the direction was unknown.
    pub dropped: u32,
}

impl ZeroIndexStats {
    /// All events received.
    pub fn total(&self) -> u32 {
        self.accepted.wrapping_add(self.dropped)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Shared {
    baseline: i32,
    carry: i32,
    rebased: bool,
    turn: i32,
    direction: Direction,
    stats: ZeroIndexStats,
}

/// Result of latching the counter for one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LatchedDelta {
    /// Oriented ticks since the previous update.
    pub delta: i32,
    /// Oriented ticks since the last counter reset at the index, if one
    /// happened since the previous update.
    pub since_index: Option<i32>,
    /// Direction after this delta.
    pub direction: Direction,
    /// Turn count at the moment of the latch.
    pub turn: i32,
}

/// State shared between [`update`](crate::IncrementalEncoder::update) and
/// the zero-index handler.
pub struct ZeroIndexLatch {
    shared: Mutex<Cell<Shared>>,
    zero_mode: ZeroMode,
    counter_bits: u32,
}

impl ZeroIndexLatch {
    pub(crate) fn new(zero_mode: ZeroMode, counter_bits: u32, baseline: i32) -> Self {
        Self {
            shared: Mutex::new(Cell::new(Shared {
                baseline,
                ..Shared::default()
            })),
            zero_mode,
            counter_bits,
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Shared) -> R) -> R {
        critical_section::with(|cs| {
            let cell = self.shared.borrow(cs);
            let mut shared = cell.get();
            let out = f(&mut shared);
            cell.set(shared);
            out
        })
    }

    /// Read the counter and move the baseline to it.
    ///
    /// The read and the baseline store happen in one critical section so an
    /// index reset can never land between them.
    pub(crate) fn latch<S: TickSource + ?Sized>(&self, source: &S, reversed: bool) -> LatchedDelta {
        let bits = self.counter_bits;
        self.with(|s| {
            let counter = source.counter();
            let carry = s.carry;
            let raw = counter_delta(counter, s.baseline, bits).wrapping_add(carry);
            let since_index = s.rebased.then(|| raw.wrapping_sub(carry));
            s.baseline = counter;
            s.carry = 0;
            s.rebased = false;

            let orient = |ticks: i32| if reversed { ticks.wrapping_neg() } else { ticks };
            let delta = orient(raw);
            s.direction = Direction::from_delta(delta, s.direction);

            LatchedDelta {
                delta,
                since_index: since_index.map(orient),
                direction: s.direction,
                turn: s.turn,
            }
        })
    }

    /// Apply one zero-index event.
    ///
    /// Moves the turn count by one in the current direction. With
    /// [`ZeroMode::ResetCounter`] the hardware counter is also reset and the
    /// ticks counted up to the index are carried into the next update.
    pub fn on_zero_index<S: TickSource + ?Sized>(&self, source: &S) {
        let bits = self.counter_bits;
        let zero_mode = self.zero_mode;
        self.with(|s| {
            match s.direction {
                Direction::Forward => {
                    s.turn = s.turn.wrapping_add(1);
                    s.stats.accepted = s.stats.accepted.wrapping_add(1);
                }
                Direction::Backward => {
                    s.turn = s.turn.wrapping_sub(1);
                    s.stats.accepted = s.stats.accepted.wrapping_add(1);
                }
                Direction::Unknown => {
                    s.stats.dropped = s.stats.dropped.wrapping_add(1);
                }
            }

            if zero_mode == ZeroMode::ResetCounter {
                let before = source.counter();
                source.reset_counter();
                let after = source.counter();
                s.carry = s
                    .carry
                    .wrapping_add(counter_delta(before, s.baseline, bits));
                s.baseline = after;
                s.rebased = true;
            }
        });
    }

    /// Request a counter reset and clear every shared field.
    pub(crate) fn reset<S: TickSource + ?Sized>(&self, source: &S) {
        self.with(|s| {
            source.reset_counter();
            *s = Shared {
                baseline: source.counter(),
                ..Shared::default()
            };
        });
    }

    /// Whole turns counted.
    pub fn turn(&self) -> i32 {
        self.with(|s| s.turn)
    }

    /// Direction published by the last update.
    pub fn direction(&self) -> Direction {
        self.with(|s| s.direction)
    }

    /// Event counters.
    pub fn stats(&self) -> ZeroIndexStats {
        self.with(|s| s.stats)
    }

    /// Zero-index behavior.
    pub fn zero_mode(&self) -> ZeroMode {
        self.zero_mode
    }
}

impl core::fmt::Debug for ZeroIndexLatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let shared = self.with(|s| *s);
        f.debug_struct("ZeroIndexLatch")
            .field("zero_mode", &self.zero_mode)
            .field("counter_bits", &self.counter_bits)
            .field("shared", &shared)
            .finish()
    }
}

/// Cloneable handle for posting zero-index events from interrupt context.
///
/// Holds the shared latch and the tick source, never the estimator, so the
/// interrupt handler does not need a borrow of it.
///
/// ```
/// use std::sync::Arc;
/// use increnc::{EncoderConfig, IncrementalEncoder, SimulatedSource};
///
/// let source = Arc::new(SimulatedSource::default());
/// let mut encoder = IncrementalEncoder::new(EncoderConfig::default(), Arc::clone(&source))?;
/// let handle = encoder.zero_index_handle();
///
/// source.step(10, 1_000);
/// encoder.update();
/// handle.post();
/// assert_eq!(encoder.turn(), 1);
/// # Ok::<(), increnc::EncoderError>(())
/// ```
pub struct ZeroIndexHandle<S: TickSource> {
    latch: Arc<ZeroIndexLatch>,
    source: Arc<S>,
}

impl<S: TickSource> ZeroIndexHandle<S> {
    pub(crate) fn new(latch: Arc<ZeroIndexLatch>, source: Arc<S>) -> Self {
        Self { latch, source }
    }

    /// Post one zero-index event.
    #[inline]
    pub fn post(&self) {
        self.latch.on_zero_index(&*self.source);
    }

    /// Event counters.
    pub fn stats(&self) -> ZeroIndexStats {
        self.latch.stats()
    }
}

impl<S: TickSource> Clone for ZeroIndexHandle<S> {
    fn clone(&self) -> Self {
        Self {
            latch: Arc::clone(&self.latch),
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: TickSource> core::fmt::Debug for ZeroIndexHandle<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ZeroIndexHandle")
            .field("latch", &self.latch)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedSource;

    #[test]
    fn test_latch_tracks_direction_and_holds_on_zero() {
        let source = SimulatedSource::default();
        let latch = ZeroIndexLatch::new(ZeroMode::CountTurns, 32, 0);

        source.advance(5);
        let d = latch.latch(&source, false);
        assert_eq!(d.delta, 5);
        assert_eq!(d.direction, Direction::Forward);
        assert_eq!(d.since_index, None);

        let d = latch.latch(&source, false);
        assert_eq!(d.delta, 0);
        assert_eq!(d.direction, Direction::Forward);

        source.advance(-2);
        let d = latch.latch(&source, false);
        assert_eq!(d.delta, -2);
        assert_eq!(latch.direction(), Direction::Backward);
    }

    #[test]
    fn test_reversed_negates_delta() {
        let source = SimulatedSource::default();
        let latch = ZeroIndexLatch::new(ZeroMode::CountTurns, 32, 0);
        source.advance(5);
        let d = latch.latch(&source, true);
        assert_eq!(d.delta, -5);
        assert_eq!(d.direction, Direction::Backward);
    }

    #[test]
    fn test_turn_follows_direction() {
        let source = SimulatedSource::default();
        let latch = ZeroIndexLatch::new(ZeroMode::CountTurns, 32, 0);

        latch.on_zero_index(&source);
        assert_eq!(latch.turn(), 0);
        assert_eq!(latch.stats(), ZeroIndexStats { accepted: 0, dropped: 1 });

        source.advance(1);
        latch.latch(&source, false);
        latch.on_zero_index(&source);
        latch.on_zero_index(&source);
        assert_eq!(latch.turn(), 2);

        source.advance(-1);
        latch.latch(&source, false);
        latch.on_zero_index(&source);
        assert_eq!(latch.turn(), 1);
        assert_eq!(latch.stats().total(), 4);
        assert_eq!(source.counter_resets(), 0);
    }

    #[test]
    fn test_reset_counter_carries_ticks_to_next_update() {
        let source = SimulatedSource::default();
        let latch = ZeroIndexLatch::new(ZeroMode::ResetCounter, 32, 0);

        source.advance(100);
        latch.latch(&source, false);

        // 30 ticks up to the index, 12 after it
        source.advance(30);
        latch.on_zero_index(&source);
        source.advance(12);

        let d = latch.latch(&source, false);
        assert_eq!(d.delta, 42);
        assert_eq!(d.since_index, Some(12));
        assert_eq!(d.turn, 1);
        assert_eq!(latch.turn(), 1);
        assert_eq!(source.counter_resets(), 1);

        source.advance(3);
        let d = latch.latch(&source, false);
        assert_eq!(d.delta, 3);
        assert_eq!(d.since_index, None);
    }

    #[test]
    fn test_reset_clears_shared_state() {
        let source = SimulatedSource::default();
        let latch = ZeroIndexLatch::new(ZeroMode::CountTurns, 32, 0);
        source.advance(9);
        latch.latch(&source, false);
        latch.on_zero_index(&source);

        latch.reset(&source);
        assert_eq!(latch.turn(), 0);
        assert_eq!(latch.direction(), Direction::Unknown);
        assert_eq!(latch.stats(), ZeroIndexStats::default());
        assert_eq!(source.counter_resets(), 1);
        assert_eq!(latch.latch(&source, false).delta, 0);
    }
}
