//! Raw sample source capability.
//!
//! The estimator never touches timer registers. Whatever owns the counter
//! peripheral implements [`TickSource`] and hands it over at construction.
//! All methods take `&self`: register reads are shared accesses, and the
//! zero-index handler needs the source from interrupt context while the
//! periodic path holds it too.

/// Raw tick counter, edge timestamp capture and their control requests.
pub trait TickSource: Send + Sync {
    /// Current hardware counter value.
    ///
    /// Only the low [`counter_bits`](Self::counter_bits) bits are
    /// significant; the counter is expected to wrap at that width.
    fn counter(&self) -> i32;

    /// Width of the hardware counter in bits (2..=32).
    fn counter_bits(&self) -> u32 {
        32
    }

    /// Reference timer value latched on the most recent counted edge.
    fn edge_timestamp(&self) -> u32;

    /// Width of the reference timer in bits (2..=32).
    fn reference_bits(&self) -> u32 {
        32
    }

    /// Reference timer frequency in Hz.
    fn reference_clock_hz(&self) -> f32;

    /// Request the hardware counter to be set back to zero.
    fn reset_counter(&self);

    /// Arm (`true`) or disarm (`false`) the counter.
    fn set_counting(&self, enabled: bool);
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn counter(&self) -> i32 {
        (**self).counter()
    }

    fn counter_bits(&self) -> u32 {
        (**self).counter_bits()
    }

    fn edge_timestamp(&self) -> u32 {
        (**self).edge_timestamp()
    }

    fn reference_bits(&self) -> u32 {
        (**self).reference_bits()
    }

    fn reference_clock_hz(&self) -> f32 {
        (**self).reference_clock_hz()
    }

    fn reset_counter(&self) {
        (**self).reset_counter();
    }

    fn set_counting(&self, enabled: bool) {
        (**self).set_counting(enabled);
    }
}

/// Signed distance from `previous` to `current` on a counter `bits` wide.
///
/// The result is sign-extended from the counter width, so a 16-bit counter
/// stepping from `0xFFFF` to `0x0000` yields `+1`.
#[inline]
pub fn counter_delta(current: i32, previous: i32, bits: u32) -> i32 {
    let diff = current.wrapping_sub(previous);
    if bits >= 32 {
        return diff;
    }
    let shift = 32 - bits;
    diff.wrapping_shl(shift).wrapping_shr(shift)
}

/// Elapsed ticks from `previous` to `current` on a timer `bits` wide.
#[inline]
pub fn reference_elapsed(current: u32, previous: u32, bits: u32) -> u32 {
    let diff = current.wrapping_sub(previous);
    if bits >= 32 {
        diff
    } else {
        diff & ((1u32 << bits) - 1)
    }
}

pub(crate) fn valid_width(bits: u32) -> bool {
    (2..=32).contains(&bits)
}
