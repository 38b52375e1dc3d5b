//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use increnc_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_err};

#[cfg(feature = "tracking")]
pub use crate::tracking::{AllocationGuard, TrackingAllocator, track};

#[cfg(feature = "fixtures")]
pub use crate::fixtures::{
    EncoderRig, REFERENCE_CLOCK_HZ, TICKS_PER_PERIOD, pulse_count_config, reference_config,
    reference_config_json, reset_counter_config, time_diff_config,
};

pub use crate::{assert_approx_eq, assert_in_rotation};

#[cfg(feature = "tracking")]
pub use crate::assert_rt_safe;
