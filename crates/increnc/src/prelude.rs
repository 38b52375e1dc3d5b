//! Prelude for the encoder crate.
//!
//! ```
//! use increnc::prelude::*;
//!
//! let config = EncoderConfig::default().with_resolution(1024, ResolutionFactor::TwoFold);
//! assert_eq!(config.ticks_per_rotation(), Some(2048));
//! ```

pub use crate::calibration::Calibration;
pub use crate::classifier::{Direction, FaultStatus};
pub use crate::config::{EncoderConfig, ResolutionFactor, ZeroMode};
pub use crate::encoder::IncrementalEncoder;
pub use crate::error::{EncoderError, EncoderResult};
pub use crate::sensor::{PositionSensor, SensorType};
pub use crate::sim::SimulatedSource;
pub use crate::source::TickSource;
pub use crate::speed::SpeedMode;
pub use crate::zero_index::{ZeroIndexHandle, ZeroIndexStats};
