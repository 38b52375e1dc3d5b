//! Incremental (quadrature) encoder estimator
//!
//! This crate turns the raw counter and edge-timestamp readings of a
//! quadrature decoder peripheral into mechanical position, speed, direction,
//! turn count and fault status.
//!
//! # Overview
//!
//! - **Speed**: pulse-count estimate at high speed, time-diff estimate at
//!   low speed, selected from the previous output
//! - **Position**: offset-corrected tick accumulator folded into one rotation
//! - **Classification**: direction from the tick delta, latched fault bits
//! - **Filter**: optional single-pole low-pass on the speed
//! - **Zero index**: turn counting from interrupt context, optionally
//!   resetting the hardware counter
//!
//! The timer peripheral is injected through [`TickSource`]; consumers that
//! only need a rotary sensor use [`PositionSensor`].
//!
//! # RT Safety Guarantees
//!
//! - No heap allocations in `update` or the zero-index handler
//! - O(1) time complexity, no loops or waits
//! - State shared with the interrupt path is guarded by a short critical
//!   section, never the whole update
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use increnc::prelude::*;
//!
//! let source = Arc::new(SimulatedSource::default());
//! let config = EncoderConfig::default().with_speed_mode_threshold(0.0);
//! let mut encoder = IncrementalEncoder::new(config, Arc::clone(&source))?;
//!
//! // In the periodic task:
//! source.step(26, 100);
//! encoder.update();
//! assert_eq!(encoder.speed_mode(), SpeedMode::PulseCount);
//! assert!(encoder.fault().is_ok());
//! # Ok::<(), EncoderError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod calibration;
pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod filter;
pub mod position;
pub mod prelude;
pub mod sensor;
pub mod sim;
pub mod source;
pub mod speed;
pub mod zero_index;

pub use calibration::Calibration;
pub use classifier::{Classification, Direction, FaultStatus, SpeedLimits};
pub use config::{EncoderConfig, ResolutionFactor, ZeroMode};
pub use encoder::IncrementalEncoder;
pub use error::{EncoderError, EncoderResult};
pub use filter::LowPassFilter;
pub use position::PositionIntegrator;
pub use sensor::{PositionSensor, SensorType};
pub use sim::SimulatedSource;
pub use source::{TickSource, counter_delta, reference_elapsed};
pub use speed::{SpeedMode, SpeedSample};
pub use zero_index::{ZeroIndexHandle, ZeroIndexLatch, ZeroIndexStats};
