//! Shared test utilities for the encoder estimator.
//!
//! # Modules
//!
//! - [`mod@must`] - `must` and `must_err` panicking unwraps
//! - [`assertions`] - Float assertion macros
//! - [`tracking`] - Allocation counting for the real-time paths
//! - [`fixtures`] - Reference configurations and a simulated test rig
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! increnc-test-helpers = { path = "../increnc-test-helpers" }
//! ```
//!
//! ```rust,ignore
//! use increnc_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod assertions;
pub mod must;
pub mod prelude;

#[cfg(feature = "tracking")]
#[cfg_attr(docsrs, doc(cfg(feature = "tracking")))]
pub mod tracking;

#[cfg(all(test, feature = "tracking"))]
#[global_allocator]
static GLOBAL_TEST: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(feature = "fixtures")]
#[cfg_attr(docsrs, doc(cfg(feature = "fixtures")))]
pub mod fixtures;

pub use must::*;

#[cfg(feature = "tracking")]
pub use tracking::track;
