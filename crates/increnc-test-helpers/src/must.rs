//! Panicking unwraps for test code.
//!
//! Library lints deny `unwrap()` and `expect()`; tests use these instead.
//! The panic is reported at the caller through `#[track_caller]`.

use std::fmt::Debug;

/// Value of an `Ok`, or a panic naming the error.
///
/// ```rust
/// use increnc::EncoderConfig;
/// use increnc_test_helpers::must;
///
/// let config = must(EncoderConfig::from_json(r#"{"resolution": 500}"#));
/// assert_eq!(config.ticks_per_rotation(), Some(2000));
/// ```
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("expected Ok, got Err({err:?})"),
    }
}

/// Error of a call that has to be rejected, or a panic naming the value
/// that was accepted.
///
/// ```rust
/// use increnc::EncoderConfig;
/// use increnc_test_helpers::must_err;
///
/// let err = must_err(EncoderConfig::default().with_update_period(-1.0).validate());
/// assert_eq!(err.field(), Some("update_period"));
/// ```
#[track_caller]
pub fn must_err<T: Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(value) => panic!("expected Err, got Ok({value:?})"),
        Err(err) => err,
    }
}
