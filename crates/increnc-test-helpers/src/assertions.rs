//! Float assertion macros.

/// Assert that two floating-point values are approximately equal.
///
/// ```rust
/// use increnc_test_helpers::assert_approx_eq;
///
/// assert_approx_eq!(628.92_f32, 628.9, 0.05);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr $(,)?) => {{
        let left = $left;
        let right = $right;
        let tolerance = $tolerance;
        let diff = (left - right).abs();
        if diff.is_nan() || diff > tolerance {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`,\n  tolerance: `{:?}`",
                left, right, diff, tolerance
            );
        }
    }};
    ($left:expr, $right:expr, $tolerance:expr, $($arg:tt)+) => {{
        let left = $left;
        let right = $right;
        let tolerance = $tolerance;
        let diff = (left - right).abs();
        if diff.is_nan() || diff > tolerance {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`,\n  tolerance: `{:?}`: {}",
                left, right, diff, tolerance, format_args!($($arg)+)
            );
        }
    }};
}

/// Assert that an angle lies in `[0, 2π)`.
///
/// ```rust
/// use increnc_test_helpers::assert_in_rotation;
///
/// assert_in_rotation!(3.0_f32);
/// ```
#[macro_export]
macro_rules! assert_in_rotation {
    ($angle:expr $(,)?) => {{
        let angle: f32 = $angle;
        if angle.is_nan() || angle < 0.0 || angle >= ::core::f32::consts::TAU {
            panic!(
                "assertion failed: angle `{:?}` is outside [0, 2π)",
                angle
            );
        }
    }};
}
