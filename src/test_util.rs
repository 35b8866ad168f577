// src/test_util.rs

use crate::{Bar, Price, Timestamp};
use std::num::NonZero;

/// Asserts that two `f64` values are approximately equal using a
/// relative epsilon of `4 * f64::EPSILON`.
macro_rules! assert_approx {
    ($actual:expr, $expected:expr) => {{
        let (a, e) = ($actual, $expected);
        assert!(
            (a - e).abs() <= e.abs() * 4.0 * f64::EPSILON,
            "assert_approx failed: actual={a}, expected={e}, diff={}",
            (a - e).abs(),
        );
    }};
}

pub(crate) use assert_approx;

pub fn nz(n: usize) -> NonZero<usize> {
    NonZero::new(n).unwrap()
}

/// Bar at time 0 with a one-unit span.
pub fn ohlc(open: Price, high: Price, low: Price, close: Price) -> Bar {
    Bar::new(0, 1, open, high, low, close)
}

/// Convenience: bar with just a close price and timestamp (OHLC all equal to close).
pub fn bar(close: Price, time: Timestamp) -> Bar {
    Bar::new(time, 1, close, close, close, close)
}

/// Bar from high, low and close; open is set to close.
pub fn hlc(high: Price, low: Price, close: Price, time: Timestamp) -> Bar {
    Bar::new(time, 1, close, high, low, close)
}
