/// A price value.
///
/// Semantic alias for [`f64`]. Documents intent in function signatures
/// without introducing newtype construction overhead.
pub type Price = f64;

/// Sample timestamp in milliseconds.
///
/// Any monotonically increasing millisecond clock works; Unix epoch
/// milliseconds are the usual choice. Must be non-decreasing between
/// consecutive updates of the same indicator or consolidator.
pub type Timestamp = u64;

/// A price sample: either an instantaneous observation (a tick) or an
/// aggregate over a span (a bar).
///
/// Implement this on your own kline/candle/trade type to avoid per-sample
/// conversion. Indicators accept `&impl Ohlcv` and extract the configured
/// [`PriceSource`](crate::PriceSource) internally; the
/// [`Consolidator`](crate::Consolidator) aggregates any `Ohlcv` into
/// [`Bar`](crate::Bar)s.
///
/// # Example
///
/// ```
/// use barflow::{Ohlcv, Price, Timestamp};
///
/// struct MyKline {
///     o: f64, h: f64, l: f64, c: f64,
///     ts: u64,
/// }
///
/// impl Ohlcv for MyKline {
///     fn open(&self) -> Price { self.o }
///     fn high(&self) -> Price { self.h }
///     fn low(&self) -> Price { self.l }
///     fn close(&self) -> Price { self.c }
///     fn open_time(&self) -> Timestamp { self.ts }
///     fn period(&self) -> Option<Timestamp> { Some(60_000) }
/// }
///
/// let k = MyKline { o: 1.0, h: 2.0, l: 0.5, c: 1.5, ts: 120_000 };
/// assert_eq!(k.end_time(), 180_000);
/// ```
pub trait Ohlcv {
    /// Opening price.
    fn open(&self) -> Price;

    /// Highest price.
    fn high(&self) -> Price;

    /// Lowest price.
    fn low(&self) -> Price;

    /// Closing (or latest) price.
    fn close(&self) -> Price;

    /// Start of the sample, in milliseconds.
    ///
    /// Values must be non-decreasing between calls. Behaviour is undefined if
    /// `open_time` decreases; debug builds panic.
    fn open_time(&self) -> Timestamp;

    /// Traded volume. Defaults to `0.0`.
    fn volume(&self) -> f64 {
        0.0
    }

    /// Span covered by the sample in milliseconds, or `None` for an
    /// instantaneous sample such as a trade tick.
    ///
    /// The consolidator uses this to tell bar-shaped input apart from ticks.
    fn period(&self) -> Option<Timestamp> {
        None
    }

    /// End of the sample: `open_time + period`.
    fn end_time(&self) -> Timestamp {
        self.open_time() + self.period().unwrap_or(0)
    }
}
