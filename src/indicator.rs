use crate::{Ohlcv, Result, Timestamp};

use std::{
    fmt::{Debug, Display},
    hash::Hash,
};

/// Configuration for a technical [`Indicator`].
///
/// Every indicator has a corresponding config type that holds its parameters
/// (length, price source, acceleration factors, etc). Configs are value
/// types: cheap to copy, compare, and hash.
pub trait IndicatorConfig: Sized + Copy + PartialEq + Eq + Hash + Display + Debug {
    /// Builder type for constructing this config.
    type Builder: IndicatorConfigBuilder<Self>;

    /// Returns a new builder with default values.
    fn builder() -> Self::Builder;
}

/// Builder for an [`IndicatorConfig`].
///
/// Invalid parameters are rejected here, at construction time, never on
/// the first update.
pub trait IndicatorConfigBuilder<Config>: Sized
where
    Config: IndicatorConfig,
{
    /// Validates the parameters and builds the config.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`](crate::Error) when a required field is missing or
    /// a parameter is out of range.
    fn try_build(self) -> Result<Config>;

    /// Builds the config. Panics if required fields are missing or invalid.
    #[must_use]
    fn build(self) -> Config {
        self.try_build().unwrap_or_else(|e| panic!("{e}"))
    }
}

/// A streaming technical indicator.
///
/// Indicators maintain internal state and update incrementally on each call
/// to [`update`](Indicator::update), one sample at a time. Every update
/// advances the [`samples`](Indicator::samples) counter.
///
/// Before the indicator [`is_ready`](Indicator::is_ready), [`current`]
/// returns a well-defined default (zero, or a value computed from the
/// partially filled history) and [`value`](Indicator::value) returns `None`.
/// Readiness is the only sanctioned gate: check it before trusting output.
///
/// [`current`]: Indicator::current
///
/// # Example
///
/// ```
/// use barflow::{Ema, EmaConfig, Indicator, Tick};
/// use std::num::NonZero;
///
/// let mut ema = Ema::new(EmaConfig::close(NonZero::new(3).unwrap()));
///
/// assert_eq!(ema.update(&Tick::new(1, 10.0)), 10.0);
/// assert_eq!(ema.value(), None);
/// ema.update(&Tick::new(2, 20.0));
/// ema.update(&Tick::new(3, 30.0));
/// assert!(ema.is_ready());
/// assert_eq!(ema.value(), Some(ema.current()));
/// ```
pub trait Indicator: Sized + Clone + Display + Debug {
    /// Configuration type for this indicator.
    type Config: IndicatorConfig;

    /// Computed output type.
    type Output: Copy + Send + Sync + Display + Debug;

    /// Creates a new indicator from the given config.
    fn new(config: Self::Config) -> Self;

    /// The config this indicator was built from.
    fn config(&self) -> &Self::Config;

    /// Feeds one sample and returns the updated [`current`](Indicator::current)
    /// value.
    fn update(&mut self, sample: &impl Ohlcv) -> Self::Output;

    /// Returns the last computed value without advancing state.
    ///
    /// Meaningful only once [`is_ready`](Indicator::is_ready) is `true`.
    fn current(&self) -> Self::Output;

    /// Whether enough samples have been received for
    /// [`current`](Indicator::current) to be meaningful.
    fn is_ready(&self) -> bool;

    /// Number of samples received since construction or the last reset.
    fn samples(&self) -> usize;

    /// Returns the indicator to its freshly constructed state.
    ///
    /// Replaying the same input after a reset reproduces bit-identical
    /// output.
    fn reset(&mut self);

    /// Returns the last computed value, or `None` if not yet ready.
    ///
    /// This is a cached field read — O(1) with no computation.
    fn value(&self) -> Option<Self::Output> {
        self.is_ready().then(|| self.current())
    }
}

/// Records `open_time` as the latest seen, panicking in debug builds if time
/// went backwards.
#[inline]
pub(crate) fn advance_time(last_open_time: &mut Option<Timestamp>, open_time: Timestamp) {
    debug_assert!(
        last_open_time.is_none_or(|t| t <= open_time),
        "open_time must be non-decreasing: last={}, got={}",
        last_open_time.unwrap_or(0),
        open_time,
    );

    *last_open_time = Some(open_time);
}
