use std::{fmt::Display, num::NonZero};

use crate::{
    Error, Indicator, IndicatorConfig, IndicatorConfigBuilder, Ohlcv, Price, PriceSource, Result,
    Timestamp, indicator::advance_time,
};

/// Configuration for the Exponential Moving Average ([`Ema`])
/// indicator.
///
/// # Convergence
///
/// EMA has infinite memory: the seed (the first price) influences all
/// subsequent values. By default [`Ema`] is ready after `length` samples.
/// With `enforce_convergence` enabled, readiness is postponed until the
/// seed's contribution decays below 1%.
///
/// For EMA(20), that's 63 samples (`3 × (length + 1)`).
///
/// # Example
///
/// ```
/// use barflow::{EmaConfig, IndicatorConfig, IndicatorConfigBuilder};
/// use std::num::NonZero;
///
/// let config = EmaConfig::builder()
///     .length(NonZero::new(20).unwrap())
///     .enforce_convergence(true)
///     .build();
///
/// assert_eq!(config.length(), 20);
/// assert_eq!(config.required_bars_to_converge(), 63);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct EmaConfig {
    length: usize,
    source: PriceSource,
    convergence: bool,
    bars_to_converge: usize,
}

impl IndicatorConfig for EmaConfig {
    type Builder = EmaConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        EmaConfigBuilder::new()
    }
}

impl EmaConfig {
    /// Smoothing length (number of samples).
    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Price source extracted from each sample.
    #[inline]
    #[must_use]
    pub fn source(&self) -> PriceSource {
        self.source
    }

    /// When `true`, [`Ema::is_ready`] stays `false` until
    /// [`required_bars_to_converge`](Self::required_bars_to_converge) samples
    /// have been processed. Default: `false`.
    #[inline]
    #[must_use]
    pub fn enforce_convergence(&self) -> bool {
        self.convergence
    }

    /// Number of samples needed before the EMA is ready.
    ///
    /// When convergence is not enforced, this equals the length.
    /// When enforced, this is `3 × (length + 1)`.
    #[must_use]
    pub fn required_bars_to_converge(&self) -> usize {
        self.bars_to_converge
    }

    /// EMA on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::builder().length(length).build()
    }

    /// EMA on median price: `(high + low) / 2`.
    #[must_use]
    pub fn hl2(length: NonZero<usize>) -> Self {
        Self::builder()
            .length(length)
            .source(PriceSource::HL2)
            .build()
    }

    /// EMA on average price: `(open + high + low + close) / 4`.
    #[must_use]
    pub fn ohlc4(length: NonZero<usize>) -> Self {
        Self::builder()
            .length(length)
            .source(PriceSource::OHLC4)
            .build()
    }
}

impl Display for EmaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EmaConfig({}, {})", self.length, self.source)
    }
}

/// Builder for [`EmaConfig`].
///
/// Defaults: source = [`PriceSource::Close`],
/// convergence enforcement = `false`.
/// Length must be set before calling
/// [`build`](IndicatorConfigBuilder::build).
pub struct EmaConfigBuilder {
    length: Option<usize>,
    source: PriceSource,
    convergence: bool,
}

impl EmaConfigBuilder {
    fn new() -> Self {
        Self {
            length: None,
            source: PriceSource::Close,
            convergence: false,
        }
    }

    /// Sets the smoothing length.
    #[inline]
    #[must_use]
    pub fn length(mut self, length: NonZero<usize>) -> Self {
        self.length.replace(length.get());
        self
    }

    /// Sets the price source.
    #[inline]
    #[must_use]
    pub fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    /// Enables or disables convergence enforcement.
    #[inline]
    #[must_use]
    pub fn enforce_convergence(mut self, enforce: bool) -> Self {
        self.convergence = enforce;
        self
    }
}

impl IndicatorConfigBuilder<EmaConfig> for EmaConfigBuilder {
    fn try_build(self) -> Result<EmaConfig> {
        let length = self.length.ok_or(Error::MissingLength)?;
        let bars_to_converge = if self.convergence {
            3 * (length + 1)
        } else {
            length
        };

        Ok(EmaConfig {
            length,
            source: self.source,
            convergence: self.convergence,
            bars_to_converge,
        })
    }
}

/// Exponential Moving Average (EMA).
///
/// A weighted moving average that gives more weight to recent
/// prices. Uses the standard smoothing factor
/// `α = 2 / (length + 1)`. Each value is computed as:
///
/// ```text
/// EMA = prev_EMA + α × (price − prev_EMA)
/// ```
///
/// The first price seeds the average directly. Every consumer in this
/// crate (zero-lag EMA, slope smoothing) uses the same seeding, so a
/// composite's inner EMA matches a standalone one fed the same prices.
///
/// # Example
///
/// ```
/// use barflow::{Ema, EmaConfig, Tick};
/// use std::num::NonZero;
///
/// let mut ema = Ema::new(EmaConfig::close(NonZero::new(3).unwrap()));
///
/// // Seed
/// assert_eq!(ema.update(&Tick::new(1, 2.0)), 2.0);
/// // α = 0.5: 2 + 0.5 × (4 − 2) = 3
/// assert_eq!(ema.update(&Tick::new(2, 4.0)), 3.0);
/// assert_eq!(ema.value(), None);
///
/// // 3 + 0.5 × (6 − 3) = 4.5, ready after 3 samples
/// assert_eq!(ema.update(&Tick::new(3, 6.0)), 4.5);
/// assert_eq!(ema.value(), Some(4.5));
/// ```
#[derive(Clone, Debug)]
pub struct Ema {
    config: EmaConfig,
    alpha: f64,
    current: Price,
    samples: usize,
    last_open_time: Option<Timestamp>,
}

impl Ema {
    /// Feeds a raw price, bypassing the configured source.
    ///
    /// Composite indicators use this to smooth derived series.
    #[inline]
    pub fn update_price(&mut self, price: Price) -> Price {
        self.current = if self.samples == 0 {
            price
        } else {
            self.alpha.mul_add(price - self.current, self.current)
        };
        self.samples += 1;

        self.current
    }
}

impl Indicator for Ema {
    type Config = EmaConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            #[allow(clippy::cast_precision_loss)]
            alpha: 2.0 / (config.length + 1) as f64,
            current: 0.0,
            samples: 0,
            last_open_time: None,
        }
    }

    fn config(&self) -> &EmaConfig {
        &self.config
    }

    #[inline]
    fn update(&mut self, sample: &impl Ohlcv) -> Price {
        advance_time(&mut self.last_open_time, sample.open_time());

        self.update_price(self.config.source.extract(sample))
    }

    #[inline]
    fn current(&self) -> Price {
        self.current
    }

    #[inline]
    fn is_ready(&self) -> bool {
        self.samples >= self.config.bars_to_converge
    }

    #[inline]
    fn samples(&self) -> usize {
        self.samples
    }

    fn reset(&mut self) {
        self.current = 0.0;
        self.samples = 0;
        self.last_open_time = None;
    }
}

impl Display for Ema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EMA({}, {})", self.config.length, self.config.source)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{assert_approx, bar, nz, ohlc};

    fn ema(length: usize) -> Ema {
        Ema::new(EmaConfig::builder().length(nz(length)).build())
    }

    mod seeding {
        use super::*;

        #[test]
        fn first_value_is_first_price() {
            let mut ema = ema(3);
            assert_eq!(ema.update(&bar(10.0, 1)), 10.0);
        }

        #[test]
        fn not_ready_before_length_samples() {
            let mut ema = ema(3);
            ema.update(&bar(10.0, 1));
            ema.update(&bar(20.0, 2));
            assert!(!ema.is_ready());
            assert_eq!(ema.value(), None);
        }

        #[test]
        fn ready_at_length_samples() {
            let mut ema = ema(3);
            ema.update(&bar(10.0, 1));
            ema.update(&bar(20.0, 2));
            ema.update(&bar(30.0, 3));
            assert!(ema.is_ready());
        }

        #[test]
        fn current_is_zero_before_any_sample() {
            let ema = ema(3);
            assert_eq!(ema.current(), 0.0);
            assert_eq!(ema.samples(), 0);
        }
    }

    mod computation {
        use super::*;

        #[test]
        fn applies_formula() {
            // EMA(3): α = 2/(3+1) = 0.5
            let mut ema = ema(3);
            ema.update(&bar(2.0, 1)); // 2
            ema.update(&bar(4.0, 2)); // 3
            ema.update(&bar(6.0, 3)); // 4.5
            // 4.5 + 0.5 × (8 − 4.5) = 6.25
            assert_eq!(ema.update(&bar(8.0, 4)), 6.25);
        }

        #[test]
        fn constant_input_stays_constant() {
            let mut ema = ema(3);
            for i in 1..=20 {
                ema.update(&bar(50.0, i));
            }
            assert_eq!(ema.current(), 50.0);
        }

        #[test]
        fn same_timestamp_advances_state() {
            let mut ema = ema(3);
            ema.update(&bar(2.0, 1));
            ema.update(&bar(4.0, 1));
            assert_eq!(ema.samples(), 2);
            assert_eq!(ema.current(), 3.0);
        }
    }

    mod alpha {
        use super::*;

        #[test]
        fn ema_2_alpha_is_two_thirds() {
            // seed 3, then 3 + 2/3 × (6 − 3) = 5
            let mut ema = ema(2);
            ema.update(&bar(3.0, 1));
            assert_approx!(ema.update(&bar(6.0, 2)), 5.0);
        }

        #[test]
        fn ema_4_alpha_is_two_fifths() {
            // seed 10, then 10 + 0.4 × (35 − 10) = 20
            let mut ema = ema(4);
            ema.update(&bar(10.0, 1));
            assert_approx!(ema.update(&bar(35.0, 2)), 20.0);
        }

        #[test]
        fn ema_1_tracks_latest_price() {
            // α = 2/(1+1) = 1.0
            let mut ema = ema(1);
            assert_eq!(ema.update(&bar(10.0, 1)), 10.0);
            assert!(ema.is_ready());
            assert_eq!(ema.update(&bar(20.0, 2)), 20.0);
            assert_eq!(ema.update(&bar(5.0, 3)), 5.0);
        }
    }

    mod price_source {
        use super::*;

        #[test]
        fn uses_configured_source() {
            let mut ema = Ema::new(EmaConfig::hl2(nz(3)));
            // HL2 = midpoint(20, 10) = 15
            assert_eq!(ema.update(&ohlc(0.0, 20.0, 10.0, 0.0)), 15.0);
        }

        #[test]
        fn update_price_bypasses_source() {
            let mut ema = Ema::new(EmaConfig::hl2(nz(3)));
            assert_eq!(ema.update_price(42.0), 42.0);
        }
    }

    mod convergence {
        use super::*;

        #[test]
        fn not_ready_until_converged_when_enforced() {
            let mut ema = Ema::new(
                EmaConfig::builder()
                    .length(nz(3))
                    .enforce_convergence(true)
                    .build(),
            );
            // required = 3 × (3 + 1) = 12
            for i in 1..=11 {
                ema.update(&bar(50.0, i));
                assert!(!ema.is_ready(), "expected not ready at sample {i}");
            }
            ema.update(&bar(50.0, 12));
            assert!(ema.is_ready());
        }

        #[test]
        fn required_bars_scales_with_length() {
            let c10 = EmaConfig::builder()
                .length(nz(10))
                .enforce_convergence(true)
                .build();
            assert_eq!(c10.required_bars_to_converge(), 33);

            let c50 = EmaConfig::builder()
                .length(nz(50))
                .enforce_convergence(true)
                .build();
            assert_eq!(c50.required_bars_to_converge(), 153);
        }

        #[test]
        #[allow(clippy::cast_precision_loss)]
        fn values_match_with_and_without_enforcement() {
            let mut free = ema(3);
            let mut enforced = Ema::new(
                EmaConfig::builder()
                    .length(nz(3))
                    .enforce_convergence(true)
                    .build(),
            );

            for i in 1..=20 {
                free.update(&bar(i as f64 * 10.0, i));
                enforced.update(&bar(i as f64 * 10.0, i));
            }

            assert_eq!(free.current(), enforced.current());
        }
    }

    mod reset {
        use super::*;

        #[test]
        #[allow(clippy::cast_precision_loss)]
        fn replay_reproduces_output() {
            let mut ema = ema(5);
            let first: Vec<f64> = (1..=30)
                .map(|i| ema.update(&bar((i as f64).sin() * 10.0 + 100.0, i)))
                .collect();

            ema.reset();
            assert!(!ema.is_ready());
            assert_eq!(ema.samples(), 0);

            let second: Vec<f64> = (1..=30)
                .map(|i| ema.update(&bar((i as f64).sin() * 10.0 + 100.0, i)))
                .collect();

            assert_eq!(first, second);
        }

        #[test]
        fn accepts_earlier_timestamps_after_reset() {
            let mut ema = ema(2);
            ema.update(&bar(1.0, 100));
            ema.reset();
            assert_eq!(ema.update(&bar(2.0, 1)), 2.0);
        }
    }

    mod clone {
        use super::*;

        #[test]
        fn produces_independent_state() {
            let mut ema = ema(3);
            ema.update(&bar(2.0, 1));
            ema.update(&bar(4.0, 2));

            let mut cloned = ema.clone();

            assert_eq!(ema.update(&bar(6.0, 3)), 4.5);
            assert_eq!(cloned.current(), 3.0);
            // 3 + 0.5 × (11 − 3) = 7
            assert_eq!(cloned.update(&bar(11.0, 3)), 7.0);
        }
    }

    mod config {
        use super::*;
        use std::collections::HashSet;

        #[test]
        fn default_source_is_close() {
            let config = EmaConfig::builder().length(nz(10)).build();
            assert_eq!(config.source(), PriceSource::Close);
        }

        #[test]
        fn convergence_disabled_by_default() {
            let config = EmaConfig::builder().length(nz(10)).build();
            assert!(!config.enforce_convergence());
            assert_eq!(config.required_bars_to_converge(), 10);
        }

        #[test]
        #[should_panic(expected = "length is required")]
        fn panics_without_length() {
            let _ = EmaConfig::builder().build();
        }

        #[test]
        fn try_build_reports_missing_length() {
            assert_eq!(
                EmaConfig::builder().try_build(),
                Err(Error::MissingLength)
            );
        }

        #[test]
        fn helpers_set_source() {
            assert_eq!(EmaConfig::close(nz(20)).source(), PriceSource::Close);
            assert_eq!(EmaConfig::hl2(nz(10)).source(), PriceSource::HL2);
            assert_eq!(EmaConfig::ohlc4(nz(10)).source(), PriceSource::OHLC4);
        }

        #[test]
        fn eq_and_hash() {
            let a = EmaConfig::close(nz(20));
            let b = EmaConfig::close(nz(20));
            let c = EmaConfig::close(nz(10));

            let mut set = HashSet::new();
            set.insert(a);

            assert!(set.contains(&b));
            assert!(!set.contains(&c));
        }
    }

    mod display {
        use super::*;

        #[test]
        fn formats_correctly() {
            assert_eq!(ema(20).to_string(), "EMA(20, Close)");
        }

        #[test]
        fn config_formats_correctly() {
            assert_eq!(EmaConfig::close(nz(20)).to_string(), "EmaConfig(20, Close)");
        }
    }

    mod invariants {
        use super::*;

        #[cfg(debug_assertions)]
        #[test]
        #[should_panic(expected = "open_time must be non-decreasing")]
        fn panics_on_decreasing_open_time() {
            let mut ema = ema(2);
            ema.update(&bar(10.0, 2));
            ema.update(&bar(20.0, 1));
        }
    }
}
