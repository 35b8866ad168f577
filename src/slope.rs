use std::{fmt::Display, num::NonZero};

use crate::{
    Ema, EmaConfig, Error, Indicator, IndicatorConfig, IndicatorConfigBuilder, Ohlcv, Price,
    PriceSource, Result, RollingWindow, Timestamp, indicator::advance_time,
};

/// Configuration for the [`Slope`] indicator.
///
/// # Example
///
/// ```
/// use barflow::{IndicatorConfig, IndicatorConfigBuilder, SlopeConfig};
/// use std::num::NonZero;
///
/// let config = SlopeConfig::builder()
///     .regression_length(NonZero::new(10).unwrap())
///     .smoothing_length(NonZero::new(5).unwrap())
///     .build();
///
/// assert_eq!(config.regression_length(), 10);
/// assert_eq!(config.smoothing_length(), 5);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct SlopeConfig {
    regression_length: NonZero<usize>,
    smoothing_length: NonZero<usize>,
    source: PriceSource,
}

impl IndicatorConfig for SlopeConfig {
    type Builder = SlopeConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        SlopeConfigBuilder::new()
    }
}

impl SlopeConfig {
    /// Number of smoothed values the regression is fitted over.
    #[inline]
    #[must_use]
    pub fn regression_length(&self) -> usize {
        self.regression_length.get()
    }

    /// Length of the EMA smoothing the input.
    #[inline]
    #[must_use]
    pub fn smoothing_length(&self) -> usize {
        self.smoothing_length.get()
    }

    /// Price source extracted from each sample.
    #[inline]
    #[must_use]
    pub fn source(&self) -> PriceSource {
        self.source
    }

    /// Slope of smoothed closing prices.
    #[must_use]
    pub fn close(regression_length: NonZero<usize>, smoothing_length: NonZero<usize>) -> Self {
        Self::builder()
            .regression_length(regression_length)
            .smoothing_length(smoothing_length)
            .build()
    }
}

impl Display for SlopeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SlopeConfig({}, {}, {})",
            self.regression_length, self.smoothing_length, self.source
        )
    }
}

/// Builder for [`SlopeConfig`].
///
/// Defaults: source = [`PriceSource::Close`].
/// Both lengths must be set before calling
/// [`build`](IndicatorConfigBuilder::build).
pub struct SlopeConfigBuilder {
    regression_length: Option<NonZero<usize>>,
    smoothing_length: Option<NonZero<usize>>,
    source: PriceSource,
}

impl SlopeConfigBuilder {
    fn new() -> Self {
        Self {
            regression_length: None,
            smoothing_length: None,
            source: PriceSource::Close,
        }
    }

    /// Sets the regression window length.
    #[inline]
    #[must_use]
    pub fn regression_length(mut self, length: NonZero<usize>) -> Self {
        self.regression_length.replace(length);
        self
    }

    /// Sets the EMA smoothing length.
    #[inline]
    #[must_use]
    pub fn smoothing_length(mut self, length: NonZero<usize>) -> Self {
        self.smoothing_length.replace(length);
        self
    }

    /// Sets the price source.
    #[inline]
    #[must_use]
    pub fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }
}

impl IndicatorConfigBuilder<SlopeConfig> for SlopeConfigBuilder {
    fn try_build(self) -> Result<SlopeConfig> {
        Ok(SlopeConfig {
            regression_length: self.regression_length.ok_or(Error::MissingLength)?,
            smoothing_length: self.smoothing_length.ok_or(Error::MissingLength)?,
            source: self.source,
        })
    }
}

/// Least-squares slope of an EMA-smoothed series.
///
/// Each price feeds an EMA of `smoothing_length`; once that EMA is ready,
/// its value enters a window of the last `regression_length` smoothed
/// values. When the window is full the output is the closed-form
/// least-squares slope
///
/// ```text
/// slope = (n·Σxy − Σx·Σy) / (n·Σx² − (Σx)²)
/// ```
///
/// with `x` counting back in time: the newest value has `x = 0`, the
/// oldest `x = n − 1`. A rising series therefore has a **negative** slope.
/// Output is 0 until ready, i.e. for the first
/// `smoothing_length + regression_length − 2` samples. A regression length
/// of 1 always yields 0.
///
/// # Example
///
/// ```
/// use barflow::{Slope, SlopeConfig, Tick};
/// use std::num::NonZero;
///
/// let nz = |n| NonZero::new(n).unwrap();
/// // EMA(1) passes prices through unchanged
/// let mut slope = Slope::new(SlopeConfig::close(nz(3), nz(1)));
///
/// assert_eq!(slope.update(&Tick::new(1, 1.0)), 0.0);
/// assert_eq!(slope.update(&Tick::new(2, 2.0)), 0.0);
/// assert_eq!(slope.update(&Tick::new(3, 3.0)), -1.0);
/// ```
#[derive(Clone, Debug)]
pub struct Slope {
    config: SlopeConfig,
    ema: Ema,
    window: RollingWindow<Price>,
    current: Price,
    samples: usize,
    last_open_time: Option<Timestamp>,
}

impl Slope {
    /// Feeds a raw price, bypassing the configured source.
    pub fn update_price(&mut self, price: Price) -> Price {
        self.samples += 1;

        self.ema.update_price(price);
        if self.ema.is_ready() {
            self.window.push(self.ema.current());
        }

        self.current = if self.window.is_ready() {
            self.regression_slope()
        } else {
            0.0
        };
        self.current
    }

    #[allow(clippy::cast_precision_loss)]
    fn regression_slope(&self) -> Price {
        let n = self.window.len() as f64;

        let (mut sx, mut sy, mut sxy, mut sx2) = (0.0, 0.0, 0.0, 0.0);
        let mut x = n;
        for &y in self.window.iter_oldest_first() {
            x -= 1.0;
            sxy += x * y;
            sx += x;
            sy += y;
            sx2 += x * x;
        }

        let denominator = n * sx2 - sx * sx;
        if denominator == 0.0 {
            return 0.0;
        }

        (n * sxy - sx * sy) / denominator
    }
}

impl Indicator for Slope {
    type Config = SlopeConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            ema: Ema::new(
                EmaConfig::builder()
                    .length(config.smoothing_length)
                    .build(),
            ),
            window: RollingWindow::new(config.regression_length),
            current: 0.0,
            samples: 0,
            last_open_time: None,
        }
    }

    fn config(&self) -> &SlopeConfig {
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
        self.window.is_ready()
    }

    #[inline]
    fn samples(&self) -> usize {
        self.samples
    }

    fn reset(&mut self) {
        self.ema.reset();
        self.window.reset();
        self.current = 0.0;
        self.samples = 0;
        self.last_open_time = None;
    }
}

impl Display for Slope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SLOPE({}, {}, {})",
            self.config.regression_length, self.config.smoothing_length, self.config.source
        )
    }
}
