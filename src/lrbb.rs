use std::{fmt::Display, num::NonZero};

use crate::{
    Error, ExtremaConfig, Indicator, IndicatorConfig, IndicatorConfigBuilder, Maximum, Minimum,
    Ohlcv, Price, PriceSource, Result, RollingWindow, Timestamp, indicator::advance_time,
};

/// Configuration for the [`LinRegBullBear`] oscillator.
///
/// # Example
///
/// ```
/// use barflow::LinRegBullBearConfig;
/// use std::num::NonZero;
///
/// let config = LinRegBullBearConfig::close(NonZero::new(14).unwrap());
/// assert_eq!(config.length(), 14);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct LinRegBullBearConfig {
    length: NonZero<usize>,
    source: PriceSource,
}

impl IndicatorConfig for LinRegBullBearConfig {
    type Builder = LinRegBullBearConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        LinRegBullBearConfigBuilder::new()
    }
}

impl LinRegBullBearConfig {
    /// Window length (number of samples).
    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.length.get()
    }

    /// Price source extracted from each sample.
    #[inline]
    #[must_use]
    pub fn source(&self) -> PriceSource {
        self.source
    }

    /// Oscillator on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::builder().length(length).build()
    }
}

impl Display for LinRegBullBearConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LinRegBullBearConfig({}, {})", self.length, self.source)
    }
}

/// Builder for [`LinRegBullBearConfig`].
///
/// Defaults: source = [`PriceSource::Close`].
/// Length must be set before calling [`build`](IndicatorConfigBuilder::build).
pub struct LinRegBullBearConfigBuilder {
    length: Option<NonZero<usize>>,
    source: PriceSource,
}

impl LinRegBullBearConfigBuilder {
    fn new() -> Self {
        Self {
            length: None,
            source: PriceSource::Close,
        }
    }

    /// Sets the window length.
    #[inline]
    #[must_use]
    pub fn length(mut self, length: NonZero<usize>) -> Self {
        self.length.replace(length);
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

impl IndicatorConfigBuilder<LinRegBullBearConfig> for LinRegBullBearConfigBuilder {
    fn try_build(self) -> Result<LinRegBullBearConfig> {
        Ok(LinRegBullBearConfig {
            length: self.length.ok_or(Error::MissingLength)?,
            source: self.source,
        })
    }
}

/// Linear-regression bull and bear power.
///
/// Measures how far price sits from the top and the bottom of its recent
/// range, each distance expanded by its size relative to the range extreme:
///
/// ```text
/// Δh   = highest − price          Δl   = price − lowest
/// bear = −(Δh + Δh / h_bar)       bull = Δl + Δl / l_bar
/// out  = 2 × bull + 2 × bear
/// ```
///
/// `highest`/`h_bar` and `lowest`/`l_bar` are the extremes of the same
/// `length`-sample window, so both come from the owned [`Maximum`] and
/// [`Minimum`] deques in O(1). The raw prices stay reachable through
/// [`window`](Self::window). A zero extreme contributes a zero ratio term
/// instead of dividing by zero.
///
/// Output is computed over the partial window from the first sample; the
/// oscillator is ready once the window is full. Positive output is bullish
/// ([`is_bull`](Self::is_bull)), negative bearish ([`is_bear`](Self::is_bear)).
///
/// # Example
///
/// ```
/// use barflow::{LinRegBullBear, LinRegBullBearConfig, Tick};
/// use std::num::NonZero;
///
/// let mut lrbb = LinRegBullBear::new(LinRegBullBearConfig::close(NonZero::new(2).unwrap()));
///
/// lrbb.update(&Tick::new(1, 10.0));
/// // Δl = 2, l_bar = 10 → bull = 2.2, bear = 0 → 4.4
/// assert_eq!(lrbb.update(&Tick::new(2, 12.0)), 4.4);
/// assert!(lrbb.is_bull());
/// ```
#[derive(Clone, Debug)]
pub struct LinRegBullBear {
    config: LinRegBullBearConfig,
    window: RollingWindow<Price>,
    max: Maximum,
    min: Minimum,
    current: Price,
    last_open_time: Option<Timestamp>,
}

impl LinRegBullBear {
    /// Feeds a raw price, bypassing the configured source.
    pub fn update_price(&mut self, price: Price) -> Price {
        self.window.push(price);

        let highest = self.max.update_price(price);
        let lowest = self.min.update_price(price);

        let bear = -expand(highest - price, highest);
        let bull = expand(price - lowest, lowest);

        self.current = 2.0 * bull + 2.0 * bear;
        self.current
    }

    /// The last `length` prices fed to the oscillator.
    #[inline]
    #[must_use]
    pub fn window(&self) -> &RollingWindow<Price> {
        &self.window
    }

    /// Whether the latest output is positive.
    #[inline]
    #[must_use]
    pub fn is_bull(&self) -> bool {
        self.current > 0.0
    }

    /// Whether the latest output is negative.
    #[inline]
    #[must_use]
    pub fn is_bear(&self) -> bool {
        self.current < 0.0
    }
}

/// `height + height / extreme`, with a zero extreme dropping the ratio.
#[inline]
fn expand(height: Price, extreme: Price) -> Price {
    if extreme == 0.0 {
        height
    } else {
        height + height / extreme
    }
}

impl Indicator for LinRegBullBear {
    type Config = LinRegBullBearConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        let extrema = ExtremaConfig::builder()
            .length(config.length)
            .source(config.source)
            .build();

        Self {
            config,
            window: RollingWindow::new(config.length),
            max: Maximum::new(extrema),
            min: Minimum::new(extrema),
            current: 0.0,
            last_open_time: None,
        }
    }

    fn config(&self) -> &LinRegBullBearConfig {
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
        self.window.samples()
    }

    fn reset(&mut self) {
        self.window.reset();
        self.max.reset();
        self.min.reset();
        self.current = 0.0;
        self.last_open_time = None;
    }
}

impl Display for LinRegBullBear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LRBB({}, {})", self.config.length, self.config.source)
    }
}
