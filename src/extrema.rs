use std::{collections::VecDeque, fmt::Display, num::NonZero};

use crate::{
    Error, Indicator, IndicatorConfig, IndicatorConfigBuilder, Ohlcv, Price, PriceSource, Result,
    Timestamp, indicator::advance_time,
};

/// Configuration for [`Maximum`] and [`Minimum`].
///
/// # Example
///
/// ```
/// use barflow::{ExtremaConfig, PriceSource};
/// use std::num::NonZero;
///
/// let config = ExtremaConfig::high(NonZero::new(20).unwrap());
/// assert_eq!(config.length(), 20);
/// assert_eq!(config.source(), PriceSource::High);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct ExtremaConfig {
    length: usize,
    source: PriceSource,
}

impl IndicatorConfig for ExtremaConfig {
    type Builder = ExtremaConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        ExtremaConfigBuilder::new()
    }
}

impl ExtremaConfig {
    /// Window length (number of samples).
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

    /// Extreme of closing prices.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::builder().length(length).build()
    }

    /// Extreme of highs.
    #[must_use]
    pub fn high(length: NonZero<usize>) -> Self {
        Self::builder()
            .length(length)
            .source(PriceSource::High)
            .build()
    }

    /// Extreme of lows.
    #[must_use]
    pub fn low(length: NonZero<usize>) -> Self {
        Self::builder()
            .length(length)
            .source(PriceSource::Low)
            .build()
    }
}

impl Display for ExtremaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExtremaConfig({}, {})", self.length, self.source)
    }
}

/// Builder for [`ExtremaConfig`].
///
/// Defaults: source = [`PriceSource::Close`].
/// Length must be set before calling [`build`](IndicatorConfigBuilder::build).
pub struct ExtremaConfigBuilder {
    length: Option<usize>,
    source: PriceSource,
}

impl ExtremaConfigBuilder {
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
}

impl IndicatorConfigBuilder<ExtremaConfig> for ExtremaConfigBuilder {
    fn try_build(self) -> Result<ExtremaConfig> {
        Ok(ExtremaConfig {
            length: self.length.ok_or(Error::MissingLength)?,
            source: self.source,
        })
    }
}

/// Rolling extreme (maximum when `MAX`, minimum otherwise) of the last
/// `length` prices.
///
/// Use the [`Maximum`] and [`Minimum`] aliases. Keeps a monotonic deque of
/// candidate extremes, so each update is O(1) amortized and memory is
/// bounded by `length`.
///
/// # Example
///
/// ```
/// use barflow::{ExtremaConfig, Maximum, Tick};
/// use std::num::NonZero;
///
/// let mut max = Maximum::new(ExtremaConfig::close(NonZero::new(3).unwrap()));
///
/// max.update(&Tick::new(1, 3.0));
/// max.update(&Tick::new(2, 1.0));
/// assert_eq!(max.update(&Tick::new(3, 2.0)), 3.0);
/// assert_eq!(max.periods_since(), 2);
///
/// // 3.0 leaves the window
/// assert_eq!(max.update(&Tick::new(4, 0.5)), 2.0);
/// ```
#[derive(Clone, Debug)]
pub struct Extremum<const MAX: bool> {
    config: ExtremaConfig,
    /// `(sample index, price)`, strictly monotonic in price from front to back.
    candidates: VecDeque<(usize, Price)>,
    samples: usize,
    current: Price,
    last_open_time: Option<Timestamp>,
}

/// Highest price over the last `length` samples.
pub type Maximum = Extremum<true>;

/// Lowest price over the last `length` samples.
pub type Minimum = Extremum<false>;

impl<const MAX: bool> Extremum<MAX> {
    /// Feeds a raw price, bypassing the configured source.
    #[inline]
    pub fn update_price(&mut self, price: Price) -> Price {
        let index = self.samples;
        self.samples += 1;

        // Newest wins ties, so an equal price resets `periods_since`.
        while let Some(&(_, candidate)) = self.candidates.back() {
            let dominated = if MAX {
                candidate <= price
            } else {
                candidate >= price
            };
            if !dominated {
                break;
            }
            self.candidates.pop_back();
        }
        self.candidates.push_back((index, price));

        while let Some(&(i, _)) = self.candidates.front() {
            if i + self.config.length > index {
                break;
            }
            self.candidates.pop_front();
        }

        self.current = self.candidates.front().map_or(price, |&(_, p)| p);
        self.current
    }

    /// Number of samples since the current extreme was seen (0 = the latest
    /// sample is the extreme).
    #[inline]
    #[must_use]
    pub fn periods_since(&self) -> usize {
        self.candidates
            .front()
            .map_or(0, |&(i, _)| self.samples - 1 - i)
    }
}

impl<const MAX: bool> Indicator for Extremum<MAX> {
    type Config = ExtremaConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            candidates: VecDeque::with_capacity(config.length),
            samples: 0,
            current: 0.0,
            last_open_time: None,
        }
    }

    fn config(&self) -> &ExtremaConfig {
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
        self.samples >= self.config.length
    }

    #[inline]
    fn samples(&self) -> usize {
        self.samples
    }

    fn reset(&mut self) {
        self.candidates.clear();
        self.samples = 0;
        self.current = 0.0;
        self.last_open_time = None;
    }
}

impl<const MAX: bool> Display for Extremum<MAX> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = if MAX { "MAX" } else { "MIN" };
        write!(f, "{name}({}, {})", self.config.length, self.config.source)
    }
}
