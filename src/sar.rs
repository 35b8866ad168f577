use std::{
    fmt::Display,
    hash::{Hash, Hasher},
};

use tracing::trace;

use crate::{
    Error, Indicator, IndicatorConfig, IndicatorConfigBuilder, Ohlcv, Price, Result, Timestamp,
    indicator::advance_time,
};

const DEFAULT_AF_INIT: f64 = 0.02;
const DEFAULT_AF_INCREMENT: f64 = 0.02;
const DEFAULT_AF_MAX: f64 = 0.2;

/// Configuration for the [`Sar`] indicator.
///
/// Equality and hashing compare the bit patterns of the acceleration
/// factors, so configs can key a `HashMap`.
///
/// # Example
///
/// ```
/// use barflow::{IndicatorConfig, IndicatorConfigBuilder, SarConfig};
///
/// let config = SarConfig::builder().af_max(0.3).build();
///
/// assert_eq!(config.af_init(), 0.02);
/// assert_eq!(config.af_max(), 0.3);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct SarConfig {
    af_init: f64,
    af_increment: f64,
    af_max: f64,
}

impl SarConfig {
    /// Acceleration factor after initialization and every reversal.
    #[inline]
    #[must_use]
    pub fn af_init(&self) -> f64 {
        self.af_init
    }

    /// Added to the acceleration factor on each new extreme point.
    #[inline]
    #[must_use]
    pub fn af_increment(&self) -> f64 {
        self.af_increment
    }

    /// Upper bound of the acceleration factor.
    #[inline]
    #[must_use]
    pub fn af_max(&self) -> f64 {
        self.af_max
    }

    fn bits(&self) -> (u64, u64, u64) {
        (
            self.af_init.to_bits(),
            self.af_increment.to_bits(),
            self.af_max.to_bits(),
        )
    }
}

impl Default for SarConfig {
    fn default() -> Self {
        Self {
            af_init: DEFAULT_AF_INIT,
            af_increment: DEFAULT_AF_INCREMENT,
            af_max: DEFAULT_AF_MAX,
        }
    }
}

impl PartialEq for SarConfig {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for SarConfig {}

impl Hash for SarConfig {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl IndicatorConfig for SarConfig {
    type Builder = SarConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        SarConfigBuilder::new()
    }
}

impl Display for SarConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SarConfig({}, {}, {})",
            self.af_init, self.af_increment, self.af_max
        )
    }
}

/// Builder for [`SarConfig`].
///
/// Defaults: `af_init = 0.02`, `af_increment = 0.02`, `af_max = 0.2`.
pub struct SarConfigBuilder {
    af_init: f64,
    af_increment: f64,
    af_max: f64,
}

impl SarConfigBuilder {
    fn new() -> Self {
        Self {
            af_init: DEFAULT_AF_INIT,
            af_increment: DEFAULT_AF_INCREMENT,
            af_max: DEFAULT_AF_MAX,
        }
    }

    /// Sets the initial acceleration factor.
    #[inline]
    #[must_use]
    pub fn af_init(mut self, af: f64) -> Self {
        self.af_init = af;
        self
    }

    /// Sets the acceleration increment.
    #[inline]
    #[must_use]
    pub fn af_increment(mut self, increment: f64) -> Self {
        self.af_increment = increment;
        self
    }

    /// Sets the acceleration cap.
    #[inline]
    #[must_use]
    pub fn af_max(mut self, af: f64) -> Self {
        self.af_max = af;
        self
    }

    fn reject(&self, reason: &'static str) -> Error {
        Error::InvalidAcceleration {
            init: self.af_init,
            increment: self.af_increment,
            max: self.af_max,
            reason,
        }
    }
}

impl IndicatorConfigBuilder<SarConfig> for SarConfigBuilder {
    fn try_build(self) -> Result<SarConfig> {
        if !(self.af_init.is_finite() && self.af_increment.is_finite() && self.af_max.is_finite())
        {
            return Err(self.reject("factors must be finite"));
        }
        if self.af_init <= 0.0 {
            return Err(self.reject("initial factor must be positive"));
        }
        if self.af_increment < 0.0 {
            return Err(self.reject("increment must not be negative"));
        }
        if self.af_max < self.af_init {
            return Err(self.reject("cap must not be below the initial factor"));
        }

        // -0.0 passes the sign check but would differ bitwise from 0.0.
        let af_increment = if self.af_increment == 0.0 {
            0.0
        } else {
            self.af_increment
        };

        Ok(SarConfig {
            af_init: self.af_init,
            af_increment,
            af_max: self.af_max,
        })
    }
}

/// Trend direction tracked by [`Sar`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Position {
    /// Rising trend; the stop trails below price.
    Long,
    /// Falling trend; the stop trails above price.
    Short,
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Long => write!(f, "Long"),
            Position::Short => write!(f, "Short"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Extent {
    high: Price,
    low: Price,
    close: Price,
}

/// Parabolic Stop And Reversal.
///
/// A trailing stop that accelerates towards price while the trend makes
/// new extremes and flips sides when price penetrates it.
///
/// - Sample 1 is only remembered; output is 0.
/// - Sample 2 picks the initial [`Position`] (`Long` when the close did
///   not fall) and outputs the previous bar's low (`Long`) or high
///   (`Short`) as the first stop. The indicator is ready from here on.
/// - Each later sample outputs the stop computed on the previous sample,
///   then advances it by `af × (ep − stop)`. A new extreme point raises
///   `af` by the increment up to the cap. The advanced stop is clamped so
///   it never enters the range of the previous or current bar.
/// - A bar whose range reaches the stop reverses the position. The output
///   is then the extreme point of the finished trend, pushed outside the
///   current and previous bars.
///
/// # Example
///
/// ```
/// use barflow::{Bar, Position, Sar, SarConfig};
///
/// let mut sar = Sar::new(SarConfig::default());
/// let bar = |t, h, l, c| Bar::new(t, 1, c, h, l, c);
///
/// assert_eq!(sar.update(&bar(1, 10.0, 8.0, 9.0)), 0.0);
/// assert_eq!(sar.update(&bar(2, 11.0, 9.0, 10.5)), 8.0);
/// assert_eq!(sar.position(), Some(Position::Long));
///
/// assert_eq!(sar.update(&bar(3, 12.0, 10.0, 11.8)), 8.0);
/// // low of 7 breaks the stop: reversal at the extreme point
/// assert_eq!(sar.update(&bar(4, 9.0, 7.0, 8.0)), 12.0);
/// assert_eq!(sar.position(), Some(Position::Short));
/// ```
#[derive(Clone, Debug)]
pub struct Sar {
    config: SarConfig,
    previous: Option<Extent>,
    position: Option<Position>,
    af: f64,
    ep: Price,
    stop: Price,
    current: Price,
    samples: usize,
    last_open_time: Option<Timestamp>,
}

impl Sar {
    /// Current trend, `None` before the second sample.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Stop computed for the next sample.
    #[inline]
    #[must_use]
    pub fn stop(&self) -> Price {
        self.stop
    }

    /// Current acceleration factor.
    #[inline]
    #[must_use]
    pub fn acceleration(&self) -> f64 {
        self.af
    }

    /// Most favorable price of the current trend.
    #[inline]
    #[must_use]
    pub fn extreme_point(&self) -> Price {
        self.ep
    }

    fn initialize(&mut self, previous: Extent, current: Extent) -> Price {
        let position = if current.close >= previous.close {
            self.ep = current.high.min(previous.high);
            self.stop = previous.low;
            Position::Long
        } else {
            self.ep = current.low.min(previous.low);
            self.stop = previous.high;
            Position::Short
        };

        self.position = Some(position);
        self.af = self.config.af_init;
        self.stop
    }

    fn track_long(&mut self, previous: Extent, current: Extent) -> Price {
        let ceiling = previous.high.max(current.high);

        if current.low <= self.stop {
            let reversal = self.ep.max(ceiling);
            trace!(stop = reversal, low = current.low, "long stop hit, reversing to short");

            self.position = Some(Position::Short);
            self.af = self.config.af_init;
            self.ep = current.low;
            self.stop = self.advance(reversal).max(ceiling);
            return reversal;
        }

        let output = self.stop;
        if current.high > self.ep {
            self.ep = current.high;
            self.accelerate();
        }
        self.stop = self
            .advance(self.stop)
            .min(previous.low.min(current.low));
        output
    }

    fn track_short(&mut self, previous: Extent, current: Extent) -> Price {
        let floor = previous.low.min(current.low);

        if current.high >= self.stop {
            let reversal = self.ep.min(floor);
            trace!(stop = reversal, high = current.high, "short stop hit, reversing to long");

            self.position = Some(Position::Long);
            self.af = self.config.af_init;
            self.ep = current.high;
            self.stop = self.advance(reversal).min(floor);
            return reversal;
        }

        let output = self.stop;
        if current.low < self.ep {
            self.ep = current.low;
            self.accelerate();
        }
        self.stop = self
            .advance(self.stop)
            .max(previous.high.max(current.high));
        output
    }

    #[inline]
    fn advance(&self, stop: Price) -> Price {
        self.af.mul_add(self.ep - stop, stop)
    }

    #[inline]
    fn accelerate(&mut self) {
        self.af = (self.af + self.config.af_increment).min(self.config.af_max);
    }
}

impl Indicator for Sar {
    type Config = SarConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            previous: None,
            position: None,
            af: config.af_init,
            ep: 0.0,
            stop: 0.0,
            current: 0.0,
            samples: 0,
            last_open_time: None,
        }
    }

    fn config(&self) -> &SarConfig {
        &self.config
    }

    fn update(&mut self, sample: &impl Ohlcv) -> Price {
        advance_time(&mut self.last_open_time, sample.open_time());
        self.samples += 1;

        let current = Extent {
            high: sample.high(),
            low: sample.low(),
            close: sample.close(),
        };
        let Some(previous) = self.previous.replace(current) else {
            return self.current;
        };

        self.current = match self.position {
            None => self.initialize(previous, current),
            Some(Position::Long) => self.track_long(previous, current),
            Some(Position::Short) => self.track_short(previous, current),
        };
        self.current
    }

    #[inline]
    fn current(&self) -> Price {
        self.current
    }

    #[inline]
    fn is_ready(&self) -> bool {
        self.position.is_some()
    }

    #[inline]
    fn samples(&self) -> usize {
        self.samples
    }

    fn reset(&mut self) {
        *self = <Self as Indicator>::new(self.config);
    }
}

impl Display for Sar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SAR({}, {}, {})",
            self.config.af_init, self.config.af_increment, self.config.af_max
        )
    }
}
