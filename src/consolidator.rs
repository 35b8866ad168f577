use std::{fmt::Display, num::NonZero, time::Duration};

use tracing::{debug, trace};

use crate::{Bar, Error, Ohlcv, Result, Timestamp, indicator::advance_time};

/// Trigger policy of a [`Consolidator`].
///
/// A period, a sample count, or both (whichever is satisfied first). Periods
/// are held as whole milliseconds to match [`Timestamp`].
///
/// # Example
///
/// ```
/// use barflow::ConsolidatorConfig;
/// use std::{num::NonZero, time::Duration};
///
/// let config = ConsolidatorConfig::builder()
///     .period(Duration::from_secs(3600))
///     .count(NonZero::new(100).unwrap())
///     .build();
///
/// assert_eq!(config.period(), Some(Duration::from_secs(3600)));
/// assert_eq!(config.count(), Some(100));
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct ConsolidatorConfig {
    period: Option<Timestamp>,
    count: Option<NonZero<usize>>,
    round_bar_time: bool,
}

impl ConsolidatorConfig {
    /// Returns a builder with no trigger set and bar-time rounding enabled.
    #[inline]
    #[must_use]
    pub fn builder() -> ConsolidatorConfigBuilder {
        ConsolidatorConfigBuilder::new()
    }

    /// Bars spanning `period`, start times floor-aligned to it.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPeriod`] when the period is not whole milliseconds.
    pub fn timed(period: Duration) -> Result<Self> {
        Self::builder().period(period).try_build()
    }

    /// Bars of `count` samples each.
    #[must_use]
    pub fn counted(count: NonZero<usize>) -> Self {
        Self {
            period: None,
            count: Some(count),
            round_bar_time: true,
        }
    }

    /// Time span of a bar, if time-triggered.
    #[inline]
    #[must_use]
    pub fn period(&self) -> Option<Duration> {
        self.period.map(Duration::from_millis)
    }

    /// Samples per bar, if count-triggered.
    #[inline]
    #[must_use]
    pub fn count(&self) -> Option<usize> {
        self.count.map(NonZero::get)
    }

    /// Whether bar start times are floor-aligned to the period.
    ///
    /// Applies only when consolidating by period alone.
    #[inline]
    #[must_use]
    pub fn round_bar_time(&self) -> bool {
        self.round_bar_time
    }
}

impl Display for ConsolidatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.count, self.period) {
            (Some(count), Some(period)) => {
                write!(f, "ConsolidatorConfig({count} samples or {period}ms)")
            }
            (Some(count), None) => write!(f, "ConsolidatorConfig({count} samples)"),
            (None, Some(period)) => write!(f, "ConsolidatorConfig({period}ms)"),
            (None, None) => write!(f, "ConsolidatorConfig()"),
        }
    }
}

/// Builder for [`ConsolidatorConfig`].
///
/// At least one of [`period`](Self::period) and [`count`](Self::count) must
/// be set. Bar-time rounding defaults to on.
pub struct ConsolidatorConfigBuilder {
    period: Option<Duration>,
    count: Option<NonZero<usize>>,
    round_bar_time: bool,
}

impl ConsolidatorConfigBuilder {
    fn new() -> Self {
        Self {
            period: None,
            count: None,
            round_bar_time: true,
        }
    }

    /// Sets the bar span. Zero emits a bar for every sample.
    #[inline]
    #[must_use]
    pub fn period(mut self, period: Duration) -> Self {
        self.period.replace(period);
        self
    }

    /// Sets the number of samples per bar.
    #[inline]
    #[must_use]
    pub fn count(mut self, count: NonZero<usize>) -> Self {
        self.count.replace(count);
        self
    }

    /// Enables or disables floor-aligning bar start times to the period.
    #[inline]
    #[must_use]
    pub fn round_bar_time(mut self, round: bool) -> Self {
        self.round_bar_time = round;
        self
    }

    /// Validates and builds the config.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingTrigger`] when neither period nor count is set.
    /// - [`Error::InvalidPeriod`] when the period has a sub-millisecond part
    ///   or does not fit a `u64` of milliseconds.
    pub fn try_build(self) -> Result<ConsolidatorConfig> {
        if self.period.is_none() && self.count.is_none() {
            return Err(Error::MissingTrigger);
        }

        Ok(ConsolidatorConfig {
            period: self.period.map(period_millis).transpose()?,
            count: self.count,
            round_bar_time: self.round_bar_time,
        })
    }

    /// Builds the config, panicking on invalid configuration.
    ///
    /// # Panics
    ///
    /// On any error [`try_build`](Self::try_build) would return.
    #[must_use]
    pub fn build(self) -> ConsolidatorConfig {
        self.try_build().unwrap_or_else(|e| panic!("{e}"))
    }
}

fn period_millis(period: Duration) -> Result<Timestamp> {
    if period.subsec_nanos() % 1_000_000 != 0 {
        return Err(Error::InvalidPeriod {
            period,
            reason: "period must be whole milliseconds",
        });
    }

    Timestamp::try_from(period.as_millis()).map_err(|_| Error::InvalidPeriod {
        period,
        reason: "period does not fit in u64 milliseconds",
    })
}

type Handler = Box<dyn FnMut(&Bar)>;

/// Aggregates a time-ordered stream of samples into [`Bar`]s.
///
/// Accepts anything implementing [`Ohlcv`]: [`Tick`](crate::Tick)s, bars
/// from another consolidator, or your own types.
///
/// # Triggers
///
/// - **Period**: a bar covers the half-open window `[T, T + period)`. The
///   first sample at or past `T + period` emits the bar and starts the next
///   one. With period alone, `T` is floor-aligned to the period unless
///   [`round_bar_time`](ConsolidatorConfigBuilder::round_bar_time) is off.
///   A zero period emits every sample as its own bar.
/// - **Count**: the `count`-th sample is aggregated and the bar is emitted
///   immediately.
/// - **Both**: whichever fires first. The firing sample is aggregated into
///   the emitted bar, and start times are not rounded. A period emission
///   leaves the sample counter running, so the next bar can fire on count
///   with fewer than `count` samples.
///
/// Emitted bars carry the configured period. Without one, count bars made of
/// instantaneous samples span the time since the previous emission, and
/// count bars made of bars keep their summed periods.
///
/// # Subscribers
///
/// Handlers registered with [`subscribe`](Self::subscribe) run synchronously
/// on every emission, in registration order, before
/// [`update`](Self::update) returns the bar.
///
/// # Example
///
/// ```
/// use barflow::{Consolidator, ConsolidatorConfig, Tick};
/// use std::time::Duration;
///
/// let config = ConsolidatorConfig::timed(Duration::from_secs(60)).unwrap();
/// let mut minutes = Consolidator::new(config);
///
/// assert_eq!(minutes.update(&Tick::new(0, 10.0)), None);
/// assert_eq!(minutes.update(&Tick::new(30_000, 12.0)), None);
///
/// let bar = minutes.update(&Tick::new(60_000, 11.0)).unwrap();
/// assert_eq!((bar.open_time, bar.period), (0, 60_000));
/// assert_eq!((bar.open, bar.high, bar.close), (10.0, 12.0, 12.0));
/// ```
pub struct Consolidator {
    config: ConsolidatorConfig,
    working: Option<Bar>,
    pending: usize,
    last_emit: Option<Timestamp>,
    last_open_time: Option<Timestamp>,
    handlers: Vec<Handler>,
}

impl Consolidator {
    /// Creates a consolidator with no subscribers.
    #[must_use]
    pub fn new(config: ConsolidatorConfig) -> Self {
        debug!(config = %config, "creating consolidator");

        Self {
            config,
            working: None,
            pending: 0,
            last_emit: None,
            last_open_time: None,
            handlers: Vec::new(),
        }
    }

    /// The trigger policy.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ConsolidatorConfig {
        &self.config
    }

    /// Registers a handler invoked with every emitted bar.
    pub fn subscribe(&mut self, handler: impl FnMut(&Bar) + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Copy of the bar under construction, `None` right after an emission.
    #[inline]
    #[must_use]
    pub fn working_bar(&self) -> Option<Bar> {
        self.working
    }

    /// Feeds one sample and returns the bar it completes, if any.
    ///
    /// Samples must arrive in non-decreasing `open_time` order; debug builds
    /// panic otherwise.
    pub fn update(&mut self, sample: &impl Ohlcv) -> Option<Bar> {
        let time = sample.open_time();
        advance_time(&mut self.last_open_time, time);

        let mut fire = false;
        let mut aggregate_first = self.config.count.is_some();

        if let Some(count) = self.config.count {
            self.pending += 1;
            if self.pending >= count.get() {
                self.pending = 0;
                fire = true;
            }
        }

        let last_emit = *self.last_emit.get_or_insert(time);

        if let Some(period) = self.config.period {
            if self
                .working
                .is_some_and(|bar| time.saturating_sub(bar.open_time) >= period)
            {
                fire = true;
            }
            if period == 0 {
                fire = true;
                aggregate_first = true;
            }
        }

        if aggregate_first {
            self.aggregate(sample);
        }

        let emitted = if fire {
            let emitted = self.working.take().map(|mut bar| {
                if let Some(period) = self.config.period {
                    bar.period = period;
                } else if sample.period().is_none() {
                    bar.period = time.saturating_sub(last_emit);
                }
                bar
            });
            self.last_emit = Some(time);

            if let Some(bar) = &emitted {
                self.publish(bar);
            }
            emitted
        } else {
            None
        };

        if !aggregate_first {
            self.aggregate(sample);
        }

        emitted
    }

    /// Drops the working bar and trigger state. Subscribers stay registered.
    pub fn reset(&mut self) {
        debug!(config = %self.config, "resetting consolidator");

        self.working = None;
        self.pending = 0;
        self.last_emit = None;
        self.last_open_time = None;
    }

    fn aggregate(&mut self, sample: &impl Ohlcv) {
        let span = sample.period().unwrap_or(0);

        match &mut self.working {
            Some(bar) => {
                bar.high = bar.high.max(sample.high());
                bar.low = bar.low.min(sample.low());
                bar.close = sample.close();
                bar.volume += sample.volume();
                bar.period += span;
            }
            None => {
                let open_time = self.bar_time(sample.open_time());
                self.working = Some(
                    Bar::new(
                        open_time,
                        span,
                        sample.open(),
                        sample.high(),
                        sample.low(),
                        sample.close(),
                    )
                    .with_volume(sample.volume()),
                );
            }
        }
    }

    fn bar_time(&self, time: Timestamp) -> Timestamp {
        match (self.config.period, self.config.count) {
            (Some(period), None) if self.config.round_bar_time && period > 0 => {
                time - time % period
            }
            _ => time,
        }
    }

    fn publish(&mut self, bar: &Bar) {
        trace!(
            open_time = bar.open_time,
            period = bar.period,
            close = bar.close,
            "bar consolidated"
        );

        for handler in &mut self.handlers {
            handler(bar);
        }
    }
}

impl std::fmt::Debug for Consolidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consolidator")
            .field("config", &self.config)
            .field("working", &self.working)
            .field("pending", &self.pending)
            .field("last_emit", &self.last_emit)
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

impl Display for Consolidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.config.count, self.config.period) {
            (Some(count), Some(period)) => write!(f, "Consolidator({count} samples or {period}ms)"),
            (Some(count), None) => write!(f, "Consolidator({count} samples)"),
            (None, Some(period)) => write!(f, "Consolidator({period}ms)"),
            (None, None) => write!(f, "Consolidator()"),
        }
    }
}
