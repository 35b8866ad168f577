use std::fmt::Display;

use crate::{Ohlcv, Price, Timestamp};

/// An OHLCV aggregate over `[open_time, open_time + period)`.
///
/// Produced by the [`Consolidator`](crate::Consolidator). Bars are plain
/// values: consumers receive copies and cannot alter the consolidator's
/// state through them.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bar {
    /// Bar start, in milliseconds.
    pub open_time: Timestamp,
    /// Span covered by the bar, in milliseconds.
    pub period: Timestamp,
    /// First price.
    pub open: Price,
    /// Highest price.
    pub high: Price,
    /// Lowest price.
    pub low: Price,
    /// Last price.
    pub close: Price,
    /// Summed volume.
    pub volume: f64,
}

impl Bar {
    /// Creates a bar with zero volume.
    #[must_use]
    pub fn new(
        open_time: Timestamp,
        period: Timestamp,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
    ) -> Self {
        Self {
            open_time,
            period,
            open,
            high,
            low,
            close,
            volume: 0.0,
        }
    }

    /// Sets the volume.
    #[must_use]
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }
}

impl Ohlcv for Bar {
    fn open(&self) -> Price {
        self.open
    }

    fn high(&self) -> Price {
        self.high
    }

    fn low(&self) -> Price {
        self.low
    }

    fn close(&self) -> Price {
        self.close
    }

    fn open_time(&self) -> Timestamp {
        self.open_time
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn period(&self) -> Option<Timestamp> {
        Some(self.period)
    }
}

impl Display for Bar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bar(t={}, span={}, o={}, h={}, l={}, c={}, v={})",
            self.open_time, self.period, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

/// A single traded price at an instant.
///
/// All four OHLC accessors return `price`; [`Ohlcv::period`] is `None`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick {
    /// Trade time, in milliseconds.
    pub time: Timestamp,
    /// Trade price.
    pub price: Price,
    /// Trade size.
    pub volume: f64,
}

impl Tick {
    /// Creates a tick with zero volume.
    #[must_use]
    pub fn new(time: Timestamp, price: Price) -> Self {
        Self {
            time,
            price,
            volume: 0.0,
        }
    }

    /// Sets the volume.
    #[must_use]
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }
}

impl Ohlcv for Tick {
    fn open(&self) -> Price {
        self.price
    }

    fn high(&self) -> Price {
        self.price
    }

    fn low(&self) -> Price {
        self.price
    }

    fn close(&self) -> Price {
        self.price
    }

    fn open_time(&self) -> Timestamp {
        self.time
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}
