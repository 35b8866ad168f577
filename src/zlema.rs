use std::fmt::Display;

use crate::{Ema, EmaConfig, Indicator, Ohlcv, Price, Timestamp, indicator::advance_time};

/// Zero-Lag Exponential Moving Average (ZLEMA).
///
/// Corrects the lag of an EMA by adding back the difference between the
/// EMA and an EMA of itself:
///
/// ```text
/// e1    = EMA(price)
/// e2    = EMA(e1)
/// ZLEMA = e1 + (e1 − e2)
/// ```
///
/// Both inner averages share the configured length and seeding; the
/// indicator is ready once both are.
///
/// # Example
///
/// ```
/// use barflow::{EmaConfig, Tick, ZeroLagEma};
/// use std::num::NonZero;
///
/// let mut zlema = ZeroLagEma::new(EmaConfig::close(NonZero::new(3).unwrap()));
///
/// // e1 = 2, e2 = 2
/// assert_eq!(zlema.update(&Tick::new(1, 2.0)), 2.0);
/// // e1 = 3, e2 = 2.5 → 3 + 0.5
/// assert_eq!(zlema.update(&Tick::new(2, 4.0)), 3.5);
/// ```
#[derive(Clone, Debug)]
pub struct ZeroLagEma {
    config: EmaConfig,
    ema: Ema,
    ema_of_ema: Ema,
    current: Price,
    last_open_time: Option<Timestamp>,
}

impl ZeroLagEma {
    /// Feeds a raw price, bypassing the configured source.
    #[inline]
    pub fn update_price(&mut self, price: Price) -> Price {
        let e1 = self.ema.update_price(price);
        let e2 = self.ema_of_ema.update_price(e1);

        self.current = e1 + (e1 - e2);
        self.current
    }
}

impl Indicator for ZeroLagEma {
    type Config = EmaConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            ema: Ema::new(config),
            ema_of_ema: Ema::new(config),
            current: 0.0,
            last_open_time: None,
        }
    }

    fn config(&self) -> &EmaConfig {
        &self.config
    }

    #[inline]
    fn update(&mut self, sample: &impl Ohlcv) -> Price {
        advance_time(&mut self.last_open_time, sample.open_time());

        self.update_price(self.config.source().extract(sample))
    }

    #[inline]
    fn current(&self) -> Price {
        self.current
    }

    #[inline]
    fn is_ready(&self) -> bool {
        self.ema.is_ready() && self.ema_of_ema.is_ready()
    }

    #[inline]
    fn samples(&self) -> usize {
        self.ema.samples()
    }

    fn reset(&mut self) {
        self.ema.reset();
        self.ema_of_ema.reset();
        self.current = 0.0;
        self.last_open_time = None;
    }
}

impl Display for ZeroLagEma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ZLEMA({}, {})", self.config.length(), self.config.source())
    }
}
