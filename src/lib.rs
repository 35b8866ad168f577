//! Streaming bar consolidation and incremental technical indicators.
//!
//! Raw samples flow one way: a [`Consolidator`] turns a time-ordered stream
//! of [`Tick`]s (or finer [`Bar`]s) into bars, and indicators consume those
//! bars one at a time. Every indicator produces exactly the value a batch
//! recomputation over the same history would, using memory bounded by its
//! configured window.
//!
//! Indicators accept any type implementing [`Ohlcv`]. `update` always returns
//! a value; [`value`](Ema::value) is `None` until the indicator is ready.
//!
//! Each indicator type ([`Ema`], [`ZeroLagEma`], [`Maximum`], [`Minimum`],
//! [`LinRegBullBear`], [`Slope`], [`Sar`]) exposes [`new`](Ema::new),
//! [`update`](Ema::update), [`value`](Ema::value) and the rest of
//! [`Indicator`] as inherent methods, so no trait import is needed. Import
//! [`Indicator`] only for generic code.
//!
//! # Example
//!
//! ```
//! use barflow::{Consolidator, ConsolidatorConfig, Ema, EmaConfig, Tick};
//! use std::{cell::RefCell, num::NonZero, rc::Rc, time::Duration};
//!
//! let ema = Rc::new(RefCell::new(Ema::new(EmaConfig::close(NonZero::new(3).unwrap()))));
//! let mut minutes = Consolidator::new(ConsolidatorConfig::timed(Duration::from_secs(60)).unwrap());
//!
//! let sink = Rc::clone(&ema);
//! minutes.subscribe(move |bar| {
//!     sink.borrow_mut().update(bar);
//! });
//!
//! for second in 0..=180 {
//!     minutes.update(&Tick::new(second * 1_000, 100.0 + second as f64));
//! }
//!
//! // three minute bars closed at 159, 219 and 279 → 159, 189, 234
//! assert_eq!(ema.borrow().value(), Some(234.0));
//! ```

mod bar;
mod consolidator;
mod ema;
mod error;
mod extrema;
mod indicator;
mod lrbb;
mod ohlcv;
mod price_source;
mod rolling_window;
mod sar;
mod slope;
mod zlema;

pub use crate::bar::{Bar, Tick};
pub use crate::consolidator::{Consolidator, ConsolidatorConfig, ConsolidatorConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::indicator::{Indicator, IndicatorConfig, IndicatorConfigBuilder};
pub use crate::ohlcv::{Ohlcv, Price, Timestamp};
pub use crate::price_source::PriceSource;
pub use crate::rolling_window::RollingWindow;

pub use crate::ema::{Ema, EmaConfig, EmaConfigBuilder};
pub use crate::extrema::{ExtremaConfig, ExtremaConfigBuilder, Extremum, Maximum, Minimum};
pub use crate::lrbb::{LinRegBullBear, LinRegBullBearConfig, LinRegBullBearConfigBuilder};
pub use crate::sar::{Position, Sar, SarConfig, SarConfigBuilder};
pub use crate::slope::{Slope, SlopeConfig, SlopeConfigBuilder};
pub use crate::zlema::ZeroLagEma;

macro_rules! impl_indicator_methods {
    ($type:ty, $config:ty, $output:ty) => {
        impl $type {
            /// See [`Indicator::new`].
            #[must_use]
            pub fn new(config: $config) -> Self {
                <Self as Indicator>::new(config)
            }

            /// See [`Indicator::config`].
            #[must_use]
            #[inline]
            pub fn config(&self) -> &$config {
                <Self as Indicator>::config(self)
            }

            /// See [`Indicator::update`].
            #[inline]
            pub fn update(&mut self, sample: &impl Ohlcv) -> $output {
                <Self as Indicator>::update(self, sample)
            }

            /// See [`Indicator::current`].
            #[must_use]
            #[inline]
            pub fn current(&self) -> $output {
                <Self as Indicator>::current(self)
            }

            /// See [`Indicator::is_ready`].
            #[must_use]
            #[inline]
            pub fn is_ready(&self) -> bool {
                <Self as Indicator>::is_ready(self)
            }

            /// See [`Indicator::samples`].
            #[must_use]
            #[inline]
            pub fn samples(&self) -> usize {
                <Self as Indicator>::samples(self)
            }

            /// See [`Indicator::reset`].
            pub fn reset(&mut self) {
                <Self as Indicator>::reset(self);
            }

            /// See [`Indicator::value`].
            #[must_use]
            #[inline]
            pub fn value(&self) -> Option<$output> {
                <Self as Indicator>::value(self)
            }
        }
    };
}

impl_indicator_methods!(Ema, EmaConfig, Price);
impl_indicator_methods!(ZeroLagEma, EmaConfig, Price);
impl_indicator_methods!(Maximum, ExtremaConfig, Price);
impl_indicator_methods!(Minimum, ExtremaConfig, Price);
impl_indicator_methods!(LinRegBullBear, LinRegBullBearConfig, Price);
impl_indicator_methods!(Slope, SlopeConfig, Price);
impl_indicator_methods!(Sar, SarConfig, Price);

#[cfg(test)]
mod test_util;
