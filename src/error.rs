use thiserror::Error;

/// Configuration errors raised when an indicator, window, or consolidator
/// is constructed.
///
/// Updates never fail: once built, every component accepts any sample.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A rolling window was requested with zero capacity.
    #[error("invalid capacity {capacity}: capacity must be at least 1")]
    InvalidCapacity {
        /// The rejected capacity.
        capacity: usize,
    },

    /// A builder was finished without setting its window length.
    #[error("length is required")]
    MissingLength,

    /// A consolidator was configured with neither a period nor a count.
    #[error("consolidator requires a period, a count, or both")]
    MissingTrigger,

    /// A consolidation period cannot be expressed in whole milliseconds.
    #[error("invalid period {period:?}: {reason}")]
    InvalidPeriod {
        /// The rejected period.
        period: std::time::Duration,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Parabolic SAR acceleration parameters are inconsistent.
    #[error("invalid acceleration factor (init={init}, increment={increment}, max={max}): {reason}")]
    InvalidAcceleration {
        /// Initial acceleration factor.
        init: f64,
        /// Per-extreme increment.
        increment: f64,
        /// Cap.
        max: f64,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Convenience alias for results carrying an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
