#![allow(dead_code)]

use barflow::{Indicator, Ohlcv, Price, Timestamp};
use serde::{Deserialize, de::DeserializeOwned};

/// Span of every bar in the hourly fixture.
pub const HOUR: Timestamp = 3_600_000;

/// OHLCV bar parsed from a fixture CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct RefBar {
    pub open_time: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Ohlcv for RefBar {
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
        Some(HOUR)
    }
}

/// Reference value with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefValue {
    pub open_time: u64,
    pub expected: f64,
}

const OHLCV_PATH: &str = "tests/fixtures/data/bars-1h.csv";

/// Load the hourly reference bars.
pub fn load_reference_ohlcvs() -> Vec<RefBar> {
    load_records(OHLCV_PATH, "invalid OHLCV record")
}

/// Load bars aggregated by a batch pass over the hourly fixture.
pub fn load_reference_bars(path: &str) -> Vec<RefBar> {
    load_records(path, "invalid bar record")
}

/// Load single-value reference data.
pub fn load_ref_values(path: &str) -> Vec<RefValue> {
    load_records(path, "invalid reference record")
}

/// Assert two f64 values are within tolerance.
pub fn assert_near(actual: f64, expected: f64, tolerance: f64, context: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{context}: expected {expected:.10}, got {actual:.10}, diff {diff:.2e} > tolerance {tolerance:.2e}"
    );
}

/// Feeds every bar and collects the raw outputs.
pub fn run<I>(indicator: &mut I, bars: &[RefBar]) -> Vec<Price>
where
    I: Indicator<Output = Price>,
{
    bars.iter().map(|bar| indicator.update(bar)).collect()
}

/// Runs the bars, resets, runs them again and demands bit-identical output.
pub fn assert_replay_identical<I>(indicator: &mut I, bars: &[RefBar])
where
    I: Indicator<Output = Price>,
{
    let first = run(indicator, bars);
    let ready = indicator.is_ready();

    indicator.reset();
    assert_eq!(indicator.samples(), 0, "{indicator}: samples survived reset");
    assert!(!indicator.is_ready(), "{indicator}: ready after reset");
    assert_eq!(indicator.value(), None, "{indicator}: value after reset");

    let second = run(indicator, bars);
    assert_eq!(indicator.is_ready(), ready);
    for (i, (a, b)) in first.iter().zip(&second).enumerate() {
        assert!(
            a.to_bits() == b.to_bits(),
            "{indicator}: replay diverged at bar {i}: first={a}, second={b}"
        );
    }
}

/// Generate reference match + reset replay tests for a single-value indicator.
///
/// Usage: `reference_test!(ema_20, Ema, EmaConfig::close(nz(20)), "tests/fixtures/data/ema-20-close.csv", 1e-6);`
#[allow(unused_macros)]
macro_rules! reference_test {
    ($name:ident, $ind:ty, $config:expr, $ref_path:expr, $tolerance:expr) => {
        mod $name {
            use super::fixtures::*;
            use barflow::*;
            use std::num::NonZero;

            #[allow(dead_code)]
            fn nz(n: usize) -> NonZero<usize> {
                NonZero::new(n).unwrap()
            }

            #[test]
            fn matches_reference() {
                let bars = load_reference_ohlcvs();
                let reference = load_ref_values($ref_path);
                let config = $config;
                let mut ind = <$ind>::new(config);

                let mut ref_idx = 0;
                for bar in &bars {
                    ind.update(bar);

                    if ref_idx < reference.len()
                        && bar.open_time == reference[ref_idx].open_time
                    {
                        let value = ind.value().unwrap_or_else(|| {
                            panic!("{} returned None at t={}", stringify!($name), bar.open_time)
                        });
                        assert_near(
                            value,
                            reference[ref_idx].expected,
                            $tolerance,
                            &format!(
                                "{} at bar {ref_idx} (t={})",
                                stringify!($name),
                                bar.open_time
                            ),
                        );
                        ref_idx += 1;
                    } else {
                        assert_eq!(
                            ind.value(),
                            None,
                            "{} ready before the reference at t={}",
                            stringify!($name),
                            bar.open_time
                        );
                    }
                }

                assert_eq!(
                    ref_idx,
                    reference.len(),
                    "not all reference values checked: {ref_idx}/{}",
                    reference.len()
                );
            }

            #[test]
            fn reset_replays_identically() {
                let bars = load_reference_ohlcvs();
                let mut ind = <$ind>::new($config);
                assert_replay_identical(&mut ind, &bars);
            }
        }
    };
}

#[allow(unused_imports)]
pub(crate) use reference_test;

fn load_records<D>(path: &str, expect_msg: &str) -> Vec<D>
where
    D: DeserializeOwned,
{
    let mut rdr =
        csv::Reader::from_path(path).unwrap_or_else(|e| panic!("failed to open {path}: {e}"));

    rdr.deserialize().map(|r| r.expect(expect_msg)).collect()
}
