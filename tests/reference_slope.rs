mod fixtures;

use fixtures::reference_test;

// Ready once the EMA(5) is ready and has filled ten regression slots.
reference_test!(
    slope_10_5_close,
    Slope,
    SlopeConfig::close(nz(10), nz(5)),
    "tests/fixtures/data/slope-10-5-close.csv",
    1e-6
);

mod regression_window {
    use super::fixtures::{load_reference_ohlcvs, run};
    use barflow::{Slope, SlopeConfig};
    use std::num::NonZero;

    #[test]
    fn unit_regression_is_flat() {
        let bars = load_reference_ohlcvs();
        let one = NonZero::new(1).unwrap();
        let mut slope = Slope::new(SlopeConfig::close(one, NonZero::new(5).unwrap()));

        assert!(run(&mut slope, &bars).iter().all(|&v| v == 0.0));
        assert!(slope.is_ready());
    }
}
