mod fixtures;

use fixtures::reference_test;

// EMA is seeded with the first close, so the whole history feeds every
// value; the tolerance covers f64 drift only.
reference_test!(
    ema_20_close,
    Ema,
    EmaConfig::close(nz(20)),
    "tests/fixtures/data/ema-20-close.csv",
    1e-6
);

reference_test!(
    zlema_20_close,
    ZeroLagEma,
    EmaConfig::close(nz(20)),
    "tests/fixtures/data/zlema-20-close.csv",
    1e-6
);

mod convergence {
    use super::fixtures::{load_reference_ohlcvs, run};
    use barflow::{Ema, EmaConfig, IndicatorConfig, IndicatorConfigBuilder, ZeroLagEma};
    use std::num::NonZero;

    #[test]
    fn enforced_convergence_delays_readiness_only() {
        let bars = load_reference_ohlcvs();
        let length = NonZero::new(20).unwrap();

        let mut plain = Ema::new(EmaConfig::close(length));
        let mut strict = Ema::new(
            EmaConfig::builder()
                .length(length)
                .enforce_convergence(true)
                .build(),
        );

        for (i, bar) in bars.iter().enumerate() {
            assert_eq!(plain.update(bar).to_bits(), strict.update(bar).to_bits());
            // 3 × (20 + 1)
            assert_eq!(strict.is_ready(), i + 1 >= 63, "bar {i}");
        }
    }

    #[test]
    fn zlema_tracks_closer_than_ema() {
        let bars = load_reference_ohlcvs();
        let config = EmaConfig::close(NonZero::new(20).unwrap());

        let ema = run(&mut Ema::new(config), &bars);
        let zlema = run(&mut ZeroLagEma::new(config), &bars);

        let error = |values: &[f64]| -> f64 {
            values
                .iter()
                .zip(&bars)
                .skip(20)
                .map(|(v, bar)| (v - bar.close).abs())
                .sum()
        };
        assert!(error(&zlema) < error(&ema));
    }
}
