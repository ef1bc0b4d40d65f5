use marlin_ta::{
    AverageTrueRange, BollingerBands, CandleSample, ExponentialMovingAverage, Indicator,
    IndicatorError, Macd, RelativeStrengthIndex, SimpleMovingAverage, SuperTrend, Trend,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn sma_and_ema_ready_after_exactly_period_updates() {
    let mut sma = SimpleMovingAverage::new(5);
    let mut ema = ExponentialMovingAverage::new(5);

    for sample in 1..=4 {
        assert_eq!(sma.update(Decimal::from(sample)), None);
        assert_eq!(ema.update(Decimal::from(sample)), None);
    }
    assert_eq!(sma.update(dec!(5)), Some(dec!(3)));
    assert_eq!(ema.update(dec!(5)), Some(dec!(3)));
}

#[test]
fn rsi_stays_in_range_and_pins_on_pure_gains() {
    let mut rsi = RelativeStrengthIndex::new(14);
    let mut sample = dec!(100);
    for step in 0..50 {
        // Alternating but upward-biased walk.
        sample += if step % 3 == 0 { dec!(-1) } else { dec!(2) };
        if let Some(value) = rsi.update(sample) {
            assert!(value >= Decimal::ZERO);
            assert!(value <= dec!(100));
        }
    }

    let mut climbing = RelativeStrengthIndex::new(3);
    for sample in [1, 2, 3, 4, 5] {
        climbing.update(Decimal::from(sample));
    }
    assert_eq!(climbing.value(), Some(dec!(100)));
}

#[test]
fn macd_constructor_rejects_inverted_periods() {
    assert!(matches!(
        Macd::new(26, 12, 9),
        Err(IndicatorError::FastNotBelowSlow { .. })
    ));
}

#[test]
fn bollinger_band_ordering() {
    let mut bands = BollingerBands::new(5, dec!(2));
    let samples = [100, 103, 98, 105, 96, 104, 99, 102];
    let mut seen = 0;
    for sample in samples {
        if let Some(output) = bands.update(Decimal::from(sample)) {
            assert!(output.upper >= output.middle && output.middle >= output.lower);
            seen += 1;
        }
    }
    assert_eq!(seen, samples.len() - 4);
}

#[test]
fn atr_and_supertrend_track_a_breakout() {
    let mut atr = AverageTrueRange::new(3);
    let mut supertrend = SuperTrend::new(3, dec!(2));

    let quiet = CandleSample {
        high: dec!(101),
        low: dec!(99),
        close: dec!(100),
    };
    for _ in 0..3 {
        atr.update(quiet);
        supertrend.update(quiet);
    }
    assert_eq!(atr.value(), Some(dec!(2)));
    assert_eq!(supertrend.value().unwrap().trend, Trend::Down);

    let breakout = CandleSample {
        high: dec!(112),
        low: dec!(106),
        close: dec!(111),
    };
    let output = supertrend.update(breakout).unwrap();
    assert_eq!(output.trend, Trend::Up);
}

#[test]
fn reset_restores_warmup_behaviour() {
    let mut macd = Macd::new(2, 3, 2).unwrap();
    for sample in 1..=6 {
        macd.update(Decimal::from(sample));
    }
    assert!(macd.is_ready());

    macd.reset();
    assert!(!macd.is_ready());
    assert_eq!(macd.update(dec!(1)), None);
}
