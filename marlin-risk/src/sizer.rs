use rust_decimal::Decimal;

/// Converts approved risk into an order quantity.
///
/// `quantity = equity * riskPct / |entry - stop|`, where the risk
/// percentage is the requested figure capped by the portfolio limit. The
/// result is clamped up to the venue's minimum tradeable unit and floored
/// to its quantity step.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    min_quantity: Decimal,
    quantity_step: Decimal,
    /// Stop distance assumed when a signal carries no stop-loss.
    default_stop_distance_pct: Decimal,
}

impl Default for PositionSizer {
    fn default() -> Self {
        Self {
            min_quantity: Decimal::new(1, 3),
            quantity_step: Decimal::new(1, 3),
            default_stop_distance_pct: Decimal::ONE,
        }
    }
}

impl PositionSizer {
    pub fn new(min_quantity: Decimal, quantity_step: Decimal) -> Self {
        Self {
            min_quantity,
            quantity_step,
            ..Self::default()
        }
    }

    /// Size a position. Returns zero when the stop distance is zero.
    pub fn size(
        &self,
        equity: Decimal,
        entry: Decimal,
        stop_loss: Option<Decimal>,
        requested_risk_pct: Option<Decimal>,
        max_risk_pct: Decimal,
    ) -> Decimal {
        let distance = match stop_loss {
            Some(stop) => (entry - stop).abs(),
            None => entry * self.default_stop_distance_pct / Decimal::ONE_HUNDRED,
        };
        if distance.is_zero() {
            return Decimal::ZERO;
        }

        let risk_pct = requested_risk_pct
            .map(|requested| requested.min(max_risk_pct))
            .unwrap_or(max_risk_pct);
        let risk_capital = equity * risk_pct / Decimal::ONE_HUNDRED;
        let quantity = risk_capital / distance;

        if quantity < self.min_quantity {
            return self.min_quantity;
        }

        // Floor to the venue's step so the order is never over-sized.
        (quantity / self.quantity_step).floor() * self.quantity_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_risk_formula() {
        let sizer = PositionSizer::default();
        // 1% of 10_000 = 100 at risk; stop distance 2 -> 50 units.
        let quantity = sizer.size(dec!(10000), dec!(100), Some(dec!(98)), None, dec!(1));
        assert_eq!(quantity, dec!(50));
    }

    #[test]
    fn test_requested_risk_capped_by_limit() {
        let sizer = PositionSizer::default();
        let capped = sizer.size(dec!(10000), dec!(100), Some(dec!(98)), Some(dec!(5)), dec!(1));
        let limit_only = sizer.size(dec!(10000), dec!(100), Some(dec!(98)), None, dec!(1));
        assert_eq!(capped, limit_only);

        let smaller = sizer.size(dec!(10000), dec!(100), Some(dec!(98)), Some(dec!(0.5)), dec!(1));
        assert_eq!(smaller, dec!(25));
    }

    #[test]
    fn test_zero_stop_distance_returns_zero() {
        let sizer = PositionSizer::default();
        assert_eq!(
            sizer.size(dec!(10000), dec!(100), Some(dec!(100)), None, dec!(1)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_tiny_equity_clamps_to_minimum_unit() {
        let sizer = PositionSizer::default();
        let quantity = sizer.size(dec!(1), dec!(50000), Some(dec!(49000)), None, dec!(1));
        assert_eq!(quantity, dec!(0.001));
    }

    #[test]
    fn test_quantity_floored_to_step() {
        let sizer = PositionSizer::new(dec!(0.001), dec!(0.01));
        // Raw quantity 50.005 floors to 50.00 on a 0.01 step.
        let quantity = sizer.size(dec!(10001), dec!(100), Some(dec!(98)), None, dec!(1));
        assert_eq!(quantity, dec!(50.00));
    }

    #[test]
    fn test_sized_risk_never_exceeds_cap() {
        let sizer = PositionSizer::default();
        let equity = dec!(10000);
        let entry = dec!(123.45);
        let stop = dec!(121.01);
        let quantity = sizer.size(equity, entry, Some(stop), None, dec!(2));

        let risked = quantity * (entry - stop).abs() / equity * Decimal::ONE_HUNDRED;
        assert!(risked <= dec!(2.0001));
    }
}
