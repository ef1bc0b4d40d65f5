use rust_decimal::Decimal;

/// Tracks peak equity and the percentage distance from it.
#[derive(Debug, Default, Clone)]
pub struct DrawdownMonitor {
    peak: Option<Decimal>,
    current: Decimal,
}

impl DrawdownMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the latest equity reading and return the drawdown percentage
    /// from the running peak.
    pub fn update(&mut self, equity: Decimal) -> Decimal {
        self.current = equity;
        let peak = match self.peak {
            Some(peak) if peak >= equity => peak,
            _ => {
                self.peak = Some(equity);
                equity
            }
        };

        if peak <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (peak - equity) / peak * Decimal::ONE_HUNDRED
    }

    pub fn drawdown_percent(&self) -> Decimal {
        match self.peak {
            Some(peak) if peak > Decimal::ZERO => {
                (peak - self.current) / peak * Decimal::ONE_HUNDRED
            }
            _ => Decimal::ZERO,
        }
    }

    /// Forget the running peak; the next update seeds a fresh one.
    pub fn reset(&mut self) {
        self.peak = None;
        self.current = Decimal::ZERO;
    }
}
