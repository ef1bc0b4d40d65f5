use chrono::{DateTime, Utc};
use fnv::FnvHashMap;
use marlin_core::{Order, PortfolioSnapshot, Position, PositionSide, Side, Symbol};
use rust_decimal::Decimal;
use tracing::debug;

/// Builds the portfolio view the risk service publishes to cache.
///
/// Fills fold into per-symbol positions: same-direction fills average the
/// entry, opposite-direction fills realise PnL and may flip the position.
/// Ticks re-mark open positions so unrealised PnL stays current.
#[derive(Debug)]
pub struct PortfolioLedger {
    initial_equity: Decimal,
    realized: Decimal,
    positions: FnvHashMap<Symbol, Position>,
}

impl PortfolioLedger {
    pub fn new(initial_equity: Decimal) -> Self {
        Self {
            initial_equity,
            realized: Decimal::ZERO,
            positions: FnvHashMap::default(),
        }
    }

    /// Apply a filled order to the ledger.
    pub fn apply_fill(&mut self, order: &Order) {
        if order.filled_quantity.is_zero() {
            return;
        }
        let price = order.filled_price;
        let quantity = order.filled_quantity;
        self.realized -= order.commission;

        let fill_side = PositionSide::from(order.side);
        match self.positions.get_mut(&order.symbol) {
            None => {
                self.positions.insert(
                    order.symbol.clone(),
                    Position::open(order.symbol.clone(), fill_side, price, quantity),
                );
            }
            Some(position) if position.side == fill_side => {
                // Scaling in: volume-weighted entry.
                let total = position.quantity + quantity;
                position.entry_price = (position.entry_price * position.quantity
                    + price * quantity)
                    / total;
                position.quantity = total;
                position.mark(price);
            }
            Some(position) => {
                let closed = position.quantity.min(quantity);
                let pnl = position.close_pnl(price, closed);
                self.realized += pnl;
                position.quantity -= closed;
                debug!(symbol = %order.symbol, %pnl, "position reduced");

                let leftover = quantity - closed;
                if position.quantity.is_zero() {
                    self.positions.remove(&order.symbol);
                }
                if leftover > Decimal::ZERO {
                    self.positions.insert(
                        order.symbol.clone(),
                        Position::open(order.symbol.clone(), fill_side, price, leftover),
                    );
                }
            }
        }
    }

    /// Re-mark the symbol's open position against the latest traded price.
    pub fn mark(&mut self, symbol: &Symbol, price: Decimal) {
        if let Some(position) = self.positions.get_mut(symbol) {
            position.mark(price);
        }
    }

    pub fn open_positions(&self) -> usize {
        self.positions.len()
    }

    /// Snapshot the portfolio. The drawdown figure is stamped by the caller,
    /// which owns peak tracking.
    pub fn snapshot(&self, drawdown_percent: Decimal, time: DateTime<Utc>) -> PortfolioSnapshot {
        let total_unrealized: Decimal = self
            .positions
            .values()
            .map(|position| position.unrealized_pnl)
            .sum();
        let open_notional: Decimal = self
            .positions
            .values()
            .map(|position| position.entry_price * position.quantity)
            .sum();
        let total_equity = self.initial_equity + self.realized + total_unrealized;

        let mut positions: Vec<Position> = self.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        PortfolioSnapshot {
            total_equity,
            available_balance: (total_equity - open_notional).max(Decimal::ZERO),
            total_unrealized_pnl: total_unrealized,
            total_realized_pnl: self.realized,
            drawdown_percent,
            positions,
            time,
        }
    }
}
