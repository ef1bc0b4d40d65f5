use crate::adapter::OrderReceipt;
use fnv::FnvHashMap;
use marlin_core::{Order, Position, PositionSide, Symbol};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// In-memory index of orders and the positions their fills produce.
///
/// Orders for the same symbol are serialised by a symbol-keyed async lock
/// held by the service across the adapter round trip; the tracker's own
/// locks only guard map access and are never held across an await.
#[derive(Debug, Default)]
pub struct OrderTracker {
    orders: Mutex<FnvHashMap<Uuid, Order>>,
    positions: Mutex<FnvHashMap<Symbol, Position>>,
    symbol_locks: Mutex<FnvHashMap<Symbol, Arc<tokio::sync::Mutex<()>>>>,
}

impl OrderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-symbol placement lock.
    pub fn symbol_lock(&self, symbol: &Symbol) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(
            self.symbol_locks
                .lock()
                .entry(symbol.clone())
                .or_default(),
        )
    }

    pub fn insert(&self, order: Order) {
        self.orders.lock().insert(order.id, order);
    }

    pub fn order(&self, id: &Uuid) -> Option<Order> {
        self.orders.lock().get(id).cloned()
    }

    pub fn position(&self, symbol: &Symbol) -> Option<Position> {
        self.positions.lock().get(symbol).cloned()
    }

    pub fn open_position_count(&self) -> usize {
        self.positions.lock().len()
    }

    /// Orders still working at the venue.
    pub fn pending_orders(&self) -> Vec<Order> {
        self.orders
            .lock()
            .values()
            .filter(|order| order.status.is_pending())
            .cloned()
            .collect()
    }

    /// Fold an adapter receipt into the tracked order.
    ///
    /// Returns the updated order and whether this receipt moved it into a
    /// terminal state; `None` for unknown order ids. Newly filled quantity
    /// opens or updates the symbol's position.
    pub fn apply_receipt(&self, id: &Uuid, receipt: &OrderReceipt) -> Option<(Order, bool)> {
        let mut orders = self.orders.lock();
        let order = orders.get_mut(id)?;

        let previously_filled = order.filled_quantity;
        if order.exchange_id.is_none() {
            order.exchange_id = receipt.exchange_order_id.clone();
        }
        let became_terminal = order.apply_update(
            receipt.status,
            receipt.filled_quantity,
            receipt.filled_price,
            receipt.commission,
        );

        let fill_delta = order.filled_quantity - previously_filled;
        let updated = order.clone();
        drop(orders);

        if fill_delta > Decimal::ZERO {
            self.apply_fill(&updated, fill_delta);
        }

        Some((updated, became_terminal))
    }

    fn apply_fill(&self, order: &Order, quantity: Decimal) {
        let price = order.filled_price;
        let fill_side = PositionSide::from(order.side);
        let mut positions = self.positions.lock();

        match positions.get_mut(&order.symbol) {
            None => {
                debug!(symbol = %order.symbol, %quantity, %price, "position opened");
                positions.insert(
                    order.symbol.clone(),
                    Position::open(order.symbol.clone(), fill_side, price, quantity),
                );
            }
            Some(position) if position.side == fill_side => {
                let total = position.quantity + quantity;
                position.entry_price =
                    (position.entry_price * position.quantity + price * quantity) / total;
                position.quantity = total;
                position.mark(price);
            }
            Some(position) => {
                let closed = position.quantity.min(quantity);
                position.realized_pnl += position.close_pnl(price, closed);
                position.quantity -= closed;
                position.mark(price);

                let leftover = quantity - closed;
                if position.quantity.is_zero() {
                    debug!(symbol = %order.symbol, "position flat");
                    positions.remove(&order.symbol);
                }
                if leftover > Decimal::ZERO {
                    positions.insert(
                        order.symbol.clone(),
                        Position::open(order.symbol.clone(), fill_side, price, leftover),
                    );
                }
            }
        }
    }
}
