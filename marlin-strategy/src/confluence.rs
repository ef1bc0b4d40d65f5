use marlin_core::{SignalAction, TradeSignal};
use rust_decimal::Decimal;

/// Weight of full directional agreement.
const BOOST: Decimal = Decimal::from_parts(3, 0, 0, false, 1); // 0.3

/// Raise the confidence of directional signals that agree.
///
/// For `k` of `n` directional signals sharing a direction, each gains
/// `0.3 * k / n`, clamped to 1.0. Close actions are left untouched.
pub fn apply_confluence(signals: &mut [TradeSignal]) {
    let buys = signals
        .iter()
        .filter(|signal| signal.action == SignalAction::Buy)
        .count();
    let sells = signals
        .iter()
        .filter(|signal| signal.action == SignalAction::Sell)
        .count();
    let directional = buys + sells;
    if directional == 0 {
        return;
    }

    for signal in signals.iter_mut() {
        let agreeing = match signal.action {
            SignalAction::Buy => buys,
            SignalAction::Sell => sells,
            _ => continue,
        };
        let boost =
            BOOST * Decimal::from(agreeing as u64) / Decimal::from(directional as u64);
        signal.confidence = (signal.confidence + boost).min(Decimal::ONE);
    }
}
