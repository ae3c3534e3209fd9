//! The signal lifecycle state machine.
//!
//! One evaluation pass applies, in order: the take-profit scan, the
//! stop-loss check, then the pending-activation check. The ordering is
//! load-bearing: take-profit wins a tie with stop-loss, and the activation
//! check is keyed off the signal's *stored* status, so it is not gated on
//! the earlier checks' outcome within the same pass.

use std::collections::HashMap;

use common::{PriceData, Side, Signal, SignalStatus, SignalUpdate};

/// Entry-band half-width as a fraction of the entry price (0.1 %).
const ENTRY_TOLERANCE: f64 = 0.001;

/// A state change produced by one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Activated,
    TakeProfit { level: f64 },
    StopLoss,
}

/// Outcome of evaluating one signal against one price tick: the field set
/// to write back, plus the transitions that fired (empty for a pure price
/// refresh).
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub signal_id: String,
    pub pair: String,
    pub update: SignalUpdate,
    pub transitions: Vec<Transition>,
}

fn realized_pnl(side: Side, entry: f64, current: f64) -> f64 {
    match side {
        Side::Buy => (current - entry) * 100.0,
        Side::Sell => (entry - current) * 100.0,
    }
}

/// Evaluate one signal against the latest price for its pair.
///
/// Returns `None` when nothing needs persisting: the signal is terminal, or
/// no transition fired and the price matches the stored one. A price move
/// without a transition still produces an update so the stored
/// `current_price` stays live.
pub fn evaluate(signal: &Signal, current_price: f64) -> Option<Evaluation> {
    if signal.status == SignalStatus::Closed {
        return None;
    }

    let mut status = signal.status;
    let mut tp_hit = signal.tp_hit;
    let mut sl_hit = signal.sl_hit;
    let mut pnl = signal.pnl.unwrap_or(0.0);
    let mut transitions = Vec::new();

    // Take-profit scan: stored level order, first satisfying level wins.
    for &level in &signal.take_profit_levels {
        let crossed = match signal.side {
            Side::Buy => current_price >= level,
            Side::Sell => current_price <= level,
        };
        if crossed && !tp_hit {
            tp_hit = true;
            status = SignalStatus::Closed;
            pnl = realized_pnl(signal.side, signal.entry_price, current_price);
            transitions.push(Transition::TakeProfit { level });
            break;
        }
    }

    // Stop-loss, skipped if take-profit already fired this pass.
    let sl_crossed = match signal.side {
        Side::Buy => current_price <= signal.stop_loss,
        Side::Sell => current_price >= signal.stop_loss,
    };
    if sl_crossed && !sl_hit && !tp_hit {
        sl_hit = true;
        status = SignalStatus::Closed;
        pnl = realized_pnl(signal.side, signal.entry_price, current_price);
        transitions.push(Transition::StopLoss);
    }

    // Pending activation, keyed off the stored status.
    if signal.status == SignalStatus::Pending {
        let tolerance = signal.entry_price * ENTRY_TOLERANCE;
        if (current_price - signal.entry_price).abs() <= tolerance {
            status = SignalStatus::Active;
            transitions.push(Transition::Activated);
        }
    }

    let price_moved = signal.current_price != Some(current_price);
    if transitions.is_empty() && !price_moved {
        return None;
    }

    Some(Evaluation {
        signal_id: signal.id.clone(),
        pair: signal.pair.clone(),
        update: SignalUpdate {
            current_price,
            status,
            tp_hit,
            sl_hit,
            pnl,
        },
        transitions,
    })
}

/// Evaluate every non-terminal signal that has a matching price this cycle.
/// Pairs are matched case-insensitively; signals without a tick are left
/// untouched.
pub fn evaluate_batch(signals: &[Signal], prices: &[PriceData]) -> Vec<Evaluation> {
    let by_pair: HashMap<String, f64> = prices
        .iter()
        .map(|p| (p.pair.to_uppercase(), p.current_price))
        .collect();

    signals
        .iter()
        .filter_map(|signal| {
            let price = by_pair.get(&signal.pair.to_uppercase())?;
            evaluate(signal, *price)
        })
        .collect()
}
