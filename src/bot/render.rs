//! Plain-text rendering of facade results for chat replies.

use crate::core::errors::{ExchangeError, RejectionKind};
use crate::core::types::{
    Balance, LeverageChange, MarginAdjustment, MarginDirection, MarginTypeChange, MarkPrice,
    OrderResult, Position, Ticker,
};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::Write;

fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn arrow(change: Decimal) -> &'static str {
    if change.is_sign_negative() {
        "▼"
    } else {
        "▲"
    }
}

/// One line of the price board, e.g. `BTC ▲ 1.25% $65000.10`.
pub fn ticker_line(ticker: &Ticker) -> String {
    let change = ticker.price_change_percent;
    format!(
        "{} {} {:.2}% ${}",
        ticker.symbol.base(),
        arrow(change),
        change.abs(),
        ticker.last_price.value().normalize(),
    )
}

pub fn price(ticker: &Ticker, mark: Option<&MarkPrice>) -> String {
    let mut out = format!(
        "{}\nlast ${} ({}{:.2}%)\n24h high ${} low ${}\n24h volume {:.0} {}",
        ticker.symbol,
        ticker.last_price.value().normalize(),
        arrow(ticker.price_change_percent),
        ticker.price_change_percent.abs(),
        ticker.high_price.value().normalize(),
        ticker.low_price.value().normalize(),
        ticker.quote_volume,
        ticker.symbol.quote().unwrap_or("USDT"),
    );
    if let Some(mark) = mark {
        let _ = write!(out, "\nmark ${}", mark.mark_price.value().normalize());
        if let Some(rate) = mark.funding_rate {
            let _ = write!(out, " | funding {:.4}%", rate * Decimal::ONE_HUNDRED);
        }
        if let Some(next) = mark
            .next_funding_time
            .and_then(DateTime::<Utc>::from_timestamp_millis)
        {
            let _ = write!(out, " | next {}", next.format("%H:%M UTC"));
        }
    }
    out
}

/// Position summary in the `• BASE/USDT xLEV` style, with open interest when known.
pub fn position(position: &Position, open_interest: Option<Decimal>) -> String {
    let symbol = &position.symbol;
    let mut out = format!(
        "• {}/{} x{} {} {}\n",
        symbol.base(),
        symbol.quote().unwrap_or("USDT"),
        position.leverage,
        position.position_side.as_str(),
        position.position_amount.value().abs().normalize(),
    );
    let _ = write!(
        out,
        "${:.2} PNL | {:.2}% return",
        position.unrealized_pnl,
        position.return_percent(),
    );
    if let Some(oi) = open_interest {
        let _ = write!(out, " | open interest {}", round(oi, 2).normalize());
    }
    let _ = write!(out, "\nentry ${}", position.entry_price.value().normalize());
    if let Some(mark) = position.mark_price {
        let _ = write!(out, " | mark ${}", mark.value().normalize());
    }
    if let Some(liq) = position.liquidation_price {
        let _ = write!(out, " | liq ${}", liq.value().normalize());
    }
    out
}

pub fn positions(rendered: &[String]) -> String {
    if rendered.is_empty() {
        "No open positions.".to_string()
    } else {
        rendered.join("\n\n")
    }
}

pub fn portfolio(positions: &[Position], balances: &[Balance]) -> String {
    let pnl: Decimal = positions.iter().map(|p| p.unrealized_pnl).sum();
    let mut out = format!("Unrealized PNL ${:.2}", pnl);
    for balance in balances.iter().filter(|b| !b.balance.is_zero()) {
        let _ = write!(
            out,
            "\n{} {} (available {})",
            balance.asset,
            round(balance.balance.value(), 4).normalize(),
            round(balance.available.value(), 4).normalize(),
        );
    }
    out
}

pub fn balances(balances: &[Balance]) -> String {
    let lines: Vec<String> = balances
        .iter()
        .filter(|b| !b.balance.is_zero())
        .map(|b| {
            format!(
                "{}: {} | available {} | unrealized {}",
                b.asset,
                b.balance.value().normalize(),
                b.available.value().normalize(),
                round(b.unrealized_pnl, 4).normalize(),
            )
        })
        .collect();
    if lines.is_empty() {
        "No balances.".to_string()
    } else {
        lines.join("\n")
    }
}

pub fn order(order: &OrderResult) -> String {
    let mut out = format!("Order {} {}", order.order_id, order.status);
    out.push('\n');
    if let Some(side) = order.side {
        let _ = write!(out, "{} ", side);
    }
    if let Some(order_type) = order.order_type {
        let _ = write!(out, "{} ", order_type);
    }
    let _ = write!(
        out,
        "{} {} filled {}",
        order.quantity.value().normalize(),
        order.symbol,
        order.filled_quantity.value().normalize(),
    );
    if let Some(price) = order.price {
        let _ = write!(out, "\nprice ${}", price.value().normalize());
    }
    if let Some(avg) = order.average_price {
        let _ = write!(out, "\naverage ${}", avg.value().normalize());
    }
    out
}

pub fn leverage(change: &LeverageChange) -> String {
    let mut out = format!("Leverage for {} set to x{}", change.symbol, change.leverage);
    if let Some(max) = change.max_notional_value {
        let _ = write!(out, " (max notional {})", max.normalize());
    }
    out
}

pub fn margin_type(change: &MarginTypeChange) -> String {
    format!("Margin type for {} set to {}", change.symbol, change.margin_type)
}

pub fn margin(adjustment: &MarginAdjustment) -> String {
    let verb = match adjustment.direction {
        MarginDirection::Add => "Added",
        MarginDirection::Reduce => "Removed",
    };
    let preposition = match adjustment.direction {
        MarginDirection::Add => "to",
        MarginDirection::Reduce => "from",
    };
    format!(
        "{} {} margin {} {}",
        verb,
        adjustment.amount.normalize(),
        preposition,
        adjustment.symbol
    )
}

/// Renders a failed `action` so that each error class reads differently.
///
/// Rejection codes and messages are shown as the exchange sent them.
pub fn error(action: &str, err: &ExchangeError) -> String {
    match err {
        ExchangeError::ValidationError(msg) => {
            format!("Error {}: invalid input, {}. Nothing was sent.", action, msg)
        }
        ExchangeError::ExchangeRejection {
            code,
            message,
            retry_after,
        } => {
            let mut out = format!("Error {}: exchange rejected ({}) {}", action, code, message);
            match RejectionKind::from_code(*code) {
                RejectionKind::RateLimited => match retry_after {
                    Some(wait) => {
                        let _ = write!(out, "\nRate limited, try again in {}s.", wait.as_secs().max(1));
                    }
                    None => out.push_str("\nRate limited, try again shortly."),
                },
                RejectionKind::InsufficientMargin => {
                    out.push_str("\nNot enough margin for this order.");
                }
                RejectionKind::PositionConflict => {
                    out.push_str("\nNot allowed while a position or open order exists.");
                }
                _ => {}
            }
            out
        }
        ExchangeError::UnknownOutcome { endpoint, reason } => format!(
            "Error {}: outcome unknown ({} {}).\nThe exchange may have applied it. Check /positions before retrying.",
            action, endpoint, reason
        ),
        ExchangeError::TransportError(msg) => {
            format!("Error {}: exchange unreachable, {}", action, msg)
        }
        ExchangeError::SigningError(msg) => {
            format!("Error {}: cannot sign request, {}. Check credentials.", action, msg)
        }
        other => format!("Error {}: {}", action, other),
    }
}
