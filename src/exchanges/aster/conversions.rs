use crate::core::errors::ExchangeError;
use crate::core::types::{
    conversion::{string_to_decimal, string_to_optional_price, string_to_price, string_to_quantity},
    Balance, LeverageChange, MarginType, MarkPrice, OpenInterest, OrderResult, OrderSide,
    OrderStatus, OrderType, Position, PositionSide, Price, Symbol, Ticker,
};
use crate::exchanges::aster::types::{
    Aster24hrTicker, AsterBalance, AsterLeverageResponse, AsterOpenInterest, AsterOrderResponse,
    AsterPosition, AsterPremiumIndex, AsterPriceTicker,
};
use rust_decimal::Decimal;
use tracing::warn;

fn symbol(raw: &str) -> Result<Symbol, ExchangeError> {
    Symbol::new(raw).map_err(|e| {
        ExchangeError::DeserializationError(format!("exchange returned {}", e))
    })
}

pub fn convert_order(order: &AsterOrderResponse) -> Result<OrderResult, ExchangeError> {
    let side = if order.side.is_empty() {
        None
    } else {
        order.side.parse::<OrderSide>().ok()
    };
    let order_type = if order.order_type.is_empty() {
        None
    } else {
        order.order_type.parse::<OrderType>().ok()
    };
    if order_type.is_none() && !order.order_type.is_empty() {
        warn!(order_type = %order.order_type, "unrecognised order type");
    }

    Ok(OrderResult {
        order_id: order.order_id.to_string(),
        client_order_id: order.client_order_id.clone(),
        symbol: symbol(&order.symbol)?,
        side,
        order_type,
        status: OrderStatus::from_exchange(&order.status),
        quantity: string_to_quantity(&order.orig_qty),
        filled_quantity: string_to_quantity(&order.executed_qty),
        average_price: string_to_optional_price(&order.avg_price),
        price: string_to_optional_price(&order.price),
        timestamp: order.update_time,
    })
}

pub fn convert_position(position: &AsterPosition) -> Result<Position, ExchangeError> {
    let amount = string_to_quantity(&position.position_amt);
    let position_side = match position.position_side.as_str() {
        "LONG" => PositionSide::Long,
        "SHORT" => PositionSide::Short,
        // One-way mode reports BOTH; the sign of the amount gives the direction
        _ => match amount.value().cmp(&Decimal::ZERO) {
            std::cmp::Ordering::Greater => PositionSide::Long,
            std::cmp::Ordering::Less => PositionSide::Short,
            std::cmp::Ordering::Equal => PositionSide::Both,
        },
    };

    Ok(Position {
        symbol: symbol(&position.symbol)?,
        position_side,
        position_amount: amount,
        entry_price: string_to_price(&position.entry_price),
        mark_price: string_to_optional_price(&position.mark_price),
        unrealized_pnl: string_to_decimal(&position.un_realized_profit),
        liquidation_price: string_to_optional_price(&position.liquidation_price),
        leverage: position.leverage.trim().parse().unwrap_or(0),
        margin_type: MarginType::from_exchange(&position.margin_type),
    })
}

pub fn convert_balance(balance: &AsterBalance) -> Balance {
    Balance {
        asset: balance.asset.clone(),
        balance: string_to_quantity(&balance.balance),
        available: string_to_quantity(&balance.available_balance),
        unrealized_pnl: string_to_decimal(&balance.cross_un_pnl),
    }
}

pub fn convert_leverage(response: &AsterLeverageResponse) -> Result<LeverageChange, ExchangeError> {
    Ok(LeverageChange {
        symbol: symbol(&response.symbol)?,
        leverage: response.leverage,
        max_notional_value: response
            .max_notional_value
            .as_deref()
            .map(string_to_decimal),
    })
}

pub fn convert_price(ticker: &AsterPriceTicker) -> Result<Price, ExchangeError> {
    ticker.price.parse::<Price>().map_err(|e| {
        ExchangeError::DeserializationError(format!("price for {}: {}", ticker.symbol, e))
    })
}

pub fn convert_ticker(ticker: &Aster24hrTicker) -> Result<Ticker, ExchangeError> {
    Ok(Ticker {
        symbol: symbol(&ticker.symbol)?,
        last_price: string_to_price(&ticker.last_price),
        price_change: string_to_decimal(&ticker.price_change),
        price_change_percent: string_to_decimal(&ticker.price_change_percent),
        high_price: string_to_price(&ticker.high_price),
        low_price: string_to_price(&ticker.low_price),
        volume: string_to_decimal(&ticker.volume),
        quote_volume: string_to_decimal(&ticker.quote_volume),
    })
}

pub fn convert_mark_price(index: &AsterPremiumIndex) -> Result<MarkPrice, ExchangeError> {
    Ok(MarkPrice {
        symbol: symbol(&index.symbol)?,
        mark_price: string_to_price(&index.mark_price),
        index_price: string_to_optional_price(&index.index_price),
        funding_rate: (!index.last_funding_rate.is_empty())
            .then(|| string_to_decimal(&index.last_funding_rate)),
        next_funding_time: (index.next_funding_time > 0).then_some(index.next_funding_time),
    })
}

pub fn convert_open_interest(oi: &AsterOpenInterest) -> Result<OpenInterest, ExchangeError> {
    Ok(OpenInterest {
        symbol: symbol(&oi.symbol)?,
        open_interest: string_to_decimal(&oi.open_interest),
        timestamp: oi.time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(amount: &str, side: &str) -> AsterPosition {
        AsterPosition {
            symbol: "ETHUSDT".to_string(),
            position_amt: amount.to_string(),
            entry_price: "2500".to_string(),
            mark_price: "2510.5".to_string(),
            un_realized_profit: "-3.2".to_string(),
            liquidation_price: "0".to_string(),
            leverage: "20".to_string(),
            margin_type: "cross".to_string(),
            isolated_margin: "0".to_string(),
            position_side: side.to_string(),
            update_time: 0,
        }
    }

    #[test]
    fn test_one_way_position_side_from_sign() {
        let short = convert_position(&position("-0.5", "BOTH")).unwrap();
        assert_eq!(short.position_side, PositionSide::Short);
        assert_eq!(short.leverage, 20);
        assert_eq!(short.margin_type, Some(MarginType::Crossed));
        assert!(short.liquidation_price.is_none());

        let long = convert_position(&position("0.5", "BOTH")).unwrap();
        assert_eq!(long.position_side, PositionSide::Long);
    }

    #[test]
    fn test_hedge_mode_side_is_kept() {
        let converted = convert_position(&position("0.5", "SHORT")).unwrap();
        assert_eq!(converted.position_side, PositionSide::Short);
    }

    #[test]
    fn test_order_with_zero_avg_price_has_none() {
        let order: AsterOrderResponse = serde_json::from_str(
            r#"{"orderId":1,"symbol":"BTCUSDT","status":"NEW","avgPrice":"0.00000","origQty":"0.010","executedQty":"0","side":"BUY","type":"MARKET"}"#,
        )
        .unwrap();
        let result = convert_order(&order).unwrap();
        assert!(result.average_price.is_none());
        assert_eq!(result.status, OrderStatus::New);
        assert_eq!(result.order_type, Some(OrderType::Market));
        assert_eq!(result.quantity.to_wire(), "0.01");
    }
}
