use serde::{Deserialize, Serialize};

// Wire structs for the Aster futures REST API. Decimal values arrive as
// strings and are converted in `conversions`.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsterOrderResponse {
    pub order_id: i64,
    pub symbol: String,
    pub status: String,
    #[serde(default)]
    pub client_order_id: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub avg_price: String,
    #[serde(default)]
    pub orig_qty: String,
    #[serde(default)]
    pub executed_qty: String,
    #[serde(default)]
    pub cum_quote: String,
    #[serde(default)]
    pub time_in_force: String,
    #[serde(rename = "type", default)]
    pub order_type: String,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub position_side: String,
    #[serde(default)]
    pub stop_price: String,
    #[serde(default)]
    pub update_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsterPosition {
    pub symbol: String,
    pub position_amt: String,
    pub entry_price: String,
    #[serde(default)]
    pub mark_price: String,
    #[serde(rename = "unRealizedProfit", default)]
    pub un_realized_profit: String,
    #[serde(default)]
    pub liquidation_price: String,
    #[serde(default)]
    pub leverage: String,
    #[serde(default)]
    pub margin_type: String,
    #[serde(default)]
    pub isolated_margin: String,
    #[serde(default)]
    pub position_side: String,
    #[serde(default)]
    pub update_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsterBalance {
    pub asset: String,
    pub balance: String,
    #[serde(default)]
    pub available_balance: String,
    #[serde(default)]
    pub cross_un_pnl: String,
    #[serde(default)]
    pub update_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsterLeverageResponse {
    pub symbol: String,
    pub leverage: u32,
    #[serde(default)]
    pub max_notional_value: Option<String>,
}

/// Acknowledgement body used by the margin endpoints: `{"code":200,"msg":"success"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsterAck {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsterPriceTicker {
    pub symbol: String,
    pub price: String,
    #[serde(default)]
    pub time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aster24hrTicker {
    pub symbol: String,
    pub last_price: String,
    #[serde(default)]
    pub price_change: String,
    #[serde(default)]
    pub price_change_percent: String,
    #[serde(default)]
    pub high_price: String,
    #[serde(default)]
    pub low_price: String,
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub quote_volume: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsterPremiumIndex {
    pub symbol: String,
    pub mark_price: String,
    #[serde(default)]
    pub index_price: String,
    #[serde(default)]
    pub last_funding_rate: String,
    #[serde(default)]
    pub next_funding_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsterOpenInterest {
    pub symbol: String,
    pub open_interest: String,
    #[serde(default)]
    pub time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_response_parses() {
        let json = r#"{
            "clientOrderId":"testOrder","cumQuote":"0","executedQty":"0","orderId":22542179,
            "avgPrice":"0.00000","origQty":"10","price":"0","reduceOnly":false,"side":"BUY",
            "positionSide":"SHORT","status":"NEW","stopPrice":"9300","symbol":"BTCUSDT",
            "timeInForce":"GTC","type":"TRAILING_STOP_MARKET","updateTime":1566818724722
        }"#;
        let order: AsterOrderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(order.order_id, 22_542_179);
        assert_eq!(order.order_type, "TRAILING_STOP_MARKET");
        assert_eq!(order.client_order_id, "testOrder");
    }

    #[test]
    fn test_position_parses_unrealized_profit() {
        let json = r#"{"entryPrice":"0.00000","marginType":"isolated","isAutoAddMargin":"false",
            "isolatedMargin":"0.00000000","leverage":"10","liquidationPrice":"0","markPrice":"6679.50671178",
            "maxNotionalValue":"20000000","positionAmt":"0.000","symbol":"BTCUSDT",
            "unRealizedProfit":"1.5","positionSide":"BOTH","updateTime":0}"#;
        let position: AsterPosition = serde_json::from_str(json).unwrap();
        assert_eq!(position.un_realized_profit, "1.5");
        assert_eq!(position.margin_type, "isolated");
    }
}
