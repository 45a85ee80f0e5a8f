use crate::core::errors::ExchangeError;
use crate::core::kernel::request::RequestIntent;
use crate::core::types::{
    MarginDirection, MarginType, OrderRequest, PositionSide, Price, Quantity, Symbol, TimeInForce,
};
use reqwest::Method;
use rust_decimal::Decimal;

pub const MIN_LEVERAGE: u32 = 1;
pub const MAX_LEVERAGE: u32 = 125;
const MAX_CLIENT_ORDER_ID_LEN: usize = 36;

/// Which generation of signed endpoints to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSet {
    /// `/fapi/v3/*`, EVM-signed
    V3,
    /// `/fapi/v1/*` and `/fapi/v2/*`, HMAC-signed
    Legacy,
}

impl EndpointSet {
    fn position_risk(self) -> &'static str {
        match self {
            Self::V3 => "/fapi/v3/positionRisk",
            Self::Legacy => "/fapi/v2/positionRisk",
        }
    }

    fn balance(self) -> &'static str {
        match self {
            Self::V3 => "/fapi/v3/balance",
            Self::Legacy => "/fapi/v2/balance",
        }
    }

    fn order(self) -> &'static str {
        match self {
            Self::V3 => "/fapi/v3/order",
            Self::Legacy => "/fapi/v1/order",
        }
    }

    fn leverage(self) -> &'static str {
        match self {
            Self::V3 => "/fapi/v3/leverage",
            Self::Legacy => "/fapi/v1/leverage",
        }
    }

    fn margin_type(self) -> &'static str {
        match self {
            Self::V3 => "/fapi/v3/marginType",
            Self::Legacy => "/fapi/v1/marginType",
        }
    }

    fn position_margin(self) -> &'static str {
        match self {
            Self::V3 => "/fapi/v3/positionMargin",
            Self::Legacy => "/fapi/v1/positionMargin",
        }
    }
}

/// Validates caller input and assembles [`RequestIntent`]s in the exchange's
/// parameter vocabulary. Nothing here touches the network.
#[derive(Debug, Clone, Copy)]
pub struct AsterRequests {
    endpoints: EndpointSet,
}

impl AsterRequests {
    pub const fn new(endpoints: EndpointSet) -> Self {
        Self { endpoints }
    }

    pub const fn endpoints(&self) -> EndpointSet {
        self.endpoints
    }

    pub fn positions(&self, symbol: Option<&str>) -> Result<RequestIntent, ExchangeError> {
        let symbol = symbol.map(validate_symbol).transpose()?;
        Ok(
            RequestIntent::signed(Method::GET, self.endpoints.position_risk())
                .with_optional_param("symbol", symbol),
        )
    }

    pub fn balance(&self) -> RequestIntent {
        RequestIntent::signed(Method::GET, self.endpoints.balance())
    }

    pub fn place_order(&self, order: &OrderRequest) -> Result<RequestIntent, ExchangeError> {
        let symbol = validate_symbol(&order.symbol)?;
        let quantity = Quantity::positive(order.quantity)?;

        let price = match (order.order_type.requires_price(), order.price) {
            (true, Some(price)) => Some(Price::positive(price)?),
            (true, None) => {
                return Err(ExchangeError::validation(format!(
                    "{} orders require a price",
                    order.order_type
                )))
            }
            (false, Some(_)) => {
                return Err(ExchangeError::validation(format!(
                    "{} orders do not take a price",
                    order.order_type
                )))
            }
            (false, None) => None,
        };

        let stop_price = match (order.order_type.requires_stop_price(), order.stop_price) {
            (true, Some(stop)) => Some(Price::positive(stop)?),
            (true, None) => {
                return Err(ExchangeError::validation(format!(
                    "{} orders require a stop price",
                    order.order_type
                )))
            }
            (false, Some(_)) => {
                return Err(ExchangeError::validation(format!(
                    "{} orders do not take a stop price",
                    order.order_type
                )))
            }
            (false, None) => None,
        };

        let time_in_force = match (price.is_some(), order.time_in_force) {
            (true, tif) => Some(tif.unwrap_or(TimeInForce::GTC)),
            (false, None) => None,
            (false, Some(_)) => {
                return Err(ExchangeError::validation(
                    "time in force only applies to orders with a limit price",
                ))
            }
        };

        let client_order_id = order
            .client_order_id
            .as_deref()
            .map(validate_client_order_id)
            .transpose()?;

        Ok(RequestIntent::signed(Method::POST, self.endpoints.order())
            .with_param("symbol", symbol)
            .with_param("side", order.side.as_str())
            .with_param(
                "positionSide",
                order.position_side.unwrap_or(PositionSide::Both).as_str(),
            )
            .with_param("type", order.order_type.as_str())
            .with_param("quantity", quantity.to_wire())
            .with_optional_param("price", price.map(|p| p.to_wire()))
            .with_optional_param("stopPrice", stop_price.map(|p| p.to_wire()))
            .with_optional_param("timeInForce", time_in_force.map(|t| t.as_str()))
            .with_optional_param("reduceOnly", order.reduce_only.then_some("true"))
            .with_optional_param("newClientOrderId", client_order_id))
    }

    pub fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<RequestIntent, ExchangeError> {
        self.order_reference(Method::DELETE, symbol, order_id)
    }

    pub fn query_order(&self, symbol: &str, order_id: &str) -> Result<RequestIntent, ExchangeError> {
        self.order_reference(Method::GET, symbol, order_id)
    }

    fn order_reference(
        &self,
        method: Method,
        symbol: &str,
        order_id: &str,
    ) -> Result<RequestIntent, ExchangeError> {
        let symbol = validate_symbol(symbol)?;
        let (key, value) = order_id_param(order_id)?;
        Ok(RequestIntent::signed(method, self.endpoints.order())
            .with_param("symbol", symbol)
            .with_param(key, value))
    }

    pub fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<RequestIntent, ExchangeError> {
        let symbol = validate_symbol(symbol)?;
        let leverage = validate_leverage(leverage)?;
        Ok(RequestIntent::signed(Method::POST, self.endpoints.leverage())
            .with_param("symbol", symbol)
            .with_param("leverage", leverage))
    }

    pub fn set_margin_type(
        &self,
        symbol: &str,
        margin_type: &str,
    ) -> Result<RequestIntent, ExchangeError> {
        let symbol = validate_symbol(symbol)?;
        let margin_type: MarginType = margin_type.parse()?;
        Ok(RequestIntent::signed(Method::POST, self.endpoints.margin_type())
            .with_param("symbol", symbol)
            .with_param("marginType", margin_type.as_str()))
    }

    pub fn adjust_margin(
        &self,
        symbol: &str,
        amount: Decimal,
        direction: MarginDirection,
    ) -> Result<RequestIntent, ExchangeError> {
        let symbol = validate_symbol(symbol)?;
        if amount <= Decimal::ZERO {
            return Err(ExchangeError::validation(format!(
                "margin amount must be positive, got {}",
                amount
            )));
        }
        Ok(
            RequestIntent::signed(Method::POST, self.endpoints.position_margin())
                .with_param("symbol", symbol)
                .with_param("amount", amount.normalize())
                .with_param("type", direction.code()),
        )
    }

    pub fn price(&self, symbol: &str) -> Result<RequestIntent, ExchangeError> {
        public_symbol_query("/fapi/v1/ticker/price", symbol)
    }

    pub fn ticker_24h(&self, symbol: &str) -> Result<RequestIntent, ExchangeError> {
        public_symbol_query("/fapi/v1/ticker/24hr", symbol)
    }

    pub fn premium_index(&self, symbol: &str) -> Result<RequestIntent, ExchangeError> {
        public_symbol_query("/fapi/v1/premiumIndex", symbol)
    }

    pub fn open_interest(&self, symbol: &str) -> Result<RequestIntent, ExchangeError> {
        public_symbol_query("/fapi/v1/openInterest", symbol)
    }
}

fn public_symbol_query(endpoint: &str, symbol: &str) -> Result<RequestIntent, ExchangeError> {
    let symbol = validate_symbol(symbol)?;
    Ok(RequestIntent::public(Method::GET, endpoint).with_param("symbol", symbol))
}

pub fn validate_symbol(symbol: &str) -> Result<Symbol, ExchangeError> {
    Ok(Symbol::new(symbol)?)
}

pub fn validate_leverage(leverage: u32) -> Result<u32, ExchangeError> {
    if (MIN_LEVERAGE..=MAX_LEVERAGE).contains(&leverage) {
        Ok(leverage)
    } else {
        Err(ExchangeError::validation(format!(
            "leverage must be between {} and {}, got {}",
            MIN_LEVERAGE, MAX_LEVERAGE, leverage
        )))
    }
}

pub fn validate_client_order_id(id: &str) -> Result<&str, ExchangeError> {
    let valid_chars = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if id.is_empty() || id.len() > MAX_CLIENT_ORDER_ID_LEN || !valid_chars {
        return Err(ExchangeError::validation(format!(
            "client order id must be 1-{} characters of [A-Za-z0-9._-], got {:?}",
            MAX_CLIENT_ORDER_ID_LEN, id
        )));
    }
    Ok(id)
}

/// Numeric ids are exchange order ids; anything else is a client order id.
fn order_id_param(order_id: &str) -> Result<(&'static str, &str), ExchangeError> {
    let order_id = order_id.trim();
    if !order_id.is_empty() && order_id.chars().all(|c| c.is_ascii_digit()) {
        Ok(("orderId", order_id))
    } else {
        Ok(("origClientOrderId", validate_client_order_id(order_id)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::request::RequestKind;
    use crate::core::types::{OrderSide, OrderType};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    const V3: AsterRequests = AsterRequests::new(EndpointSet::V3);

    fn is_validation(result: Result<RequestIntent, ExchangeError>) -> bool {
        matches!(result, Err(ExchangeError::ValidationError(_)))
    }

    #[test]
    fn test_market_order_params() {
        let order = OrderRequest::market("btcusdt", OrderSide::Buy, dec("0.0100"));
        let intent = V3.place_order(&order).unwrap();
        assert_eq!(intent.endpoint(), "/fapi/v3/order");
        assert_eq!(intent.kind(), RequestKind::Mutating);
        assert_eq!(intent.param("symbol"), Some("BTCUSDT"));
        assert_eq!(intent.param("quantity"), Some("0.01"));
        assert_eq!(intent.param("positionSide"), Some("BOTH"));
        assert_eq!(intent.param("type"), Some("MARKET"));
        assert_eq!(intent.param("price"), None);
        assert_eq!(intent.param("timeInForce"), None);
        assert_eq!(intent.param("reduceOnly"), None);
    }

    #[test]
    fn test_limit_order_defaults_to_gtc() {
        let order = OrderRequest::limit("ETHUSDT", OrderSide::Sell, dec("1"), dec("2500.50"))
            .reduce_only(true);
        let intent = V3.place_order(&order).unwrap();
        assert_eq!(intent.param("price"), Some("2500.5"));
        assert_eq!(intent.param("timeInForce"), Some("GTC"));
        assert_eq!(intent.param("reduceOnly"), Some("true"));
    }

    #[test]
    fn test_order_validation() {
        let zero = OrderRequest::market("BTCUSDT", OrderSide::Buy, Decimal::ZERO);
        assert!(is_validation(V3.place_order(&zero)));

        let negative = OrderRequest::market("BTCUSDT", OrderSide::Buy, dec("-1"));
        assert!(is_validation(V3.place_order(&negative)));

        let empty = OrderRequest::market("", OrderSide::Buy, dec("1"));
        assert!(is_validation(V3.place_order(&empty)));

        let limit_without_price =
            OrderRequest::new("BTCUSDT", OrderSide::Buy, dec("1"), OrderType::Limit, None);
        assert!(is_validation(V3.place_order(&limit_without_price)));

        let market_with_price = OrderRequest::new(
            "BTCUSDT",
            OrderSide::Buy,
            dec("1"),
            OrderType::Market,
            Some(dec("100")),
        );
        assert!(is_validation(V3.place_order(&market_with_price)));

        let stop_without_trigger = OrderRequest::new(
            "BTCUSDT",
            OrderSide::Sell,
            dec("1"),
            OrderType::StopMarket,
            None,
        );
        assert!(is_validation(V3.place_order(&stop_without_trigger)));

        let bad_client_id = OrderRequest::market("BTCUSDT", OrderSide::Buy, dec("1"))
            .with_client_order_id("has space");
        assert!(is_validation(V3.place_order(&bad_client_id)));
    }

    #[test]
    fn test_stop_market_order() {
        let order = OrderRequest::new(
            "BTCUSDT",
            OrderSide::Sell,
            dec("0.5"),
            OrderType::StopMarket,
            None,
        )
        .with_stop_price(dec("60000"));
        let intent = V3.place_order(&order).unwrap();
        assert_eq!(intent.param("stopPrice"), Some("60000"));
        assert_eq!(intent.param("type"), Some("STOP_MARKET"));
    }

    #[test]
    fn test_leverage_bounds() {
        assert!(is_validation(V3.set_leverage("BTCUSDT", 0)));
        assert!(is_validation(V3.set_leverage("BTCUSDT", 126)));
        assert!(is_validation(V3.set_leverage("BTCUSDT", 200)));
        assert!(V3.set_leverage("BTCUSDT", 1).is_ok());

        let intent = V3.set_leverage("ethusdt", 125).unwrap();
        assert_eq!(intent.param("leverage"), Some("125"));
        assert_eq!(intent.param("symbol"), Some("ETHUSDT"));
    }

    #[test]
    fn test_margin_type_enumeration() {
        assert!(is_validation(V3.set_margin_type("BTCUSDT", "PORTFOLIO")));
        assert!(is_validation(V3.set_margin_type("BTCUSDT", "")));
        let intent = V3.set_margin_type("BTCUSDT", "crossed").unwrap();
        assert_eq!(intent.param("marginType"), Some("CROSSED"));
    }

    #[test]
    fn test_order_reference_param() {
        let by_id = V3.cancel_order("BTCUSDT", "22542179").unwrap();
        assert_eq!(by_id.param("orderId"), Some("22542179"));
        assert_eq!(by_id.method(), &Method::DELETE);

        let by_client_id = V3.query_order("BTCUSDT", "bot-42").unwrap();
        assert_eq!(by_client_id.param("origClientOrderId"), Some("bot-42"));
        assert_eq!(by_client_id.kind(), RequestKind::Idempotent);

        assert!(is_validation(V3.cancel_order("BTCUSDT", "")));
    }

    #[test]
    fn test_adjust_margin() {
        let intent = V3
            .adjust_margin("BTCUSDT", dec("12.50"), MarginDirection::Reduce)
            .unwrap();
        assert_eq!(intent.endpoint(), "/fapi/v3/positionMargin");
        assert_eq!(intent.param("amount"), Some("12.5"));
        assert_eq!(intent.param("type"), Some("2"));
        assert!(is_validation(V3.adjust_margin(
            "BTCUSDT",
            Decimal::ZERO,
            MarginDirection::Add
        )));
    }

    #[test]
    fn test_legacy_endpoints() {
        let legacy = AsterRequests::new(EndpointSet::Legacy);
        assert_eq!(legacy.positions(None).unwrap().endpoint(), "/fapi/v2/positionRisk");
        assert_eq!(legacy.balance().endpoint(), "/fapi/v2/balance");
        assert_eq!(
            legacy.set_leverage("BTCUSDT", 5).unwrap().endpoint(),
            "/fapi/v1/leverage"
        );
    }
}
