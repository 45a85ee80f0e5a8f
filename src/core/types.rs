use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Typed errors for the types subsystem
#[derive(Error, Debug)]
pub enum TypesError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
    #[error("Invalid price: {0}")]
    InvalidPrice(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Invalid order side: {0}")]
    InvalidSide(String),
    #[error("Invalid order type: {0}")]
    InvalidOrderType(String),
    #[error("Invalid margin type: {0} (expected ISOLATED or CROSSED)")]
    InvalidMarginType(String),
    #[error("Parsing error: {0}")]
    ParseError(String),
}

const KNOWN_QUOTES: [&str; 5] = ["USDT", "USDC", "USD1", "BUSD", "USD"];

/// Exchange symbol such as `BTCUSDT`, normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new symbol with validation
    pub fn new(symbol: impl AsRef<str>) -> Result<Self, TypesError> {
        let symbol = symbol.as_ref().trim();
        if symbol.is_empty() {
            return Err(TypesError::InvalidSymbol(
                "symbol cannot be empty".to_string(),
            ));
        }
        if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TypesError::InvalidSymbol(format!(
                "symbol must be alphanumeric: {}",
                symbol
            )));
        }
        Ok(Self(symbol.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base asset, when the quote asset is one we recognise.
    pub fn base(&self) -> &str {
        KNOWN_QUOTES
            .iter()
            .find_map(|quote| {
                self.0
                    .strip_suffix(quote)
                    .filter(|base| !base.is_empty())
            })
            .unwrap_or(&self.0)
    }

    pub fn quote(&self) -> Option<&str> {
        KNOWN_QUOTES
            .iter()
            .find(|quote| self.0.len() > quote.len() && self.0.ends_with(*quote))
            .copied()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Type-safe price representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::str")] pub Decimal);

impl Price {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Strictly positive price, as the exchange requires for order prices.
    pub fn positive(value: Decimal) -> Result<Self, TypesError> {
        if value <= Decimal::ZERO {
            return Err(TypesError::InvalidPrice(format!(
                "price must be positive, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Wire encoding without trailing zeros.
    pub fn to_wire(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl FromStr for Price {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Decimal>()
            .map(Self)
            .map_err(|e| TypesError::InvalidPrice(format!("{}: {}", s, e)))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe quantity representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(#[serde(with = "rust_decimal::serde::str")] pub Decimal);

impl Quantity {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Strictly positive quantity, as required for orders.
    pub fn positive(value: Decimal) -> Result<Self, TypesError> {
        if value <= Decimal::ZERO {
            return Err(TypesError::InvalidQuantity(format!(
                "quantity must be positive, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_wire(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl FromStr for Quantity {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Decimal>()
            .map(Self)
            .map_err(|e| TypesError::InvalidQuantity(format!("{}: {}", s, e)))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lenient conversion helpers for exchange payloads
pub mod conversion {
    use super::*;

    /// Convert string to Price with fallback
    #[inline]
    pub fn string_to_price(s: &str) -> Price {
        s.parse().unwrap_or_else(|_| Price::new(Decimal::ZERO))
    }

    /// Convert string to Quantity with fallback
    #[inline]
    pub fn string_to_quantity(s: &str) -> Quantity {
        s.parse().unwrap_or_else(|_| Quantity::new(Decimal::ZERO))
    }

    /// Convert string to Decimal with fallback
    #[inline]
    pub fn string_to_decimal(s: &str) -> Decimal {
        s.trim().parse().unwrap_or(Decimal::ZERO)
    }

    /// Zero prices mean "not set" in exchange payloads.
    #[inline]
    pub fn string_to_optional_price(s: &str) -> Option<Price> {
        let price = string_to_price(s);
        (!price.value().is_zero()).then_some(price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl FromStr for OrderSide {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            _ => Err(TypesError::InvalidSide(s.to_string())),
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopMarket,
    TakeProfit,
    TakeProfitMarket,
}

impl OrderType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::Limit => "LIMIT",
            Self::Stop => "STOP",
            Self::StopMarket => "STOP_MARKET",
            Self::TakeProfit => "TAKE_PROFIT",
            Self::TakeProfitMarket => "TAKE_PROFIT_MARKET",
        }
    }

    /// Types that rest on the book at a limit price.
    pub const fn requires_price(&self) -> bool {
        matches!(self, Self::Limit | Self::Stop | Self::TakeProfit)
    }

    pub const fn requires_stop_price(&self) -> bool {
        matches!(
            self,
            Self::Stop | Self::StopMarket | Self::TakeProfit | Self::TakeProfitMarket
        )
    }
}

impl FromStr for OrderType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MARKET" => Ok(Self::Market),
            "LIMIT" => Ok(Self::Limit),
            "STOP" => Ok(Self::Stop),
            "STOP_MARKET" => Ok(Self::StopMarket),
            "TAKE_PROFIT" => Ok(Self::TakeProfit),
            "TAKE_PROFIT_MARKET" => Ok(Self::TakeProfitMarket),
            _ => Err(TypesError::InvalidOrderType(s.to_string())),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    GTC, // Good Till Canceled
    IOC, // Immediate or Cancel
    FOK, // Fill or Kill
    GTX, // Post only
}

impl TimeInForce {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GTC => "GTC",
            Self::IOC => "IOC",
            Self::FOK => "FOK",
            Self::GTX => "GTX",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarginType {
    Isolated,
    Crossed,
}

impl MarginType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Isolated => "ISOLATED",
            Self::Crossed => "CROSSED",
        }
    }

    /// Position payloads report `isolated` / `cross` in lower case.
    pub fn from_exchange(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolated" => Some(Self::Isolated),
            "cross" | "crossed" => Some(Self::Crossed),
            _ => None,
        }
    }
}

impl FromStr for MarginType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ISOLATED" => Ok(Self::Isolated),
            "CROSSED" => Ok(Self::Crossed),
            _ => Err(TypesError::InvalidMarginType(s.to_string())),
        }
    }
}

impl fmt::Display for MarginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Short,
    Both,
}

impl PositionSide {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "LONG",
            Self::Short => "SHORT",
            Self::Both => "BOTH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
    Other(String),
}

impl OrderStatus {
    pub fn from_exchange(s: &str) -> Self {
        match s {
            "NEW" => Self::New,
            "PARTIALLY_FILLED" => Self::PartiallyFilled,
            "FILLED" => Self::Filled,
            "CANCELED" => Self::Canceled,
            "REJECTED" => Self::Rejected,
            "EXPIRED" => Self::Expired,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "NEW",
            Self::PartiallyFilled => "PARTIALLY_FILLED",
            Self::Filled => "FILLED",
            Self::Canceled => "CANCELED",
            Self::Rejected => "REJECTED",
            Self::Expired => "EXPIRED",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order placement parameters, as supplied by the caller.
///
/// Validation happens when the request is built, not here, so that every
/// entry point shares the same rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub time_in_force: Option<TimeInForce>,
    pub position_side: Option<PositionSide>,
    pub reduce_only: bool,
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    pub fn new(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        order_type: OrderType,
        price: Option<Decimal>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type,
            quantity,
            price,
            stop_price: None,
            time_in_force: None,
            position_side: None,
            reduce_only: false,
            client_order_id: None,
        }
    }

    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: Decimal) -> Self {
        Self::new(symbol, side, quantity, OrderType::Market, None)
    }

    pub fn limit(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self::new(symbol, side, quantity, OrderType::Limit, Some(price))
    }

    pub fn with_stop_price(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
        self
    }

    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    pub fn with_client_order_id(mut self, client_order_id: impl Into<String>) -> Self {
        self.client_order_id = Some(client_order_id.into());
        self
    }
}

/// Terminal result of an order placement, cancellation or lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: String,
    pub client_order_id: String,
    pub symbol: Symbol,
    pub side: Option<OrderSide>,
    pub order_type: Option<OrderType>,
    pub status: OrderStatus,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub average_price: Option<Price>,
    pub price: Option<Price>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub position_side: PositionSide,
    /// Signed: negative for shorts in one-way mode.
    pub position_amount: Quantity,
    pub entry_price: Price,
    pub mark_price: Option<Price>,
    pub unrealized_pnl: Decimal,
    pub liquidation_price: Option<Price>,
    pub leverage: u32,
    pub margin_type: Option<MarginType>,
}

impl Position {
    /// Unrealized return relative to the entry notional, in percent.
    pub fn return_percent(&self) -> Decimal {
        let cost_basis = self.position_amount.value().abs() * self.entry_price.value();
        if cost_basis.is_zero() {
            Decimal::ZERO
        } else {
            self.unrealized_pnl / cost_basis * Decimal::ONE_HUNDRED
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub balance: Quantity,
    pub available: Quantity,
    pub unrealized_pnl: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverageChange {
    pub symbol: Symbol,
    pub leverage: u32,
    pub max_notional_value: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginTypeChange {
    pub symbol: Symbol,
    pub margin_type: MarginType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarginDirection {
    Add,
    Reduce,
}

impl MarginDirection {
    /// Numeric code the position-margin endpoint expects.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Add => "1",
            Self::Reduce => "2",
        }
    }
}

impl FromStr for MarginDirection {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" | "+" => Ok(Self::Add),
            "reduce" | "remove" | "-" => Ok(Self::Reduce),
            _ => Err(TypesError::ParseError(format!(
                "margin direction must be add or reduce, got {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginAdjustment {
    pub symbol: Symbol,
    pub amount: Decimal,
    pub direction: MarginDirection,
}

// Market data

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: Symbol,
    pub last_price: Price,
    pub price_change: Decimal,
    pub price_change_percent: Decimal,
    pub high_price: Price,
    pub low_price: Price,
    pub volume: Decimal,
    pub quote_volume: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkPrice {
    pub symbol: Symbol,
    pub mark_price: Price,
    pub index_price: Option<Price>,
    pub funding_rate: Option<Decimal>,
    pub next_funding_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenInterest {
    pub symbol: Symbol,
    pub open_interest: Decimal,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_normalization() {
        let symbol = Symbol::new(" btcusdt ").unwrap();
        assert_eq!(symbol.as_str(), "BTCUSDT");
        assert_eq!(symbol.base(), "BTC");
        assert_eq!(symbol.quote(), Some("USDT"));
    }

    #[test]
    fn test_symbol_rejects_empty_and_punctuation() {
        assert!(Symbol::new("").is_err());
        assert!(Symbol::new("   ").is_err());
        assert!(Symbol::new("BTC-USDT").is_err());
    }

    #[test]
    fn test_margin_type_parsing() {
        assert_eq!("isolated".parse::<MarginType>().unwrap(), MarginType::Isolated);
        assert_eq!("CROSSED".parse::<MarginType>().unwrap(), MarginType::Crossed);
        assert!("CROSS".parse::<MarginType>().is_err());
        assert!("PORTFOLIO".parse::<MarginType>().is_err());
        assert_eq!(MarginType::from_exchange("cross"), Some(MarginType::Crossed));
    }

    #[test]
    fn test_quantity_wire_format_is_normalized() {
        let qty: Quantity = "0.0100".parse().unwrap();
        assert_eq!(qty.to_wire(), "0.01");
        assert!(Quantity::positive(Decimal::ZERO).is_err());
        assert!(Quantity::positive(Decimal::NEGATIVE_ONE).is_err());
    }

    #[test]
    fn test_return_percent() {
        let position = Position {
            symbol: Symbol::new("BTCUSDT").unwrap(),
            position_side: PositionSide::Both,
            position_amount: "-0.5".parse().unwrap(),
            entry_price: "100".parse().unwrap(),
            mark_price: None,
            unrealized_pnl: "5".parse().unwrap(),
            liquidation_price: None,
            leverage: 10,
            margin_type: Some(MarginType::Crossed),
        };
        assert_eq!(position.return_percent(), Decimal::from(10));
    }

    #[test]
    fn test_order_status_round_trip_unknown() {
        let status = OrderStatus::from_exchange("NEW_INSURANCE");
        assert_eq!(status.as_str(), "NEW_INSURANCE");
        assert_eq!(OrderStatus::from_exchange("FILLED"), OrderStatus::Filled);
    }
}
