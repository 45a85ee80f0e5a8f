use crate::core::{
    errors::ExchangeError,
    types::{
        Balance, LeverageChange, MarginAdjustment, MarginDirection, MarginTypeChange, MarkPrice,
        OpenInterest, OrderRequest, OrderResult, Position, Price, Ticker,
    },
};
use async_trait::async_trait;
use rust_decimal::Decimal;

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Latest traded price
    async fn get_price(&self, symbol: &str) -> Result<Price, ExchangeError>;

    /// Rolling 24h statistics
    async fn get_24h_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError>;

    /// Mark price together with the current funding rate
    async fn get_mark_price(&self, symbol: &str) -> Result<MarkPrice, ExchangeError>;

    async fn get_open_interest(&self, symbol: &str) -> Result<OpenInterest, ExchangeError>;
}

#[async_trait]
pub trait OrderPlacer: Send + Sync {
    /// Place a new order
    async fn place_order(&self, order: OrderRequest) -> Result<OrderResult, ExchangeError>;

    /// Cancel an open order by exchange order id or client order id
    async fn cancel_order(&self, symbol: &str, order_id: &str)
        -> Result<OrderResult, ExchangeError>;

    async fn get_order(&self, symbol: &str, order_id: &str) -> Result<OrderResult, ExchangeError>;
}

#[async_trait]
pub trait AccountInfo: Send + Sync {
    /// Open positions, optionally for one symbol. Flat positions are omitted.
    async fn get_positions(&self, symbol: Option<&str>) -> Result<Vec<Position>, ExchangeError>;

    async fn get_account_balance(&self) -> Result<Vec<Balance>, ExchangeError>;
}

#[async_trait]
pub trait PositionSettings: Send + Sync {
    async fn set_leverage(&self, symbol: &str, leverage: u32)
        -> Result<LeverageChange, ExchangeError>;

    /// `margin_type` is parsed case-insensitively from {ISOLATED, CROSSED}
    async fn set_margin_type(
        &self,
        symbol: &str,
        margin_type: &str,
    ) -> Result<MarginTypeChange, ExchangeError>;

    /// Add or remove isolated margin on an open position
    async fn adjust_margin(
        &self,
        symbol: &str,
        amount: Decimal,
        direction: MarginDirection,
    ) -> Result<MarginAdjustment, ExchangeError>;
}

/// Everything the chat layer needs from an exchange.
pub trait TradingFacade: MarketDataSource + OrderPlacer + AccountInfo + PositionSettings {}

impl<T> TradingFacade for T where T: MarketDataSource + OrderPlacer + AccountInfo + PositionSettings
{}
