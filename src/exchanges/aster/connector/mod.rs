use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::{AccountInfo, MarketDataSource, OrderPlacer, PositionSettings};
use crate::core::types::{
    Balance, LeverageChange, MarginAdjustment, MarginDirection, MarginTypeChange, MarkPrice,
    OpenInterest, OrderRequest, OrderResult, Position, Price, Ticker,
};
use crate::exchanges::aster::rest::AsterRestClient;
use async_trait::async_trait;
use rust_decimal::Decimal;

pub mod account;
pub mod market_data;
pub mod trading;

pub use account::Account;
pub use market_data::MarketData;
pub use trading::Trading;

/// Aster connector that composes all sub-trait implementations
///
/// Stateless between calls: every operation is built, signed and sent
/// independently, so one connector can be shared across tasks.
pub struct AsterConnector<R: RestClient> {
    pub market: MarketData<R>,
    pub trading: Trading<R>,
    pub account: Account<R>,
}

impl<R: RestClient + Clone> AsterConnector<R> {
    pub fn new(rest: AsterRestClient<R>) -> Self {
        Self {
            market: MarketData::new(&rest),
            trading: Trading::new(&rest),
            account: Account::new(&rest),
        }
    }
}

// Implement traits for the connector by delegating to sub-components

#[async_trait]
impl<R: RestClient> MarketDataSource for AsterConnector<R> {
    async fn get_price(&self, symbol: &str) -> Result<Price, ExchangeError> {
        self.market.get_price(symbol).await
    }

    async fn get_24h_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        self.market.get_24h_ticker(symbol).await
    }

    async fn get_mark_price(&self, symbol: &str) -> Result<MarkPrice, ExchangeError> {
        self.market.get_mark_price(symbol).await
    }

    async fn get_open_interest(&self, symbol: &str) -> Result<OpenInterest, ExchangeError> {
        self.market.get_open_interest(symbol).await
    }
}

#[async_trait]
impl<R: RestClient> OrderPlacer for AsterConnector<R> {
    async fn place_order(&self, order: OrderRequest) -> Result<OrderResult, ExchangeError> {
        self.trading.place_order(order).await
    }

    async fn cancel_order(
        &self,
        symbol: &str,
        order_id: &str,
    ) -> Result<OrderResult, ExchangeError> {
        self.trading.cancel_order(symbol, order_id).await
    }

    async fn get_order(&self, symbol: &str, order_id: &str) -> Result<OrderResult, ExchangeError> {
        self.trading.get_order(symbol, order_id).await
    }
}

#[async_trait]
impl<R: RestClient> PositionSettings for AsterConnector<R> {
    async fn set_leverage(
        &self,
        symbol: &str,
        leverage: u32,
    ) -> Result<LeverageChange, ExchangeError> {
        self.trading.set_leverage(symbol, leverage).await
    }

    async fn set_margin_type(
        &self,
        symbol: &str,
        margin_type: &str,
    ) -> Result<MarginTypeChange, ExchangeError> {
        self.trading.set_margin_type(symbol, margin_type).await
    }

    async fn adjust_margin(
        &self,
        symbol: &str,
        amount: Decimal,
        direction: MarginDirection,
    ) -> Result<MarginAdjustment, ExchangeError> {
        self.trading.adjust_margin(symbol, amount, direction).await
    }
}

#[async_trait]
impl<R: RestClient> AccountInfo for AsterConnector<R> {
    async fn get_positions(&self, symbol: Option<&str>) -> Result<Vec<Position>, ExchangeError> {
        self.account.get_positions(symbol).await
    }

    async fn get_account_balance(&self) -> Result<Vec<Balance>, ExchangeError> {
        self.account.get_account_balance().await
    }
}
