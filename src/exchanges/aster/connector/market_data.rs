use crate::core::{
    errors::ExchangeError,
    kernel::RestClient,
    traits::MarketDataSource,
    types::{MarkPrice, OpenInterest, Price, Ticker},
};
use crate::exchanges::aster::conversions::{
    convert_mark_price, convert_open_interest, convert_price, convert_ticker,
};
use crate::exchanges::aster::rest::AsterRestClient;
use async_trait::async_trait;
use tracing::instrument;

/// Public market data for Aster
pub struct MarketData<R: RestClient> {
    rest: AsterRestClient<R>,
}

impl<R: RestClient + Clone> MarketData<R> {
    pub fn new(rest: &AsterRestClient<R>) -> Self {
        Self { rest: rest.clone() }
    }
}

#[async_trait]
impl<R: RestClient> MarketDataSource for MarketData<R> {
    #[instrument(skip(self), fields(exchange = "aster"))]
    async fn get_price(&self, symbol: &str) -> Result<Price, ExchangeError> {
        convert_price(&self.rest.get_price(symbol).await?)
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    async fn get_24h_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        convert_ticker(&self.rest.get_24hr_ticker(symbol).await?)
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    async fn get_mark_price(&self, symbol: &str) -> Result<MarkPrice, ExchangeError> {
        convert_mark_price(&self.rest.get_premium_index(symbol).await?)
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    async fn get_open_interest(&self, symbol: &str) -> Result<OpenInterest, ExchangeError> {
        convert_open_interest(&self.rest.get_open_interest(symbol).await?)
    }
}
