use crate::core::errors::ExchangeError;
use crate::core::kernel::{HttpTransport, RestClient};
use crate::core::types::{MarginDirection, OrderRequest};
use crate::exchanges::aster::requests::AsterRequests;
use crate::exchanges::aster::types::{
    Aster24hrTicker, AsterAck, AsterBalance, AsterLeverageResponse, AsterOpenInterest,
    AsterOrderResponse, AsterPosition, AsterPremiumIndex, AsterPriceTicker,
};
use rust_decimal::Decimal;
use tracing::instrument;

/// Typed REST operations for Aster futures
///
/// Each method validates through [`AsterRequests`] before anything is sent,
/// so invalid input never reaches the transport.
#[derive(Clone, Debug)]
pub struct AsterRestClient<R: RestClient> {
    transport: HttpTransport<R>,
    requests: AsterRequests,
}

impl<R: RestClient> AsterRestClient<R> {
    pub fn new(transport: HttpTransport<R>, requests: AsterRequests) -> Self {
        Self {
            transport,
            requests,
        }
    }

    pub fn requests(&self) -> &AsterRequests {
        &self.requests
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn get_position_risk(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<AsterPosition>, ExchangeError> {
        let intent = self.requests.positions(symbol)?;
        self.transport.execute_json(&intent).await
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn get_balance(&self) -> Result<Vec<AsterBalance>, ExchangeError> {
        self.transport.execute_json(&self.requests.balance()).await
    }

    #[instrument(skip(self, order), fields(exchange = "aster", symbol = %order.symbol, side = %order.side, order_type = %order.order_type))]
    pub async fn place_order(&self, order: &OrderRequest) -> Result<AsterOrderResponse, ExchangeError> {
        let intent = self.requests.place_order(order)?;
        self.transport.execute_json(&intent).await
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn cancel_order(
        &self,
        symbol: &str,
        order_id: &str,
    ) -> Result<AsterOrderResponse, ExchangeError> {
        let intent = self.requests.cancel_order(symbol, order_id)?;
        self.transport.execute_json(&intent).await
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn get_order(
        &self,
        symbol: &str,
        order_id: &str,
    ) -> Result<AsterOrderResponse, ExchangeError> {
        let intent = self.requests.query_order(symbol, order_id)?;
        self.transport.execute_json(&intent).await
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn set_leverage(
        &self,
        symbol: &str,
        leverage: u32,
    ) -> Result<AsterLeverageResponse, ExchangeError> {
        let intent = self.requests.set_leverage(symbol, leverage)?;
        self.transport.execute_json(&intent).await
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn set_margin_type(
        &self,
        symbol: &str,
        margin_type: &str,
    ) -> Result<AsterAck, ExchangeError> {
        let intent = self.requests.set_margin_type(symbol, margin_type)?;
        self.transport.execute_json(&intent).await
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn adjust_position_margin(
        &self,
        symbol: &str,
        amount: Decimal,
        direction: MarginDirection,
    ) -> Result<AsterAck, ExchangeError> {
        let intent = self.requests.adjust_margin(symbol, amount, direction)?;
        self.transport.execute_json(&intent).await
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn get_price(&self, symbol: &str) -> Result<AsterPriceTicker, ExchangeError> {
        self.transport
            .execute_json(&self.requests.price(symbol)?)
            .await
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn get_24hr_ticker(&self, symbol: &str) -> Result<Aster24hrTicker, ExchangeError> {
        self.transport
            .execute_json(&self.requests.ticker_24h(symbol)?)
            .await
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn get_premium_index(&self, symbol: &str) -> Result<AsterPremiumIndex, ExchangeError> {
        self.transport
            .execute_json(&self.requests.premium_index(symbol)?)
            .await
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    pub async fn get_open_interest(&self, symbol: &str) -> Result<AsterOpenInterest, ExchangeError> {
        self.transport
            .execute_json(&self.requests.open_interest(symbol)?)
            .await
    }
}
