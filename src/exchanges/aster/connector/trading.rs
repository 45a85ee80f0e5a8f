use crate::core::{
    errors::ExchangeError,
    kernel::RestClient,
    traits::{OrderPlacer, PositionSettings},
    types::{
        LeverageChange, MarginAdjustment, MarginDirection, MarginType, MarginTypeChange,
        OrderRequest, OrderResult, Symbol,
    },
};
use crate::exchanges::aster::conversions::{convert_leverage, convert_order};
use crate::exchanges::aster::rest::AsterRestClient;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, instrument};

/// Trading implementation for Aster
pub struct Trading<R: RestClient> {
    rest: AsterRestClient<R>,
}

impl<R: RestClient + Clone> Trading<R> {
    pub fn new(rest: &AsterRestClient<R>) -> Self {
        Self { rest: rest.clone() }
    }
}

#[async_trait]
impl<R: RestClient> OrderPlacer for Trading<R> {
    #[instrument(skip(self, order), fields(exchange = "aster", symbol = %order.symbol))]
    async fn place_order(&self, order: OrderRequest) -> Result<OrderResult, ExchangeError> {
        let response = self.rest.place_order(&order).await?;
        let result = convert_order(&response)?;
        info!(order_id = %result.order_id, status = %result.status, "order placed");
        Ok(result)
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    async fn cancel_order(
        &self,
        symbol: &str,
        order_id: &str,
    ) -> Result<OrderResult, ExchangeError> {
        let response = self.rest.cancel_order(symbol, order_id).await?;
        convert_order(&response)
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    async fn get_order(&self, symbol: &str, order_id: &str) -> Result<OrderResult, ExchangeError> {
        let response = self.rest.get_order(symbol, order_id).await?;
        convert_order(&response)
    }
}

#[async_trait]
impl<R: RestClient> PositionSettings for Trading<R> {
    #[instrument(skip(self), fields(exchange = "aster"))]
    async fn set_leverage(
        &self,
        symbol: &str,
        leverage: u32,
    ) -> Result<LeverageChange, ExchangeError> {
        let response = self.rest.set_leverage(symbol, leverage).await?;
        convert_leverage(&response)
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    async fn set_margin_type(
        &self,
        symbol: &str,
        margin_type: &str,
    ) -> Result<MarginTypeChange, ExchangeError> {
        self.rest.set_margin_type(symbol, margin_type).await?;
        Ok(MarginTypeChange {
            symbol: Symbol::new(symbol)?,
            margin_type: margin_type.parse::<MarginType>()?,
        })
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    async fn adjust_margin(
        &self,
        symbol: &str,
        amount: Decimal,
        direction: MarginDirection,
    ) -> Result<MarginAdjustment, ExchangeError> {
        self.rest
            .adjust_position_margin(symbol, amount, direction)
            .await?;
        Ok(MarginAdjustment {
            symbol: Symbol::new(symbol)?,
            amount: amount.normalize(),
            direction,
        })
    }
}
