use crate::core::{
    errors::ExchangeError,
    kernel::RestClient,
    traits::AccountInfo,
    types::{Balance, Position},
};
use crate::exchanges::aster::conversions::{convert_balance, convert_position};
use crate::exchanges::aster::rest::AsterRestClient;
use async_trait::async_trait;
use tracing::instrument;

/// Account implementation for Aster
pub struct Account<R: RestClient> {
    rest: AsterRestClient<R>,
}

impl<R: RestClient + Clone> Account<R> {
    pub fn new(rest: &AsterRestClient<R>) -> Self {
        Self { rest: rest.clone() }
    }
}

#[async_trait]
impl<R: RestClient> AccountInfo for Account<R> {
    /// Fetched fresh on every call; flat positions are dropped.
    #[instrument(skip(self), fields(exchange = "aster"))]
    async fn get_positions(&self, symbol: Option<&str>) -> Result<Vec<Position>, ExchangeError> {
        let positions = self.rest.get_position_risk(symbol).await?;
        positions
            .iter()
            .map(convert_position)
            .filter(|p| p.as_ref().map_or(true, |p| !p.position_amount.is_zero()))
            .collect()
    }

    #[instrument(skip(self), fields(exchange = "aster"))]
    async fn get_account_balance(&self) -> Result<Vec<Balance>, ExchangeError> {
        let balances = self.rest.get_balance().await?;
        Ok(balances.iter().map(convert_balance).collect())
    }
}
