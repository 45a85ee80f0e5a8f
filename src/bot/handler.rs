use crate::bot::command::{Command, HELP};
use crate::bot::render;
use crate::core::errors::ExchangeError;
use crate::core::traits::{
    AccountInfo, MarketDataSource, OrderPlacer, PositionSettings, TradingFacade,
};
use crate::core::types::{OrderRequest, OrderSide};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Symbols shown on the `/start` price board.
pub const WATCHLIST: [&str; 5] = ["BTCUSDT", "ETHUSDT", "BNBUSDT", "SOLUSDT", "ASTERUSDT"];

/// Turns chat messages into facade calls and renders the reply.
///
/// Works against any [`TradingFacade`], so it never sees signing or transport details.
pub struct CommandHandler<F: TradingFacade> {
    facade: Arc<F>,
    default_symbol: String,
    watchlist: Vec<String>,
}

impl<F: TradingFacade> CommandHandler<F> {
    pub fn new(facade: Arc<F>, default_symbol: impl Into<String>) -> Self {
        Self {
            facade,
            default_symbol: default_symbol.into(),
            watchlist: WATCHLIST.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    pub fn with_watchlist(mut self, watchlist: Vec<String>) -> Self {
        self.watchlist = watchlist;
        self
    }

    pub fn default_symbol(&self) -> &str {
        &self.default_symbol
    }

    fn symbol(&self, symbol: Option<String>) -> String {
        symbol.unwrap_or_else(|| self.default_symbol.clone())
    }

    /// Handles one message. Failures are rendered into the reply rather than returned.
    #[instrument(skip(self), fields(default_symbol = %self.default_symbol))]
    pub async fn handle(&self, text: &str) -> String {
        let command = match text.parse::<Command>() {
            Ok(command) => command,
            Err(err) => return err.to_string(),
        };
        info!(?command, "handling command");
        match self.dispatch(command).await {
            Ok(reply) => reply,
            Err((action, err)) => {
                warn!(action, error = %err, "command failed");
                render::error(action, &err)
            }
        }
    }

    async fn dispatch(&self, command: Command) -> Result<String, (&'static str, ExchangeError)> {
        let facade = &self.facade;
        match command {
            Command::Help => Ok(HELP.to_string()),
            Command::Start => self.start().await.map_err(|e| ("loading overview", e)),
            Command::Balance => facade
                .get_account_balance()
                .await
                .map(|b| render::balances(&b))
                .map_err(|e| ("fetching balance", e)),
            Command::Positions { symbol } => self
                .positions(symbol.as_deref())
                .await
                .map_err(|e| ("fetching positions", e)),
            Command::Price { symbol } => {
                let symbol = self.symbol(symbol);
                let ticker = facade
                    .get_24h_ticker(&symbol)
                    .await
                    .map_err(|e| ("fetching price", e))?;
                // Mark price is supplementary; the ticker alone is still a useful reply
                let mark = facade.get_mark_price(&symbol).await.ok();
                Ok(render::price(&ticker, mark.as_ref()))
            }
            Command::Market {
                side,
                quantity,
                symbol,
            } => {
                let action = match side {
                    OrderSide::Buy => "placing buy",
                    OrderSide::Sell => "placing sell",
                };
                let order = OrderRequest::market(self.symbol(symbol), side, quantity);
                facade
                    .place_order(order)
                    .await
                    .map(|o| render::order(&o))
                    .map_err(|e| (action, e))
            }
            Command::Limit {
                side,
                quantity,
                price,
                symbol,
            } => {
                let order = OrderRequest::limit(self.symbol(symbol), side, quantity, price);
                facade
                    .place_order(order)
                    .await
                    .map(|o| render::order(&o))
                    .map_err(|e| ("placing limit order", e))
            }
            Command::Cancel { order_id, symbol } => facade
                .cancel_order(&self.symbol(symbol), &order_id)
                .await
                .map(|o| render::order(&o))
                .map_err(|e| ("cancelling order", e)),
            Command::Order { order_id, symbol } => facade
                .get_order(&self.symbol(symbol), &order_id)
                .await
                .map(|o| render::order(&o))
                .map_err(|e| ("fetching order", e)),
            Command::Leverage { leverage, symbol } => facade
                .set_leverage(&self.symbol(symbol), leverage)
                .await
                .map(|c| render::leverage(&c))
                .map_err(|e| ("setting leverage", e)),
            Command::MarginType {
                margin_type,
                symbol,
            } => facade
                .set_margin_type(&self.symbol(symbol), &margin_type)
                .await
                .map(|c| render::margin_type(&c))
                .map_err(|e| ("setting margin type", e)),
            Command::Margin {
                direction,
                amount,
                symbol,
            } => facade
                .adjust_margin(&self.symbol(symbol), amount, direction)
                .await
                .map(|a| render::margin(&a))
                .map_err(|e| ("adjusting margin", e)),
        }
    }

    async fn positions(&self, symbol: Option<&str>) -> Result<String, ExchangeError> {
        let positions = self.facade.get_positions(symbol).await?;
        let mut blocks = Vec::with_capacity(positions.len());
        for position in &positions {
            let open_interest = self
                .facade
                .get_open_interest(position.symbol.as_str())
                .await
                .map(|oi| oi.open_interest)
                .ok();
            blocks.push(render::position(position, open_interest));
        }
        Ok(render::positions(&blocks))
    }

    async fn start(&self) -> Result<String, ExchangeError> {
        let mut board = Vec::with_capacity(self.watchlist.len());
        for symbol in &self.watchlist {
            match self.facade.get_24h_ticker(symbol).await {
                Ok(ticker) => board.push(render::ticker_line(&ticker)),
                Err(err) => {
                    warn!(%symbol, error = %err, "watchlist ticker unavailable");
                    board.push(format!("{} unavailable", symbol));
                }
            }
        }

        let positions = self.facade.get_positions(None).await?;
        let balances = self.facade.get_account_balance().await?;
        let positions_text = self.positions(None).await?;

        Ok(format!(
            "{}\n\n{}\n\n{}",
            board.join("\n"),
            render::portfolio(&positions, &balances),
            positions_text
        ))
    }
}
