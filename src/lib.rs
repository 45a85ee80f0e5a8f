pub mod bot;
pub mod core;
pub mod exchanges;

pub use bot::CommandHandler;
pub use crate::core::{
    config::ExchangeConfig,
    errors::ExchangeError,
    traits::{AccountInfo, MarketDataSource, OrderPlacer, PositionSettings, TradingFacade},
    types::*,
};
pub use exchanges::aster::{build_connector, AsterConnector};
