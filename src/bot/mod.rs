//! Chat-command front end over [`TradingFacade`](crate::core::traits::TradingFacade).

pub mod command;
pub mod handler;
pub mod render;

pub use command::{Command, CommandError};
pub use handler::{CommandHandler, WATCHLIST};
