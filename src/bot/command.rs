use crate::core::types::{MarginDirection, OrderSide};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}. Try /help")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// A parsed chat command. Symbols are passed through as typed; the
/// exchange layer validates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Balance,
    Positions {
        symbol: Option<String>,
    },
    Price {
        symbol: Option<String>,
    },
    Market {
        side: OrderSide,
        quantity: Decimal,
        symbol: Option<String>,
    },
    Limit {
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        symbol: Option<String>,
    },
    Cancel {
        order_id: String,
        symbol: Option<String>,
    },
    Order {
        order_id: String,
        symbol: Option<String>,
    },
    Leverage {
        leverage: u32,
        symbol: Option<String>,
    },
    MarginType {
        margin_type: String,
        symbol: Option<String>,
    },
    Margin {
        direction: MarginDirection,
        amount: Decimal,
        symbol: Option<String>,
    },
}

const USAGE_BUY: &str = "/buy <quantity> [SYMBOL]";
const USAGE_SELL: &str = "/sell <quantity> [SYMBOL]";
const USAGE_LIMIT: &str = "/limit <buy|sell> <quantity> <price> [SYMBOL]";
const USAGE_CANCEL: &str = "/cancel <orderId> [SYMBOL]";
const USAGE_ORDER: &str = "/order <orderId> [SYMBOL]";
const USAGE_LEVERAGE: &str = "/leverage <1-125> [SYMBOL]";
const USAGE_MARGIN_TYPE: &str = "/margintype <ISOLATED|CROSSED> [SYMBOL]";
const USAGE_MARGIN: &str = "/margin <add|reduce> <amount> [SYMBOL]";

pub const HELP: &str = "\
/start - prices, balance and open positions
/positions [SYMBOL] - open positions
/price [SYMBOL] - last price, 24h change, funding
/balance - wallet balances
/buy <quantity> [SYMBOL] - market buy
/sell <quantity> [SYMBOL] - market sell
/limit <buy|sell> <quantity> <price> [SYMBOL] - GTC limit order
/cancel <orderId> [SYMBOL] - cancel an open order
/order <orderId> [SYMBOL] - order status
/leverage <1-125> [SYMBOL] - set leverage
/margintype <ISOLATED|CROSSED> [SYMBOL] - set margin mode
/margin <add|reduce> <amount> [SYMBOL] - adjust isolated margin";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut words = text.split_whitespace();
        let head = words.next().unwrap_or_default();
        // Telegram-style "/cmd@BotName"
        let name = head
            .trim_start_matches('/')
            .split('@')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let args: Vec<&str> = words.collect();
        let arg = |i: usize| args.get(i).map(|s| (*s).to_string());

        let command = match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "balance" => Self::Balance,
            "positions" => Self::Positions { symbol: arg(0) },
            "price" => Self::Price { symbol: arg(0) },
            "buy" | "sell" => {
                let (side, usage) = if name == "buy" {
                    (OrderSide::Buy, USAGE_BUY)
                } else {
                    (OrderSide::Sell, USAGE_SELL)
                };
                Self::Market {
                    side,
                    quantity: decimal(args.first(), usage)?,
                    symbol: arg(1),
                }
            }
            "limit" => Self::Limit {
                side: args
                    .first()
                    .and_then(|s| s.parse().ok())
                    .ok_or(CommandError::Usage(USAGE_LIMIT))?,
                quantity: decimal(args.get(1), USAGE_LIMIT)?,
                price: decimal(args.get(2), USAGE_LIMIT)?,
                symbol: arg(3),
            },
            "cancel" => Self::Cancel {
                order_id: arg(0).ok_or(CommandError::Usage(USAGE_CANCEL))?,
                symbol: arg(1),
            },
            "order" | "getorder" => Self::Order {
                order_id: arg(0).ok_or(CommandError::Usage(USAGE_ORDER))?,
                symbol: arg(1),
            },
            "leverage" => Self::Leverage {
                leverage: args
                    .first()
                    .and_then(|s| s.trim_end_matches(['x', 'X']).parse().ok())
                    .ok_or(CommandError::Usage(USAGE_LEVERAGE))?,
                symbol: arg(1),
            },
            "margintype" => Self::MarginType {
                margin_type: arg(0).ok_or(CommandError::Usage(USAGE_MARGIN_TYPE))?,
                symbol: arg(1),
            },
            "margin" => Self::Margin {
                direction: args
                    .first()
                    .and_then(|s| s.parse().ok())
                    .ok_or(CommandError::Usage(USAGE_MARGIN))?,
                amount: decimal(args.get(1), USAGE_MARGIN)?,
                symbol: arg(2),
            },
            _ => return Err(CommandError::Unknown(head.to_string())),
        };
        Ok(command)
    }
}

fn decimal(raw: Option<&&str>, usage: &'static str) -> Result<Decimal, CommandError> {
    raw.and_then(|s| s.parse::<Decimal>().ok())
        .ok_or(CommandError::Usage(usage))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Command, CommandError> {
        text.parse()
    }

    #[test]
    fn test_market_orders() {
        assert_eq!(
            parse("/buy 0.01").unwrap(),
            Command::Market {
                side: OrderSide::Buy,
                quantity: "0.01".parse().unwrap(),
                symbol: None,
            }
        );
        assert_eq!(
            parse("/sell 2 ethusdt").unwrap(),
            Command::Market {
                side: OrderSide::Sell,
                quantity: "2".parse().unwrap(),
                symbol: Some("ethusdt".to_string()),
            }
        );
        assert_eq!(parse("/buy"), Err(CommandError::Usage(USAGE_BUY)));
        assert_eq!(parse("/buy lots"), Err(CommandError::Usage(USAGE_BUY)));
    }

    #[test]
    fn test_limit_order() {
        assert_eq!(
            parse("/limit sell 1 2500.5 ETHUSDT").unwrap(),
            Command::Limit {
                side: OrderSide::Sell,
                quantity: "1".parse().unwrap(),
                price: "2500.5".parse().unwrap(),
                symbol: Some("ETHUSDT".to_string()),
            }
        );
        assert!(parse("/limit hold 1 2").is_err());
    }

    #[test]
    fn test_leverage_accepts_x_suffix_and_defers_bounds() {
        assert_eq!(
            parse("/leverage 20x").unwrap(),
            Command::Leverage {
                leverage: 20,
                symbol: None
            }
        );
        // Range checks belong to the exchange layer
        assert!(matches!(
            parse("/leverage 200").unwrap(),
            Command::Leverage { leverage: 200, .. }
        ));
        assert!(parse("/leverage -1").is_err());
    }

    #[test]
    fn test_margin_commands() {
        assert_eq!(
            parse("/margin reduce 12.5 BTCUSDT").unwrap(),
            Command::Margin {
                direction: MarginDirection::Reduce,
                amount: "12.5".parse().unwrap(),
                symbol: Some("BTCUSDT".to_string()),
            }
        );
        assert_eq!(
            parse("/margintype crossed").unwrap(),
            Command::MarginType {
                margin_type: "crossed".to_string(),
                symbol: None
            }
        );
    }

    #[test]
    fn test_bot_suffix_and_unknown() {
        assert_eq!(parse("/start@FarmBot").unwrap(), Command::Start);
        assert_eq!(parse("/getorder 42").unwrap(), Command::Order {
            order_id: "42".to_string(),
            symbol: None
        });
        assert!(matches!(parse("/moon"), Err(CommandError::Unknown(_))));
        assert!(matches!(parse(""), Err(CommandError::Unknown(_))));
    }
}
