use async_trait::async_trait;
use aster_trader::core::config::ExchangeConfig;
use aster_trader::core::kernel::{RawResponse, RestClient, SignedRequest, TransportFailure};
use aster_trader::exchanges::aster::build_connector_with_rest;
use aster_trader::{AccountInfo, ExchangeError, MarketDataSource, OrderPlacer, OrderRequest, OrderSide};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays a fixed list of outcomes and records every request it was given.
#[derive(Clone, Default)]
struct ScriptedRest {
    outcomes: Arc<Mutex<Vec<Result<RawResponse, TransportFailure>>>>,
    sent: Arc<Mutex<Vec<SignedRequest>>>,
}

impl ScriptedRest {
    fn new(mut outcomes: Vec<Result<RawResponse, TransportFailure>>) -> Self {
        outcomes.reverse();
        Self {
            outcomes: Arc::new(Mutex::new(outcomes)),
            sent: Arc::default(),
        }
    }

    fn sent(&self) -> Vec<SignedRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl RestClient for ScriptedRest {
    async fn send(&self, request: &SignedRequest) -> Result<RawResponse, TransportFailure> {
        self.sent.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(TransportFailure::NotSent("script exhausted".into())))
    }
}

fn timed_out() -> Result<RawResponse, TransportFailure> {
    Err(TransportFailure::Ambiguous {
        reason: "operation timed out".to_string(),
        timed_out: true,
    })
}

fn config() -> ExchangeConfig {
    ExchangeConfig::evm(
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string(),
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
    )
    .timeout(Duration::from_secs(2))
    .max_retries(2)
}

const TICKER: &str = r#"{"symbol":"ETHUSDT","lastPrice":"2500.5","priceChange":"25",
    "priceChangePercent":"1.01","highPrice":"2550","lowPrice":"2440","volume":"1000","quoteVolume":"2500500"}"#;

#[tokio::test]
async fn test_idempotent_read_retries_after_timeout() {
    let rest = ScriptedRest::new(vec![timed_out(), Ok(RawResponse::new(200, TICKER))]);
    let connector = build_connector_with_rest(rest.clone(), &config()).unwrap();

    let ticker = connector.get_24h_ticker("ETHUSDT").await.unwrap();

    assert_eq!(ticker.last_price.to_wire(), "2500.5");
    assert_eq!(rest.sent().len(), 2);
}

#[tokio::test]
async fn test_positions_after_timeout_match_a_clean_read() {
    let body = r#"[{"symbol":"ETHUSDT","positionAmt":"2","entryPrice":"2000","markPrice":"2100",
        "unRealizedProfit":"200","liquidationPrice":"1500","leverage":"5","marginType":"cross",
        "positionSide":"BOTH"}]"#;

    let clean = ScriptedRest::new(vec![Ok(RawResponse::new(200, body))]);
    let expected = build_connector_with_rest(clean, &config())
        .unwrap()
        .get_positions(None)
        .await
        .unwrap();

    let flaky = ScriptedRest::new(vec![timed_out(), Ok(RawResponse::new(200, body))]);
    let positions = build_connector_with_rest(flaky.clone(), &config())
        .unwrap()
        .get_positions(None)
        .await
        .unwrap();

    assert_eq!(flaky.sent().len(), 2);
    assert_eq!(positions.len(), expected.len());
    assert_eq!(positions[0].symbol, expected[0].symbol);
    assert_eq!(positions[0].position_amount, expected[0].position_amount);
    assert_eq!(positions[0].unrealized_pnl, expected[0].unrealized_pnl);
}

#[tokio::test]
async fn test_idempotent_read_gives_up_after_retries() {
    let rest = ScriptedRest::new(vec![timed_out(), timed_out(), timed_out()]);
    let connector = build_connector_with_rest(rest.clone(), &config()).unwrap();

    let err = connector.get_24h_ticker("ETHUSDT").await.unwrap_err();

    assert!(matches!(err, ExchangeError::TransportError(_)), "{:?}", err);
    assert_eq!(rest.sent().len(), 3);
}

#[tokio::test]
async fn test_order_timeout_reports_unknown_outcome_without_resending() {
    let rest = ScriptedRest::new(vec![timed_out(), Ok(RawResponse::new(200, "{}"))]);
    let connector = build_connector_with_rest(rest.clone(), &config()).unwrap();

    let err = connector
        .place_order(OrderRequest::market("BTCUSDT", OrderSide::Buy, "0.01".parse().unwrap()))
        .await
        .unwrap_err();

    assert!(err.is_unknown_outcome(), "{:?}", err);
    assert!(!err.is_retryable());
    assert_eq!(rest.sent().len(), 1);
}

#[tokio::test]
async fn test_connection_reset_on_order_is_never_a_success() {
    let rest = ScriptedRest::new(vec![
        Err(TransportFailure::Ambiguous {
            reason: "connection reset by peer".to_string(),
            timed_out: false,
        }),
        Ok(RawResponse::new(200, r#"{"orderId":1,"symbol":"BTCUSDT","status":"FILLED"}"#)),
    ]);
    let connector = build_connector_with_rest(rest.clone(), &config()).unwrap();

    let result = connector
        .place_order(OrderRequest::market("BTCUSDT", OrderSide::Sell, "1".parse().unwrap()))
        .await;

    match result {
        Err(ExchangeError::UnknownOutcome { endpoint, reason }) => {
            assert_eq!(endpoint, "POST /fapi/v3/order");
            assert!(reason.contains("connection reset"));
        }
        other => panic!("expected UnknownOutcome, got {:?}", other),
    }
    assert_eq!(rest.sent().len(), 1);
}

#[tokio::test]
async fn test_order_not_sent_is_retried_with_fresh_signature() {
    let order = r#"{"orderId":7,"symbol":"BTCUSDT","status":"NEW","origQty":"0.01",
        "executedQty":"0","avgPrice":"0","side":"BUY","type":"MARKET"}"#;
    let rest = ScriptedRest::new(vec![
        Err(TransportFailure::NotSent("connection refused".to_string())),
        Ok(RawResponse::new(200, order)),
    ]);
    let connector = build_connector_with_rest(rest.clone(), &config()).unwrap();

    let result = connector
        .place_order(OrderRequest::market("BTCUSDT", OrderSide::Buy, "0.01".parse().unwrap()))
        .await
        .unwrap();
    assert_eq!(result.order_id, "7");

    let sent = rest.sent();
    assert_eq!(sent.len(), 2);
    assert_ne!(sent[0].param("nonce"), sent[1].param("nonce"));
    assert_ne!(sent[0].param("signature"), sent[1].param("signature"));
}

#[tokio::test]
async fn test_accepted_order_with_unreadable_reply_is_unknown_outcome() {
    let rest = ScriptedRest::new(vec![Ok(RawResponse::new(200, r#"{"orderId":42,"status":"NEW"}"#))]);
    let connector = build_connector_with_rest(rest.clone(), &config()).unwrap();

    let err = connector
        .place_order(OrderRequest::market("BTCUSDT", OrderSide::Buy, "0.01".parse().unwrap()))
        .await
        .unwrap_err();

    match err {
        ExchangeError::UnknownOutcome { reason, .. } => {
            assert!(reason.contains("accepted (HTTP 200)"), "{}", reason);
        }
        other => panic!("expected UnknownOutcome, got {:?}", other),
    }
    assert_eq!(rest.sent().len(), 1);
}

#[tokio::test]
async fn test_connection_reset_on_cancel_is_unknown_outcome() {
    let rest = ScriptedRest::new(vec![
        Err(TransportFailure::Ambiguous {
            reason: "connection reset by peer".to_string(),
            timed_out: false,
        }),
        Ok(RawResponse::new(200, r#"{"orderId":9,"symbol":"BTCUSDT","status":"CANCELED"}"#)),
    ]);
    let connector = build_connector_with_rest(rest.clone(), &config()).unwrap();

    let err = connector.cancel_order("BTCUSDT", "9").await.unwrap_err();

    assert!(err.is_unknown_outcome(), "{:?}", err);
    let sent = rest.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(*sent[0].method(), reqwest::Method::DELETE);
    assert_eq!(sent[0].param("orderId"), Some("9"));
}
