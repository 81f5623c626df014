use kanshi_core::sheet::entity::SignalStatus;
use kanshi_core::sheet::error::SourceError;
use kanshi_core::sheet::port::SnapshotSource;
use kanshi_feed::sheet::SheetSource;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn install_crypto() {
    // 同一进程内重复安装会返回 Err
    rustls::crypto::ring::default_provider().install_default().ok();
}

async fn source_for(server: &MockServer, timeout: Duration) -> SheetSource {
    install_crypto();
    SheetSource::new(format!("{}/sheet.json", server.uri()), timeout).unwrap()
}

#[tokio::test]
async fn test_fetch_parses_sheet_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sheet.json"))
        .and(header("cache-control", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signals": [{
                "id": 17,
                "sheetIndex": "4",
                "status": "partial",
                "symbol": "BANKNIFTY 51000 PE",
                "entryPrice": "245.5",
                "stopLoss": 210,
                "targets": "280 / 320",
                "isBTST": "TRUE",
                "remarks": "trail after T1"
            }],
            "watchlist": [{ "symbol": "NIFTY", "price": "24,512.30", "change": -0.4 }],
            "news": [{ "headline": "RBI policy today" }]
        })))
        .mount(&server)
        .await;

    let source = source_for(&server, Duration::from_secs(5)).await;
    let snapshot = source.fetch_snapshot().await.unwrap();

    let signal = snapshot.signal("17").unwrap();
    assert_eq!(signal.sheet_index, 4);
    assert_eq!(signal.status, SignalStatus::Partial);
    assert_eq!(signal.entry_price, Some(245.5));
    assert_eq!(signal.stop_loss, Some(210.0));
    assert_eq!(signal.targets, vec![280.0, 320.0]);
    assert!(signal.is_btst);
    assert_eq!(signal.extra["remarks"], json!("trail after T1"));

    let nifty = snapshot.watch("NIFTY").unwrap();
    assert_eq!(nifty.price.as_number(), Some(24512.3));
    assert!(snapshot.extras.contains_key("news"));
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = source_for(&server, Duration::from_secs(5)).await;
    let result = source.fetch_snapshot().await;
    assert!(matches!(result, Err(SourceError::Status(503))));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let source = source_for(&server, Duration::from_secs(5)).await;
    let result = source.fetch_snapshot().await;
    assert!(matches!(result, Err(SourceError::Parse(_))));
}

#[tokio::test]
async fn test_unknown_status_keeps_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signals": [
                { "id": "1", "status": "ACTIVE", "stopLoss": 90 },
                { "id": "2", "status": "PENDING REVIEW", "stopLoss": 150 }
            ]
        })))
        .mount(&server)
        .await;

    let source = source_for(&server, Duration::from_secs(5)).await;
    let snapshot = source.fetch_snapshot().await.unwrap();

    assert_eq!(snapshot.signals.len(), 2);
    assert_eq!(snapshot.signal("1").unwrap().stop_loss, Some(90.0));
    assert_eq!(
        snapshot.signal("2").unwrap().status,
        SignalStatus::Unknown("PENDING REVIEW".to_string())
    );
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "signals": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let source = source_for(&server, Duration::from_millis(200)).await;
    let result = source.fetch_snapshot().await;
    assert!(matches!(result, Err(SourceError::Network(_))));
}
