//! End-to-end watch cycle tests: real HTTP fetcher, real SQLite-backed
//! history, real Telegram client, all pointed at a wiremock server.

use price_watcher::config::DbConfig;
use price_watcher::history::{HistoryStore, SqlxHistoryStore};
use price_watcher::models::{PriceChange, WatchTarget};
use price_watcher::notify::TelegramNotifier;
use price_watcher::page::HttpFetcher;
use price_watcher::watch::Watcher;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn product_page(price: &str) -> String {
    format!(
        r#"<html><body>
            <h2 class="product-title">Espresso Machine</h2>
            <div class="price-box">
                <span class="money" data-price="true">{price}</span>
            </div>
        </body></html>"#
    )
}

fn target(server: &MockServer) -> WatchTarget {
    WatchTarget {
        url: format!("{}/product", server.uri()),
        price_selector: r#"span.money[data-price="true"]"#.to_string(),
        name_selector: "h2.product-title".to_string(),
        poll_interval: Duration::from_secs(60),
    }
}

fn sqlite_config(dir: &TempDir) -> DbConfig {
    DbConfig::Sqlite { file: dir.path().join("history.db").to_string_lossy().into_owned() }
}

async fn telegram_ok(server: &MockServer, message_times: u64, photo_times: u64) {
    Mock::given(method("POST"))
        .and(path("/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(message_times)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/sendPhoto"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(photo_times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_price_drop_across_two_cycles_sends_alert() {
    let page_server = MockServer::start().await;
    let telegram_server = MockServer::start().await;

    // First cycle sees $100.00, second sees $89.99.
    Mock::given(method("GET"))
        .and(path("/product"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("$100.00")))
        .up_to_n_times(1)
        .mount(&page_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("$89.99")))
        .mount(&page_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/sendMessage"))
        .and(body_string_contains("100.00"))
        .and(body_string_contains("89.99"))
        .and(body_string_contains("Espresso+Machine"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&telegram_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sendPhoto"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&telegram_server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = SqlxHistoryStore::connect(&sqlite_config(&dir)).await.unwrap();
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let notifier = TelegramNotifier::with_base_url(telegram_server.uri(), "42").unwrap();

    let watcher = Watcher::new(target(&page_server), fetcher, store, notifier, false);

    // First observation: nothing to compare against, no alert.
    let first = watcher.run_cycle().await.unwrap();
    assert_eq!(first.change, PriceChange::First);
    assert_eq!(first.current.price, 100.0);
    assert_eq!(first.current.product_name, "Espresso Machine");

    // Second observation: drop, alert with chart.
    let second = watcher.run_cycle().await.unwrap();
    assert_eq!(second.change, PriceChange::Dropped);
    assert_eq!(second.current.price, 89.99);
    assert_eq!(second.previous.unwrap().price, 100.0);
}

#[tokio::test]
async fn test_unchanged_price_is_stored_but_silent() {
    let page_server = MockServer::start().await;
    let telegram_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/product"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("$49.99")))
        .mount(&page_server)
        .await;

    telegram_ok(&telegram_server, 0, 0).await;

    let dir = TempDir::new().unwrap();
    let store = SqlxHistoryStore::connect(&sqlite_config(&dir)).await.unwrap();
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let notifier = TelegramNotifier::with_base_url(telegram_server.uri(), "42").unwrap();

    let watcher = Watcher::new(target(&page_server), fetcher, store, notifier, false);

    assert_eq!(watcher.run_cycle().await.unwrap().change, PriceChange::First);
    assert_eq!(watcher.run_cycle().await.unwrap().change, PriceChange::Unchanged);

    // Both cycles still appended.
    let store = SqlxHistoryStore::connect(&sqlite_config(&dir)).await.unwrap();
    assert_eq!(store.all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_extraction_failure_leaves_history_untouched() {
    let page_server = MockServer::start().await;
    let telegram_server = MockServer::start().await;

    // Page without the expected price element.
    Mock::given(method("GET"))
        .and(path("/product"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>Maintenance</body></html>"),
        )
        .mount(&page_server)
        .await;

    telegram_ok(&telegram_server, 0, 0).await;

    let dir = TempDir::new().unwrap();
    let store = SqlxHistoryStore::connect(&sqlite_config(&dir)).await.unwrap();
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let notifier = TelegramNotifier::with_base_url(telegram_server.uri(), "42").unwrap();

    let watcher = Watcher::new(target(&page_server), fetcher, store, notifier, false);
    assert!(watcher.run_cycle().await.is_err());

    let store = SqlxHistoryStore::connect(&sqlite_config(&dir)).await.unwrap();
    assert!(store.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_telegram_failure_still_stores_exactly_once() {
    let page_server = MockServer::start().await;
    let telegram_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/product"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("$100.00")))
        .up_to_n_times(1)
        .mount(&page_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("$89.99")))
        .mount(&page_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/sendMessage"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&telegram_server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = SqlxHistoryStore::connect(&sqlite_config(&dir)).await.unwrap();
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let notifier = TelegramNotifier::with_base_url(telegram_server.uri(), "42").unwrap();

    let watcher = Watcher::new(target(&page_server), fetcher, store, notifier, false);

    watcher.run_cycle().await.unwrap();
    // Delivery fails, but the cycle and the append both succeed.
    let delta = watcher.run_cycle().await.unwrap();
    assert_eq!(delta.change, PriceChange::Dropped);

    // Reconnect as a restarted process would: both observations are
    // there, the failed alert did not duplicate or roll back anything.
    let store = SqlxHistoryStore::connect(&sqlite_config(&dir)).await.unwrap();
    let history = store.all().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].price, 100.0);
    assert_eq!(history[1].price, 89.99);
}

#[tokio::test]
async fn test_notify_on_first_observation() {
    let page_server = MockServer::start().await;
    let telegram_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/product"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("1.234,56")))
        .mount(&page_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/sendMessage"))
        .and(body_string_contains("1234.56"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&telegram_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sendPhoto"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&telegram_server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = SqlxHistoryStore::connect(&sqlite_config(&dir)).await.unwrap();
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let notifier = TelegramNotifier::with_base_url(telegram_server.uri(), "42").unwrap();

    let watcher = Watcher::new(target(&page_server), fetcher, store, notifier, true);

    let delta = watcher.run_cycle().await.unwrap();
    assert_eq!(delta.change, PriceChange::First);
    assert_eq!(delta.current.price, 1234.56);
}
