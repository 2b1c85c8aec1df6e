use std::path::{Path, PathBuf};
use std::time::Duration;

use pretty_assertions::assert_eq;
use scout_core::{RunConfig, SelectorCatalog};
use scout_engine::{Orchestrator, RunStatus};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing_with_card(id: &str) -> String {
    format!(
        r#"<html><body>
             <div data-id="{id}">
               <a href="/item/p/{id}">Item {id}</a>
               <div class="Nx9bqj">₹1,499</div>
             </div>
           </body></html>"#
    )
}

const EMPTY_LISTING: &str = "<html><body><div>no results</div></body></html>";

fn test_config(server: &MockServer, output_dir: &Path) -> RunConfig {
    RunConfig {
        max_pages: 10,
        min_products_threshold: 1,
        min_delay_ms: 0,
        max_delay_ms: 0,
        checkpoint_interval: 100,
        base_url: server.uri(),
        output_dir: output_dir.to_string_lossy().into_owned(),
        ..RunConfig::default()
    }
}

fn find_file_with_prefix(dir: &Path, prefix: &str) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .find(|e| e.file_name().to_string_lossy().starts_with(prefix))
        .map(|e| e.path())
}

fn has_file_with_prefix(dir: &Path, prefix: &str) -> bool {
    find_file_with_prefix(dir, prefix).is_some()
}

#[tokio::test]
async fn run_ends_early_after_two_consecutive_empty_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "x"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_LISTING))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "x"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_LISTING))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_LISTING))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "x"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_with_card("ITM1")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let orchestrator =
        Orchestrator::new(test_config(&server, dir.path()), SelectorCatalog::default())
            .without_rendering();

    let outcome = orchestrator
        .run("x", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].identifier, "ITM1");
    assert_eq!(outcome.summary.status, RunStatus::Success);
    assert_eq!(outcome.summary.pages_scraped, 1);
    assert!(!outcome.interrupted);
    assert!(has_file_with_prefix(dir.path(), "checkpoint_x_pfinal_"));
}

#[tokio::test]
async fn duplicate_products_across_pages_appear_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_with_card("SAME")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_with_card("SAME")))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig {
        max_pages: 2,
        ..test_config(&server, dir.path())
    };
    let orchestrator =
        Orchestrator::new(config, SelectorCatalog::default()).without_rendering();

    let outcome = orchestrator
        .run("x", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.counters.products_found, 2);
    assert_eq!(outcome.counters.products_valid, 1);
    assert_eq!(outcome.summary.pages_scraped, 2);
}

#[tokio::test]
async fn empty_result_set_reports_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_LISTING))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let orchestrator =
        Orchestrator::new(test_config(&server, dir.path()), SelectorCatalog::default())
            .without_rendering();

    let outcome = orchestrator
        .run("nothing here", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.summary.status, RunStatus::NoResults);
    assert_eq!(outcome.summary.total_products, 0);
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.counters.pages_scraped, 0);
}

#[tokio::test]
async fn interruption_checkpoints_exactly_the_accepted_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_with_card("ITM7")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_LISTING))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    // Long pacing so the interrupt always lands between pages 1 and 2.
    let config = RunConfig {
        min_delay_ms: 60_000,
        max_delay_ms: 60_000,
        ..test_config(&server, dir.path())
    };
    let orchestrator =
        Orchestrator::new(config, SelectorCatalog::default()).without_rendering();

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            cancel.cancel();
        });
    }
    let outcome = orchestrator.run("x", cancel).await.unwrap();

    assert!(outcome.interrupted);
    assert_eq!(outcome.records.len(), 1);

    let checkpoint = find_file_with_prefix(dir.path(), "checkpoint_x_pfinal_")
        .expect("terminal checkpoint");
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&checkpoint).unwrap()).unwrap();
    let products = parsed["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["identifier"], "ITM7");
    assert_eq!(parsed["counters"]["productsValid"], 1);
}

#[tokio::test]
async fn cancelled_run_still_writes_terminal_checkpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_LISTING))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let orchestrator =
        Orchestrator::new(test_config(&server, dir.path()), SelectorCatalog::default())
            .without_rendering();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = orchestrator.run("x", cancel).await.unwrap();

    assert!(outcome.interrupted);
    assert!(outcome.records.is_empty());
    assert!(has_file_with_prefix(dir.path(), "checkpoint_x_pfinal_"));
}
