//! End-to-end orchestrator scenarios (spec §8), driven against a mock
//! upstream via `mockito` rather than the real locator site. Each test
//! stands in for one of the named scenarios; retry/captcha scenarios use a
//! single persistent mock response (identical on every attempt) so no
//! assumption about mockito's ordering between multiple registered mocks is
//! required.

use chrono::NaiveDate;
use detainee_locator_core::model::query::{FacilityQuery, SearchQuery};
use detainee_locator_core::model::result::SearchStatus;
use detainee_locator_core::{ErrorKind, Orchestrator};

use crate::common::{captcha_html, form_html, not_found_html, results_html_one_row, test_config};

fn name_query() -> SearchQuery {
    SearchQuery::by_name(
        "John",
        "Doe",
        None,
        NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
        "Mexico",
    )
}

fn alien_query(digits: &str) -> SearchQuery {
    let alien = detainee_locator_core::model::query::AlienNumberQuery::parse(digits).unwrap();
    SearchQuery::by_alien_number(alien)
}

/// Scenario 1: exact match.
#[tokio::test]
async fn exact_match_returns_found_with_one_record() {
    let mut server = mockito::Server::new_async().await;
    let submit_url = format!("{}/submit", server.url());
    let _form_mock = server.mock("GET", "/form").with_status(200).with_body(form_html(&submit_url)).create_async().await;
    let _submit_mock = server
        .mock("POST", "/submit")
        .with_status(200)
        .with_body(results_html_one_row())
        .create_async()
        .await;

    let form_url = format!("{}/form", server.url());
    let orchestrator = Orchestrator::new(test_config(&form_url));
    let result = orchestrator.search(name_query()).await.expect("search should succeed");

    assert_eq!(result.status, SearchStatus::Found);
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].full_name, "John Doe");
    assert_eq!(result.metadata.total_candidates, 1);
}

/// Scenario 3: not found.
#[tokio::test]
async fn no_results_banner_yields_not_found_status() {
    let mut server = mockito::Server::new_async().await;
    let submit_url = format!("{}/submit", server.url());
    let _form_mock = server.mock("GET", "/form").with_status(200).with_body(form_html(&submit_url)).create_async().await;
    let _submit_mock = server.mock("POST", "/submit").with_status(200).with_body(not_found_html()).create_async().await;

    let form_url = format!("{}/form", server.url());
    let orchestrator = Orchestrator::new(test_config(&form_url));
    let result = orchestrator.search(alien_query("A999999999")).await.expect("search should succeed");

    assert_eq!(result.status, SearchStatus::NotFound);
    assert!(result.records.is_empty());
}

/// Scenario 5: CAPTCHA surfaced on every attempt. With `retry.max_attempts =
/// 1` the orchestrator makes exactly two attempts (the original plus one
/// retry) before giving up.
#[tokio::test]
async fn persistent_captcha_surfaces_as_captcha_required_error() {
    let mut server = mockito::Server::new_async().await;
    let submit_url = format!("{}/submit", server.url());
    let _form_mock = server.mock("GET", "/form").with_status(200).with_body(form_html(&submit_url)).create_async().await;
    let _submit_mock = server.mock("POST", "/submit").with_status(200).with_body(captcha_html()).create_async().await;

    let form_url = format!("{}/form", server.url());
    let orchestrator = Orchestrator::new(test_config(&form_url));
    let err = orchestrator.search(name_query()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::CaptchaRequired);
}

/// Scenario 6: bulk partial — one invalid query fails validation before any
/// network activity, the other two succeed, and slots preserve input order.
#[tokio::test]
async fn bulk_search_preserves_order_with_one_invalid_slot() {
    let mut server = mockito::Server::new_async().await;
    let submit_url = format!("{}/submit", server.url());
    let _form_mock = server.mock("GET", "/form").with_status(200).with_body(form_html(&submit_url)).create_async().await;
    let _submit_mock = server
        .mock("POST", "/submit")
        .with_status(200)
        .with_body(results_html_one_row())
        .create_async()
        .await;

    let form_url = format!("{}/form", server.url());
    let orchestrator = Orchestrator::new(test_config(&form_url));

    let queries = vec![
        alien_query("A123456789"),
        SearchQuery::by_facility(FacilityQuery::default()),
        alien_query("A987654321"),
    ];
    let mut results = orchestrator.search_bulk(queries, 2, false).await;
    assert_eq!(results.len(), 3);

    let slot1 = results.remove(0);
    let slot2 = results.remove(0);
    let slot3 = results.remove(0);

    assert!(slot1.is_ok());
    let err = slot2.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(slot3.is_ok());
}

/// Validation failures never touch the network: no mock is registered at
/// all, so a stray HTTP call would fail the test outright.
#[tokio::test]
async fn validation_failure_never_reaches_http() {
    let orchestrator = Orchestrator::new(test_config("http://127.0.0.1:0/unused"));
    let mut query = name_query();
    query.confidence_threshold = 2.0;

    let err = orchestrator.search(query).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}
