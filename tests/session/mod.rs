//! A real `reqwest`-backed round trip through `SessionPipeline`, exercising
//! `ReqwestHttpTransport`'s cookie jar and header plumbing end-to-end.
//! `pipeline.rs`'s own inline tests cover the state machine against a
//! hand-rolled `ScriptedTransport`; this complements them by proving the
//! production transport actually speaks HTTP the pipeline expects.

use chrono::NaiveDate;
use detainee_locator_core::model::query::{Language, SearchQuery};
use detainee_locator_core::model::session::SessionState;
use detainee_locator_core::session::{HttpTransport, ReqwestHttpTransport, SessionPhase, SessionPipeline};
use uuid::Uuid;

use crate::common::{form_html, results_html_one_row};

#[tokio::test]
async fn reqwest_transport_completes_a_full_get_post_round_trip() {
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
    let transport = ReqwestHttpTransport::new(5);
    let pipeline = SessionPipeline::new(&transport as &dyn HttpTransport, &form_url);

    let mut session = SessionState::new(Uuid::new_v4(), Language::En);
    let query = SearchQuery::by_name(
        "John",
        "Doe",
        None,
        NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
        "Mexico",
    );

    let phase = pipeline.run(&mut session, &query, &[]).await.expect("pipeline should settle");
    match phase {
        SessionPhase::Results(records) => {
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].full_name, "John Doe");
        }
        SessionPhase::NotFound => panic!("expected a results page, got NotFound"),
    }
}
