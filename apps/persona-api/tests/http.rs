use std::sync::Arc;

use axum::{
	body::{Body, to_bytes},
	http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use persona_api::{routes, state::AppState};
use persona_service::{CompletionProvider, SearchProvider};
use persona_testkit::{MockCompletion, MockSearch, chunk_hit, person_hit, test_config};

fn app(search: MockSearch, completion: MockCompletion) -> (axum::Router, Arc<MockSearch>) {
	let search = Arc::new(search);
	let completion = Arc::new(completion);
	let state = AppState::with_providers(
		test_config(),
		Arc::clone(&search) as Arc<dyn SearchProvider>,
		completion as Arc<dyn CompletionProvider>,
	);

	(routes::router(state), search)
}

fn turn_request(body: Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri("/v1/turn")
		.header("content-type", "application/json")
		.body(Body::from(body.to_string()))
		.expect("request build failed")
}

async fn json_body(response: axum::response::Response) -> Value {
	let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body read failed");

	serde_json::from_slice(&bytes).expect("body is not JSON")
}

#[tokio::test]
async fn health_is_ok() {
	let (app, _) = app(MockSearch::default(), MockCompletion::default());
	let response = app
		.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn turn_resolves_a_clear_query() {
	let people = vec![person_hit("A", "Ana Diaz", 0.91), person_hit("B", "Ana Ruiz", 0.20)];
	let chunks = vec![chunk_hit("c1", "A", "Ana led the data team.", 0.9)];
	let (app, _) = app(MockSearch::new(people, chunks), MockCompletion::default());
	let response = app
		.oneshot(turn_request(json!({
			"session_id": "s1",
			"query": "Tell me about Ana Diaz"
		})))
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);

	let body = json_body(response).await;

	assert_eq!(body["person_ids"], json!(["A"]));
	assert_eq!(body["trace"]["decision"], json!("clear_top1"));
	assert_eq!(body["trace"]["need_user_input"], json!(false));
}

#[tokio::test]
async fn ambiguous_turn_round_trips_over_http() {
	let people = vec![person_hit("A", "Ana Diaz", 0.91), person_hit("B", "Ana Ruiz", 0.88)];
	let chunks = vec![chunk_hit("c1", "B", "Evidence for B.", 0.9)];
	let (app, _) = app(MockSearch::new(people, chunks), MockCompletion::default());
	let first = app
		.clone()
		.oneshot(turn_request(json!({ "session_id": "s1", "query": "Who is Ana?" })))
		.await
		.unwrap();
	let first_body = json_body(first).await;

	assert_eq!(first_body["trace"]["need_user_input"], json!(true));

	// Echo the returned candidates with the raw reply, as the contract asks.
	let second = app
		.oneshot(turn_request(json!({
			"session_id": "s1",
			"query": "2",
			"disambiguation_choice": "2",
			"candidates": first_body["candidates"],
		})))
		.await
		.unwrap();
	let second_body = json_body(second).await;

	assert_eq!(second_body["trace"]["decision"], json!("user_selected"));
	assert_eq!(second_body["person_ids"], json!(["B"]));
}

#[tokio::test]
async fn blank_query_is_a_bad_request() {
	let (app, _) = app(MockSearch::default(), MockCompletion::default());
	let response = app
		.oneshot(turn_request(json!({ "session_id": "s1", "query": "  " })))
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let body = json_body(response).await;

	assert_eq!(body["error_code"], json!("invalid_request"));
}

#[tokio::test]
async fn search_outage_maps_to_bad_gateway() {
	let (app, search) = app(MockSearch::default(), MockCompletion::default());

	search.set_unavailable(true);

	let response = app
		.oneshot(turn_request(json!({ "session_id": "s1", "query": "Who is Ana?" })))
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

	let body = json_body(response).await;

	assert_eq!(body["error_code"], json!("search_unavailable"));
}
