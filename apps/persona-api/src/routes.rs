use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use persona_service::{Error as ServiceError, TurnRequest, TurnResponse};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/turn", post(turn))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn turn(
	State(state): State<AppState>,
	Json(payload): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
	let response = state.service.handle_turn(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let (status, error_code) = match &err {
			ServiceError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
			ServiceError::SearchUnavailable { .. } =>
				(StatusCode::BAD_GATEWAY, "search_unavailable"),
			ServiceError::GenerationUnavailable { .. } =>
				(StatusCode::BAD_GATEWAY, "generation_unavailable"),
		};

		Self { status, error_code: error_code.to_string(), message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
