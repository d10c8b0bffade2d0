use crate::state::AppState;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};

pub fn new() -> Router<AppState> {
    Router::new().route("/", get(index))
}

pub async fn index() -> Json<&'static str> {
    Json("notion blog server index page")
}

pub async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "empty page")
}
