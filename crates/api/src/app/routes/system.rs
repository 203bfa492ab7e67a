use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

const STYLESHEET: &str = include_str!("../../../assets/styles.css");

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}
