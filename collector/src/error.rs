use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{
        IntoResponse,
        Response,
    },
};

/// Boundary errors: a rejected request never mutates the store.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("malformed snapshot body: {0}")]
    MalformedSnapshot(#[from] JsonRejection),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            axum::Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
