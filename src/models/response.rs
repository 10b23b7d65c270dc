// src/models/response.rs

use axum::Json;
use serde::Serialize;

/// Success envelope shared by every endpoint: `{status: "success", data}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: T,
}

pub fn success<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        status: "success",
        data,
    })
}
