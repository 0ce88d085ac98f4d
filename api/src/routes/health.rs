use rocket::{get, serde::json::Json};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

/// Liveness check.
#[openapi(tag = "Health")]
#[get("/health")]
pub(super) async fn get() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "cashless system is running",
    })
}
