//! `GET /healthz`.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthBody {
    status: &'static str,
}

pub async fn healthz() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}
