//! Tenant listing endpoint.

use axum::Json;
use axum::extract::State;

use crate::state::AppState;

/// `GET /api/v1/tenants` -- registered tenant ids and display names.
pub async fn list_tenants(State(state): State<AppState>) -> Json<serde_json::Value> {
    let tenants: Vec<serde_json::Value> = state
        .tenants
        .list()
        .into_iter()
        .map(|(id, name)| serde_json::json!({ "id": id, "displayName": name }))
        .collect();

    Json(serde_json::json!({ "tenants": tenants }))
}
