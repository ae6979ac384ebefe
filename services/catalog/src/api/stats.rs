//! Admin dashboard statistics endpoint.
use crate::api::error::{ApiError, api_internal};
use crate::app::AppState;
use crate::auth::require_permission;
use crate::stats::{CatalogStats, catalog_stats};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use luxe_authz::Action;

#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Catalog statistics", body = CatalogStats),
        (status = 401, description = "Not authenticated", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CatalogStats>, ApiError> {
    require_permission(&state, &headers, Action::StatsView)?;
    let stats = catalog_stats(state.store.as_ref())
        .await
        .map_err(|err| api_internal("failed to compute statistics", &err))?;
    Ok(Json(stats))
}
