//! Car catalog handlers (management surface).
use crate::api::error::{ApiError, api_bad_body};
use crate::api::types::{CarListResponse, CarResponse, ItemResponse, ListResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::require_permission;
use crate::listing::{self, query::Surface, query::build_query};
use crate::model::{Car, CarDraft, CarPatch};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use luxe_authz::Action;
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/api/cars",
    tag = "cars",
    params(
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size (1-100, default 10)"),
        ("status" = Option<String>, Query, description = "Exact status"),
        ("featured" = Option<bool>, Query, description = "Only featured when true"),
        ("minPrice" = Option<f64>, Query, description = "Inclusive lower price bound"),
        ("maxPrice" = Option<f64>, Query, description = "Inclusive upper price bound"),
        ("make" = Option<String>, Query, description = "Make substring"),
        ("model" = Option<String>, Query, description = "Model substring"),
        ("year" = Option<u16>, Query, description = "Exact model year"),
        ("search" = Option<String>, Query, description = "Substring over title, description, make, model")
    ),
    responses(
        (status = 200, description = "Page of cars", body = CarListResponse),
        (status = 400, description = "Invalid query parameter", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_cars(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<CarListResponse>, ApiError> {
    let query = build_query::<Car>(&params, Surface::Admin)?;
    let page = listing::list::<Car, _>(state.store.as_ref(), &query).await?;
    Ok(Json(ListResponse {
        items: page.items,
        pagination: page.pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/cars/{id}",
    tag = "cars",
    params(("id" = String, Path, description = "Car id")),
    responses(
        (status = 200, description = "Car", body = CarResponse),
        (status = 404, description = "Car not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CarResponse>, ApiError> {
    let item = listing::get::<Car, _>(state.store.as_ref(), &id).await?;
    Ok(Json(ItemResponse { item }))
}

#[utoipa::path(
    post,
    path = "/api/cars",
    tag = "cars",
    request_body = CarDraft,
    responses(
        (status = 201, description = "Car created", body = CarResponse),
        (status = 400, description = "Validation failure or duplicate title", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Role may not write listings", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_car(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CarDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<CarResponse>), ApiError> {
    let actor = require_permission(&state, &headers, Action::ListingWrite)?;
    let Json(draft) = body.map_err(api_bad_body)?;
    let item = listing::create::<Car, _>(state.store.as_ref(), draft, &actor).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse { item })))
}

#[utoipa::path(
    put,
    path = "/api/cars/{id}",
    tag = "cars",
    params(("id" = String, Path, description = "Car id")),
    request_body = CarPatch,
    responses(
        (status = 200, description = "Car updated", body = CarResponse),
        (status = 400, description = "Validation failure or duplicate title", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Car not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_car(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<CarPatch>, JsonRejection>,
) -> Result<Json<CarResponse>, ApiError> {
    let actor = require_permission(&state, &headers, Action::ListingWrite)?;
    let Json(patch) = body.map_err(api_bad_body)?;
    let item = listing::update::<Car, _>(state.store.as_ref(), &id, patch, &actor).await?;
    Ok(Json(ItemResponse { item }))
}

#[utoipa::path(
    delete,
    path = "/api/cars/{id}",
    tag = "cars",
    params(("id" = String, Path, description = "Car id")),
    responses(
        (status = 200, description = "Car deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Car not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_car(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let actor = require_permission(&state, &headers, Action::ListingWrite)?;
    listing::delete::<Car, _>(state.store.as_ref(), state.media.as_ref(), &id, &actor).await?;
    Ok(Json(MessageResponse {
        message: "Car deleted successfully".to_string(),
    }))
}
