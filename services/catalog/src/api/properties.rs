//! Property catalog handlers (management surface).
//!
//! # Purpose
//! Listing, lookup and role-gated CRUD for real-estate properties. Reads are
//! open; writes require `listing.write`.
use crate::api::error::{ApiError, api_bad_body};
use crate::api::types::{
    ItemResponse, ListResponse, MessageResponse, PropertyListResponse, PropertyResponse,
};
use crate::app::AppState;
use crate::auth::require_permission;
use crate::listing::{self, query::Surface, query::build_query};
use crate::model::{Property, PropertyDraft, PropertyPatch};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use luxe_authz::Action;
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/api/properties",
    tag = "properties",
    params(
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size (1-100, default 10)"),
        ("status" = Option<String>, Query, description = "Exact status"),
        ("propertyType" = Option<String>, Query, description = "Exact property type"),
        ("featured" = Option<bool>, Query, description = "Only featured when true"),
        ("minPrice" = Option<f64>, Query, description = "Inclusive lower price bound"),
        ("maxPrice" = Option<f64>, Query, description = "Inclusive upper price bound"),
        ("bedrooms" = Option<u32>, Query, description = "Exact bedroom count"),
        ("location" = Option<String>, Query, description = "Location substring"),
        ("search" = Option<String>, Query, description = "Substring over title, description, location")
    ),
    responses(
        (status = 200, description = "Page of properties", body = PropertyListResponse),
        (status = 400, description = "Invalid query parameter", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_properties(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PropertyListResponse>, ApiError> {
    let query = build_query::<Property>(&params, Surface::Admin)?;
    let page = listing::list::<Property, _>(state.store.as_ref(), &query).await?;
    Ok(Json(ListResponse {
        items: page.items,
        pagination: page.pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/properties/{id}",
    tag = "properties",
    params(("id" = String, Path, description = "Property id")),
    responses(
        (status = 200, description = "Property", body = PropertyResponse),
        (status = 404, description = "Property not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PropertyResponse>, ApiError> {
    let item = listing::get::<Property, _>(state.store.as_ref(), &id).await?;
    Ok(Json(ItemResponse { item }))
}

#[utoipa::path(
    post,
    path = "/api/properties",
    tag = "properties",
    request_body = PropertyDraft,
    responses(
        (status = 201, description = "Property created", body = PropertyResponse),
        (status = 400, description = "Validation failure or duplicate title", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Role may not write listings", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_property(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<PropertyDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<PropertyResponse>), ApiError> {
    let actor = require_permission(&state, &headers, Action::ListingWrite)?;
    let Json(draft) = body.map_err(api_bad_body)?;
    let item = listing::create::<Property, _>(state.store.as_ref(), draft, &actor).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse { item })))
}

#[utoipa::path(
    put,
    path = "/api/properties/{id}",
    tag = "properties",
    params(("id" = String, Path, description = "Property id")),
    request_body = PropertyPatch,
    responses(
        (status = 200, description = "Property updated", body = PropertyResponse),
        (status = 400, description = "Validation failure or duplicate title", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Property not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_property(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<PropertyPatch>, JsonRejection>,
) -> Result<Json<PropertyResponse>, ApiError> {
    let actor = require_permission(&state, &headers, Action::ListingWrite)?;
    let Json(patch) = body.map_err(api_bad_body)?;
    let item = listing::update::<Property, _>(state.store.as_ref(), &id, patch, &actor).await?;
    Ok(Json(ItemResponse { item }))
}

#[utoipa::path(
    delete,
    path = "/api/properties/{id}",
    tag = "properties",
    params(("id" = String, Path, description = "Property id")),
    responses(
        (status = 200, description = "Property deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Property not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_property(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let actor = require_permission(&state, &headers, Action::ListingWrite)?;
    listing::delete::<Property, _>(state.store.as_ref(), state.media.as_ref(), &id, &actor).await?;
    Ok(Json(MessageResponse {
        message: "Property deleted successfully".to_string(),
    }))
}
