//! Anonymous browsing endpoints.
//!
//! # Purpose
//! Serves the public site: card lists ordered featured-first and detail views
//! with pre-formatted prices. No credentials are read here.
//!
//! # Key invariants and assumptions
//! - `propertyType` on the property list selects a browsing tab (Buy, Rent,
//!   Airbnb/Short Let) rather than an exact type.
//! - Unknown or malformed ids answer 404.
use crate::api::error::ApiError;
use crate::api::types::{
    CarCardListResponse, CarDetailResponse, ItemResponse, ListResponse, PropertyCardListResponse,
    PropertyDetailResponse,
};
use crate::app::AppState;
use crate::listing::display::{CarCard, CarDetail, PropertyCard, PropertyDetail};
use crate::listing::{self, query::Surface, query::build_query};
use crate::model::{Car, Property};
use axum::Json;
use axum::extract::{Path, Query, State};
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/api/public/properties",
    tag = "public",
    params(
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size (1-100, default 12)"),
        ("propertyType" = Option<String>, Query, description = "Browsing tab: Buy, Rent, Airbnb or Short Let"),
        ("featured" = Option<bool>, Query, description = "Only featured when true"),
        ("minPrice" = Option<f64>, Query, description = "Inclusive lower price bound"),
        ("maxPrice" = Option<f64>, Query, description = "Inclusive upper price bound"),
        ("bedrooms" = Option<u32>, Query, description = "Exact bedroom count"),
        ("location" = Option<String>, Query, description = "Location substring"),
        ("search" = Option<String>, Query, description = "Free-text substring")
    ),
    responses(
        (status = 200, description = "Property cards", body = PropertyCardListResponse),
        (status = 400, description = "Invalid query parameter", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_public_properties(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PropertyCardListResponse>, ApiError> {
    let query = build_query::<Property>(&params, Surface::Public)?;
    let page = listing::list::<Property, _>(state.store.as_ref(), &query).await?;
    Ok(Json(ListResponse {
        items: page.items.iter().map(PropertyCard::from).collect(),
        pagination: page.pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/public/properties/{id}",
    tag = "public",
    params(("id" = String, Path, description = "Property id")),
    responses(
        (status = 200, description = "Property detail", body = PropertyDetailResponse),
        (status = 404, description = "Property not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_public_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PropertyDetailResponse>, ApiError> {
    let property = listing::get::<Property, _>(state.store.as_ref(), &id).await?;
    Ok(Json(ItemResponse {
        item: PropertyDetail::from(property),
    }))
}

#[utoipa::path(
    get,
    path = "/api/public/cars",
    tag = "public",
    params(
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size (1-100, default 12)"),
        ("status" = Option<String>, Query, description = "Exact status"),
        ("make" = Option<String>, Query, description = "Make substring"),
        ("model" = Option<String>, Query, description = "Model substring"),
        ("year" = Option<u16>, Query, description = "Exact model year"),
        ("featured" = Option<bool>, Query, description = "Only featured when true"),
        ("minPrice" = Option<f64>, Query, description = "Inclusive lower price bound"),
        ("maxPrice" = Option<f64>, Query, description = "Inclusive upper price bound"),
        ("search" = Option<String>, Query, description = "Free-text substring")
    ),
    responses(
        (status = 200, description = "Car cards", body = CarCardListResponse),
        (status = 400, description = "Invalid query parameter", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_public_cars(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<CarCardListResponse>, ApiError> {
    let query = build_query::<Car>(&params, Surface::Public)?;
    let page = listing::list::<Car, _>(state.store.as_ref(), &query).await?;
    Ok(Json(ListResponse {
        items: page.items.iter().map(CarCard::from).collect(),
        pagination: page.pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/public/cars/{id}",
    tag = "public",
    params(("id" = String, Path, description = "Car id")),
    responses(
        (status = 200, description = "Car detail", body = CarDetailResponse),
        (status = 404, description = "Car not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_public_car(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CarDetailResponse>, ApiError> {
    let car = listing::get::<Car, _>(state.store.as_ref(), &id).await?;
    Ok(Json(ItemResponse {
        item: CarDetail::from(car),
    }))
}
