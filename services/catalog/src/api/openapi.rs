//! OpenAPI schema aggregation for the catalog API.
use crate::api::types::{
    CarCardListResponse, CarDetailResponse, CarListResponse, CarResponse, ErrorResponse,
    HealthStatus, LoginRequest, LoginResponse, MessageResponse, PropertyCardListResponse,
    PropertyDetailResponse, PropertyListResponse, PropertyResponse, UploadResponse,
    WhoAmIResponse,
};
use crate::api::{auth, cars, properties, public, stats, system, upload};
use crate::auth::AuthChannel;
use crate::listing::display::{CarCard, CarDetail, PropertyCard, PropertyDetail};
use crate::listing::query::PageMeta;
use crate::media::UploadedImage;
use crate::model::{
    Car, CarCondition, CarDraft, CarPatch, CarStatus, Currency, FuelType, Property, PropertyDraft,
    PropertyPatch, PropertyStatus, PropertyType, Transmission,
};
use crate::stats::{CarStats, CatalogStats, CatalogTotals, PropertyStats};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "luxe-catalog",
        version = "v1",
        description = "Property and car listings catalog API"
    ),
    paths(
        system::system_health,
        auth::login,
        auth::logout,
        auth::whoami,
        properties::list_properties,
        properties::get_property,
        properties::create_property,
        properties::update_property,
        properties::delete_property,
        cars::list_cars,
        cars::get_car,
        cars::create_car,
        cars::update_car,
        cars::delete_car,
        public::list_public_properties,
        public::get_public_property,
        public::list_public_cars,
        public::get_public_car,
        upload::upload_images,
        stats::get_stats
    ),
    components(schemas(
        ErrorResponse,
        HealthStatus,
        MessageResponse,
        LoginRequest,
        LoginResponse,
        WhoAmIResponse,
        AuthChannel,
        PageMeta,
        Currency,
        Property,
        PropertyType,
        PropertyStatus,
        PropertyDraft,
        PropertyPatch,
        PropertyListResponse,
        PropertyResponse,
        Car,
        CarStatus,
        CarCondition,
        FuelType,
        Transmission,
        CarDraft,
        CarPatch,
        CarListResponse,
        CarResponse,
        PropertyCard,
        CarCard,
        PropertyDetail,
        CarDetail,
        PropertyCardListResponse,
        CarCardListResponse,
        PropertyDetailResponse,
        CarDetailResponse,
        UploadedImage,
        UploadResponse,
        PropertyStats,
        CarStats,
        CatalogTotals,
        CatalogStats
    )),
    tags(
        (name = "system", description = "Health endpoints"),
        (name = "auth", description = "Staff sign-in and session introspection"),
        (name = "properties", description = "Property management"),
        (name = "cars", description = "Car management"),
        (name = "public", description = "Anonymous browsing"),
        (name = "media", description = "Image uploads"),
        (name = "stats", description = "Dashboard statistics")
    )
)]
pub struct ApiDoc;
