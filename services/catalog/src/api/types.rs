//! Request and response bodies for the catalog API.
use crate::auth::AuthChannel;
use crate::listing::display::{CarCard, CarDetail, PropertyCard, PropertyDetail};
use crate::listing::query::PageMeta;
use crate::media::UploadedImage;
use crate::model::{Car, Property};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// One page of results.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(
    PropertyListResponse = ListResponse<Property>,
    CarListResponse = ListResponse<Car>,
    PropertyCardListResponse = ListResponse<PropertyCard>,
    CarCardListResponse = ListResponse<CarCard>
)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(
    PropertyResponse = ItemResponse<Property>,
    CarResponse = ItemResponse<Car>,
    PropertyDetailResponse = ItemResponse<PropertyDetail>,
    CarDetailResponse = ItemResponse<CarDetail>
)]
pub struct ItemResponse<T> {
    pub item: T,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub storage: String,
    pub durable: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadResponse {
    pub images: Vec<UploadedImage>,
}

/// Staff credentials for `POST /api/auth/login`.
#[derive(Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// A session issued by a successful login. The same token is also set as the
/// session cookie.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
    pub subject: String,
    /// Seconds until the session expires.
    pub expires_in: u64,
}

/// The resolved caller, as the catalog sees it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WhoAmIResponse {
    pub authenticated: bool,
    pub role: Option<String>,
    pub subject: Option<String>,
    pub email: Option<String>,
    pub channel: AuthChannel,
    /// Actions the resolved role may perform.
    pub permissions: Vec<String>,
}
