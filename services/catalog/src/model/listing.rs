//! Shared listing abstraction.
//!
//! # Purpose
//! Properties and cars are structurally parallel: both have a unique title,
//! price/currency, images, a featured flag, and timestamps. [`Listing`]
//! captures that shape so stores and the listing service are written once and
//! instantiated per kind.
//!
//! # Key invariants
//! - `id` is assigned on creation and never changes.
//! - Titles are stored trimmed; uniqueness is per kind and case-sensitive.
//! - `validate` is the authoritative check; it runs on every create and on the
//!   merged document of every update.
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;
pub const LOCATION_MAX_CHARS: usize = 200;

/// Field-level validation failure with a client-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Property,
    Car,
}

impl ListingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingKind::Property => "property",
            ListingKind::Car => "car",
        }
    }

    /// Collection (and table) name for this kind.
    pub fn collection(self) -> &'static str {
        match self {
            ListingKind::Property => "properties",
            ListingKind::Car => "cars",
        }
    }
}

impl std::fmt::Display for ListingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

string_enum! {
    /// Currency a listing is priced in.
    Currency {
        Ngn => "NGN",
        Usd => "USD",
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Ngn
    }
}

impl Currency {
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Ngn => "₦",
            Currency::Usd => "$",
        }
    }
}

/// Filterable/searchable document fields.
///
/// Filters refer to fields by this enum rather than by name so that every
/// backend maps them through a fixed allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    Location,
    Status,
    PropertyType,
    Bedrooms,
    Make,
    Model,
    Year,
    Featured,
    Price,
}

impl Field {
    /// Column name in the relational backend.
    pub fn column(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Location => "location",
            Field::Status => "status",
            Field::PropertyType => "property_type",
            Field::Bedrooms => "bedrooms",
            Field::Make => "make",
            Field::Model => "model",
            Field::Year => "year",
            Field::Featured => "featured",
            Field::Price => "price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Int(i64),
    Number(f64),
    Bool(bool),
}

/// A catalog document kind.
pub trait Listing: Clone + Serialize + Send + Sync + 'static {
    /// Create payload; required fields are non-optional.
    type Draft: DeserializeOwned + Send + 'static;
    /// Update payload; every field optional, absent fields keep prior values.
    type Patch: DeserializeOwned + Send + 'static;

    const KIND: ListingKind;
    /// Fields matched by free-text `search`, OR-combined.
    const SEARCH_FIELDS: &'static [Field];

    fn from_draft(id: String, draft: Self::Draft, now: DateTime<Utc>) -> Self;
    fn apply_patch(&mut self, patch: Self::Patch);

    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn images(&self) -> &[String];
    fn featured(&self) -> bool;
    fn price(&self) -> f64;
    fn currency(&self) -> Currency;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
    fn set_updated_at(&mut self, at: DateTime<Utc>);

    /// Value of a filterable field, `None` if this kind has no such field.
    fn field(&self, field: Field) -> Option<FieldValue<'_>>;

    fn validate(&self) -> Result<(), ValidationError>;
}

pub(crate) fn check_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::new("title is required"));
    }
    check_max_chars("title", title, TITLE_MAX_CHARS)
}

pub(crate) fn check_required(name: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError(format!("{name} is required")));
    }
    Ok(())
}

pub(crate) fn check_max_chars(name: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError(format!(
            "{name} cannot be more than {max} characters"
        )));
    }
    Ok(())
}

pub(crate) fn check_price(price: f64) -> Result<(), ValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::new("price must be a non-negative number"));
    }
    Ok(())
}

pub(crate) fn check_images(images: &[String]) -> Result<(), ValidationError> {
    if images.is_empty() {
        return Err(ValidationError::new("at least one image is required"));
    }
    if images.iter().any(|url| url.trim().is_empty()) {
        return Err(ValidationError::new("image urls cannot be blank"));
    }
    Ok(())
}

pub(crate) fn check_common(
    title: &str,
    description: &str,
    location: &str,
    price: f64,
    images: &[String],
) -> Result<(), ValidationError> {
    check_title(title)?;
    check_required("description", description)?;
    check_max_chars("description", description, DESCRIPTION_MAX_CHARS)?;
    check_required("location", location)?;
    check_max_chars("location", location, LOCATION_MAX_CHARS)?;
    check_price(price)?;
    check_images(images)
}
