//! Real-estate property documents.
use super::listing::{Currency, Field, FieldValue, Listing, ListingKind, ValidationError, check_common};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

string_enum! {
    /// Fixed property categories.
    PropertyType {
        Apartment => "Apartment",
        House => "House",
        Villa => "Villa",
        Condo => "Condo (Condominium)",
        Duplex => "Duplex",
        Penthouse => "Penthouse",
        Studio => "Studio",
        Bungalow => "Bungalow",
        Townhouse => "Townhouse",
        Land => "Land",
        Commercial => "Commercial Property",
        OfficeSpace => "Office Space",
        Retail => "Retail",
        GuestHouse => "Hotel/Guest House",
        Warehouse => "Warehouse",
        Industrial => "Industrial Property",
        Farm => "Farm",
        ShortLet => "Short Let",
    }
}

string_enum! {
    PropertyStatus {
        ForSale => "For Sale",
        ForRent => "For Rent",
        Sold => "Sold",
        Rented => "Rented",
        Available => "Available",
        Taken => "Taken",
    }
}

impl PropertyStatus {
    /// Short-let properties use availability statuses; everything else uses
    /// sale/rent statuses.
    pub fn fits(self, property_type: PropertyType) -> bool {
        let short_let = matches!(self, PropertyStatus::Available | PropertyStatus::Taken);
        short_let == (property_type == PropertyType::ShortLet)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub currency: Currency,
    pub location: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub square_footage: u32,
    pub property_type: PropertyType,
    pub status: PropertyStatus,
    pub featured: bool,
    pub images: Vec<String>,
    pub interior_features: Vec<String>,
    pub exterior_features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create payload for a property.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub currency: Currency,
    pub location: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub square_footage: u32,
    pub property_type: PropertyType,
    pub status: PropertyStatus,
    #[serde(default)]
    pub featured: bool,
    pub images: Vec<String>,
    #[serde(default)]
    pub interior_features: Option<Vec<String>>,
    #[serde(default)]
    pub exterior_features: Option<Vec<String>>,
}

/// Partial update payload for a property.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<Currency>,
    pub location: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub square_footage: Option<u32>,
    pub property_type: Option<PropertyType>,
    pub status: Option<PropertyStatus>,
    pub featured: Option<bool>,
    pub images: Option<Vec<String>>,
    pub interior_features: Option<Vec<String>>,
    pub exterior_features: Option<Vec<String>>,
}

impl Listing for Property {
    type Draft = PropertyDraft;
    type Patch = PropertyPatch;

    const KIND: ListingKind = ListingKind::Property;
    const SEARCH_FIELDS: &'static [Field] = &[Field::Title, Field::Description, Field::Location];

    fn from_draft(id: String, draft: PropertyDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            price: draft.price,
            currency: draft.currency,
            location: draft.location,
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            square_footage: draft.square_footage,
            property_type: draft.property_type,
            status: draft.status,
            featured: draft.featured,
            images: draft.images,
            interior_features: draft.interior_features.unwrap_or_default(),
            exterior_features: draft.exterior_features.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: PropertyPatch) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(currency) = patch.currency {
            self.currency = currency;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(bedrooms) = patch.bedrooms {
            self.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = patch.bathrooms {
            self.bathrooms = bathrooms;
        }
        if let Some(square_footage) = patch.square_footage {
            self.square_footage = square_footage;
        }
        if let Some(property_type) = patch.property_type {
            self.property_type = property_type;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(features) = patch.interior_features {
            self.interior_features = features;
        }
        if let Some(features) = patch.exterior_features {
            self.exterior_features = features;
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn images(&self) -> &[String] {
        &self.images
    }

    fn featured(&self) -> bool {
        self.featured
    }

    fn price(&self) -> f64 {
        self.price
    }

    fn currency(&self) -> Currency {
        self.currency
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn field(&self, field: Field) -> Option<FieldValue<'_>> {
        Some(match field {
            Field::Title => FieldValue::Text(&self.title),
            Field::Description => FieldValue::Text(&self.description),
            Field::Location => FieldValue::Text(&self.location),
            Field::Status => FieldValue::Text(self.status.as_str()),
            Field::PropertyType => FieldValue::Text(self.property_type.as_str()),
            Field::Bedrooms => FieldValue::Int(i64::from(self.bedrooms)),
            Field::Featured => FieldValue::Bool(self.featured),
            Field::Price => FieldValue::Number(self.price),
            Field::Make | Field::Model | Field::Year => return None,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_common(
            &self.title,
            &self.description,
            &self.location,
            self.price,
            &self.images,
        )?;
        if !self.status.fits(self.property_type) {
            let allowed = if self.property_type == PropertyType::ShortLet {
                "Available or Taken"
            } else {
                "For Sale, For Rent, Sold or Rented"
            };
            return Err(ValidationError(format!(
                "status {} is not valid for property type {}; expected {allowed}",
                self.status, self.property_type
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_draft(title: &str) -> PropertyDraft {
    PropertyDraft {
        title: title.to_string(),
        description: "Ocean-view home".to_string(),
        price: 250_000_000.0,
        currency: Currency::Ngn,
        location: "Lekki, Lagos".to_string(),
        bedrooms: 4,
        bathrooms: 5,
        square_footage: 3200,
        property_type: PropertyType::Villa,
        status: PropertyStatus::ForSale,
        featured: false,
        images: vec!["https://cdn.test/tonyluxe/seaside.jpg".to_string()],
        interior_features: None,
        exterior_features: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(title: &str) -> Property {
        Property::from_draft("p1".to_string(), sample_draft(title), Utc::now())
    }

    #[test]
    fn draft_defaults_and_trimmed_title() {
        let property = property("  Seaside Villa  ");
        assert_eq!(property.title, "Seaside Villa");
        assert!(!property.featured);
        assert!(property.interior_features.is_empty());
        assert_eq!(property.created_at, property.updated_at);
        assert!(property.validate().is_ok());
    }

    #[test]
    fn short_let_requires_availability_status() {
        let mut property = property("Island Short Let");
        property.property_type = PropertyType::ShortLet;
        assert!(property.validate().is_err());
        property.status = PropertyStatus::Available;
        assert!(property.validate().is_ok());

        property.property_type = PropertyType::Apartment;
        assert!(property.validate().is_err());
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut property = property("Seaside Villa");
        property.apply_patch(PropertyPatch {
            price: Some(1.0),
            featured: Some(true),
            ..PropertyPatch::default()
        });
        assert_eq!(property.price, 1.0);
        assert!(property.featured);
        assert_eq!(property.title, "Seaside Villa");
        assert_eq!(property.bedrooms, 4);
    }

    #[test]
    fn enum_strings_match_display_names() {
        assert_eq!(PropertyType::ALL.len(), 18);
        assert_eq!(PropertyType::Condo.as_str(), "Condo (Condominium)");
        assert_eq!(
            "Hotel/Guest House".parse::<PropertyType>().ok(),
            Some(PropertyType::GuestHouse)
        );
        let status: PropertyStatus = serde_json::from_str("\"For Rent\"").expect("status");
        assert_eq!(status, PropertyStatus::ForRent);
        assert!(serde_json::from_str::<PropertyStatus>("\"for rent\"").is_err());
    }

    #[test]
    fn draft_rejects_unknown_enum_values() {
        let body = serde_json::json!({
            "title": "x", "description": "d", "price": 1.0, "location": "l",
            "bedrooms": 1, "bathrooms": 1, "squareFootage": 1,
            "propertyType": "Castle", "status": "For Sale", "images": ["u"]
        });
        assert!(serde_json::from_value::<PropertyDraft>(body).is_err());
    }

    #[test]
    fn field_lookup_covers_property_fields_only() {
        let property = property("Seaside Villa");
        assert_eq!(property.field(Field::Status), Some(FieldValue::Text("For Sale")));
        assert_eq!(property.field(Field::Bedrooms), Some(FieldValue::Int(4)));
        assert_eq!(property.field(Field::Make), None);
    }
}
