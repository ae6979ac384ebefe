//! Car documents.
use super::listing::{
    Currency, Field, FieldValue, Listing, ListingKind, ValidationError, check_common,
    check_required,
};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// First model year accepted for a car.
pub const EARLIEST_MODEL_YEAR: i32 = 1886;

string_enum! {
    FuelType {
        Petrol => "Petrol",
        Diesel => "Diesel",
        Electric => "Electric",
        Hybrid => "Hybrid",
        Other => "Other",
    }
}

string_enum! {
    Transmission {
        Automatic => "Automatic",
        Manual => "Manual",
        SemiAutomatic => "Semi-Automatic",
    }
}

string_enum! {
    CarCondition {
        New => "New",
        Used => "Used",
    }
}

impl Default for CarCondition {
    fn default() -> Self {
        CarCondition::Used
    }
}

string_enum! {
    CarStatus {
        ForSale => "For Sale",
        Sold => "Sold",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub currency: Currency,
    pub location: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub mileage: u32,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub color: String,
    pub condition: CarCondition,
    pub status: CarStatus,
    pub featured: bool,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create payload for a car.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub currency: Currency,
    pub location: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub mileage: u32,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub color: String,
    #[serde(default)]
    pub condition: CarCondition,
    pub status: CarStatus,
    #[serde(default)]
    pub featured: bool,
    pub images: Vec<String>,
}

/// Partial update payload for a car.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<Currency>,
    pub location: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub mileage: Option<u32>,
    pub fuel_type: Option<FuelType>,
    pub transmission: Option<Transmission>,
    pub color: Option<String>,
    pub condition: Option<CarCondition>,
    pub status: Option<CarStatus>,
    pub featured: Option<bool>,
    pub images: Option<Vec<String>>,
}

impl Listing for Car {
    type Draft = CarDraft;
    type Patch = CarPatch;

    const KIND: ListingKind = ListingKind::Car;
    const SEARCH_FIELDS: &'static [Field] =
        &[Field::Title, Field::Description, Field::Make, Field::Model];

    fn from_draft(id: String, draft: CarDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            price: draft.price,
            currency: draft.currency,
            location: draft.location,
            make: draft.make,
            model: draft.model,
            year: draft.year,
            mileage: draft.mileage,
            fuel_type: draft.fuel_type,
            transmission: draft.transmission,
            color: draft.color,
            condition: draft.condition,
            status: draft.status,
            featured: draft.featured,
            images: draft.images,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: CarPatch) {
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
        if let Some(make) = patch.make {
            self.make = make;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(mileage) = patch.mileage {
            self.mileage = mileage;
        }
        if let Some(fuel_type) = patch.fuel_type {
            self.fuel_type = fuel_type;
        }
        if let Some(transmission) = patch.transmission {
            self.transmission = transmission;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(condition) = patch.condition {
            self.condition = condition;
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
            Field::Make => FieldValue::Text(&self.make),
            Field::Model => FieldValue::Text(&self.model),
            Field::Year => FieldValue::Int(i64::from(self.year)),
            Field::Featured => FieldValue::Bool(self.featured),
            Field::Price => FieldValue::Number(self.price),
            Field::PropertyType | Field::Bedrooms => return None,
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
        check_required("make", &self.make)?;
        check_required("model", &self.model)?;
        check_required("color", &self.color)?;
        let latest = Utc::now().year() + 1;
        if !(EARLIEST_MODEL_YEAR..=latest).contains(&self.year) {
            return Err(ValidationError(format!(
                "year must be between {EARLIEST_MODEL_YEAR} and {latest}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_draft(title: &str, price: f64) -> CarDraft {
    CarDraft {
        title: title.to_string(),
        description: "Single owner, full service history".to_string(),
        price,
        currency: Currency::Ngn,
        location: "Abuja".to_string(),
        make: "Toyota".to_string(),
        model: "Land Cruiser".to_string(),
        year: 2021,
        mileage: 42_000,
        fuel_type: FuelType::Petrol,
        transmission: Transmission::Automatic,
        color: "Black".to_string(),
        condition: CarCondition::Used,
        status: CarStatus::ForSale,
        featured: false,
        images: vec!["https://cdn.test/tonyluxe/cruiser.jpg".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car() -> Car {
        Car::from_draft("c1".to_string(), sample_draft("Cruiser", 1.0), Utc::now())
    }

    #[test]
    fn year_bounds() {
        let mut car = car();
        assert!(car.validate().is_ok());
        car.year = EARLIEST_MODEL_YEAR - 1;
        assert!(car.validate().is_err());
        car.year = Utc::now().year() + 1;
        assert!(car.validate().is_ok());
        car.year = Utc::now().year() + 2;
        assert!(car.validate().is_err());
    }

    #[test]
    fn blank_make_is_rejected() {
        let mut car = car();
        car.make = "  ".to_string();
        assert!(car.validate().is_err());
    }

    #[test]
    fn condition_defaults_to_used() {
        let body = serde_json::json!({
            "title": "Cruiser", "description": "d", "price": 1.0, "location": "l",
            "make": "Toyota", "model": "LC", "year": 2020, "mileage": 1,
            "fuelType": "Diesel", "transmission": "Semi-Automatic", "color": "Red",
            "status": "For Sale", "images": ["u"]
        });
        let draft: CarDraft = serde_json::from_value(body).expect("draft");
        assert_eq!(draft.condition, CarCondition::Used);
        assert_eq!(draft.transmission, Transmission::SemiAutomatic);
        assert_eq!(draft.currency, Currency::Ngn);
    }

    #[test]
    fn car_fields() {
        let car = car();
        assert_eq!(car.field(Field::Year), Some(FieldValue::Int(2021)));
        assert_eq!(car.field(Field::Bedrooms), None);
    }
}
