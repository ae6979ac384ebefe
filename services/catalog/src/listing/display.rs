//! Public presentation of listings.
//!
//! Anonymous browsing gets compact cards in lists and the full document plus
//! pre-formatted price strings on detail pages.
use crate::model::{
    Car, CarStatus, Currency, Listing, Property, PropertyStatus, PropertyType,
};
use serde::Serialize;
use utoipa::ToSchema;

pub const PROPERTY_PLACEHOLDER_IMAGE: &str = "/placeholder-property.jpg";
pub const CAR_PLACEHOLDER_IMAGE: &str = "/placeholder-car.jpg";
pub const DEFAULT_CAR_LOCATION: &str = "Nigeria";

/// `₦250,000,000`, `$1,250.50`. Fractions are kept to two places.
pub fn format_price(price: f64, currency: Currency) -> String {
    let cents = (price * 100.0).round() as u128;
    let whole = cents / 100;
    let fraction = cents % 100;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if fraction == 0 {
        format!("{}{grouped}", currency.symbol())
    } else {
        format!("{}{grouped}.{fraction:02}", currency.symbol())
    }
}

fn first_image<L: Listing>(listing: &L, placeholder: &str) -> String {
    listing
        .images()
        .first()
        .cloned()
        .unwrap_or_else(|| placeholder.to_string())
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyCard {
    pub id: String,
    pub title: String,
    pub image: String,
    pub price: String,
    pub location: String,
    pub bed_bath: String,
    pub status: PropertyStatus,
    pub property_type: PropertyType,
    pub featured: bool,
}

impl From<&Property> for PropertyCard {
    fn from(property: &Property) -> Self {
        let mut price = format_price(property.price, property.currency);
        if property.status == PropertyStatus::ForRent {
            price.push_str("/yr");
        }
        Self {
            id: property.id.clone(),
            title: property.title.clone(),
            image: first_image(property, PROPERTY_PLACEHOLDER_IMAGE),
            price,
            location: property.location.clone(),
            bed_bath: format!("{}/{}", property.bedrooms, property.bathrooms),
            status: property.status,
            property_type: property.property_type,
            featured: property.featured,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarCard {
    pub id: String,
    pub title: String,
    pub image: String,
    pub price: String,
    pub location: String,
    pub bed_bath: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub status: CarStatus,
    pub featured: bool,
}

fn car_location(car: &Car) -> String {
    if car.location.trim().is_empty() {
        DEFAULT_CAR_LOCATION.to_string()
    } else {
        car.location.clone()
    }
}

impl From<&Car> for CarCard {
    fn from(car: &Car) -> Self {
        Self {
            id: car.id.clone(),
            title: car.title.clone(),
            image: first_image(car, CAR_PLACEHOLDER_IMAGE),
            price: format_price(car.price, car.currency),
            location: car_location(car),
            bed_bath: format!("{}/{}", car.make, car.model),
            make: car.make.clone(),
            model: car.model.clone(),
            year: car.year,
            status: car.status,
            featured: car.featured,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetail {
    #[serde(flatten)]
    pub property: Property,
    pub formatted_price: String,
    pub bed_bath: String,
    pub size: u32,
}

impl From<Property> for PropertyDetail {
    fn from(property: Property) -> Self {
        Self {
            formatted_price: format_price(property.price, property.currency),
            bed_bath: format!("{}/{}", property.bedrooms, property.bathrooms),
            size: property.square_footage,
            property,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarDetail {
    #[serde(flatten)]
    pub car: Car,
    pub formatted_price: String,
}

impl From<Car> for CarDetail {
    fn from(mut car: Car) -> Self {
        car.location = car_location(&car);
        Self {
            formatted_price: format_price(car.price, car.currency),
            car,
        }
    }
}
