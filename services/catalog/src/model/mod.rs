//! Catalog data model module.
//!
//! # Purpose
//! Re-exports the property and car documents, their create/patch payloads, and
//! the [`Listing`] abstraction shared by the store, query, and service layers.

/// Declares a closed set of display strings as a Rust enum.
///
/// Every variant serializes to (and parses from) its exact display string, so
/// JSON payloads, database columns, and query filters all agree on spelling.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            serde::Serialize,
            serde::Deserialize,
            utoipa::ToSchema,
        )]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::model::ValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::model::ValidationError(format!(
                        "invalid {}: {other}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

mod car;
mod listing;
mod property;

pub use car::{
    Car, CarCondition, CarDraft, CarPatch, CarStatus, EARLIEST_MODEL_YEAR, FuelType, Transmission,
};
pub use listing::{
    Currency, DESCRIPTION_MAX_CHARS, Field, FieldValue, LOCATION_MAX_CHARS, Listing, ListingKind,
    TITLE_MAX_CHARS, ValidationError,
};
pub use property::{Property, PropertyDraft, PropertyPatch, PropertyStatus, PropertyType};

#[cfg(test)]
pub(crate) use car::sample_draft as sample_car_draft;
#[cfg(test)]
pub(crate) use property::sample_draft as sample_property_draft;
