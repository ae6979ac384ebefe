//! Listing query builder.
//!
//! Translates flat query-string parameters into a store-agnostic
//! [`ListingFilter`], a sort order, and a page window. Empty parameters are
//! treated as absent; malformed numbers are rejected, never coerced.
use crate::model::{Car, Field, Listing, Property, PropertyStatus, PropertyType};
use crate::store::{FilterValue, ListingFilter, PageWindow, Predicate, SortOrder};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

pub const MAX_PAGE_LIMIT: u64 = 100;
pub const ADMIN_DEFAULT_LIMIT: u64 = 10;
pub const PUBLIC_DEFAULT_LIMIT: u64 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {param}: {reason}")]
pub struct QueryError {
    pub param: &'static str,
    pub reason: String,
}

impl QueryError {
    fn new(param: &'static str, reason: impl Into<String>) -> Self {
        Self {
            param,
            reason: reason.into(),
        }
    }
}

/// Which API surface a query arrives on; decides defaults and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Admin,
    Public,
}

impl Surface {
    pub fn default_limit(self) -> u64 {
        match self {
            Surface::Admin => ADMIN_DEFAULT_LIMIT,
            Surface::Public => PUBLIC_DEFAULT_LIMIT,
        }
    }

    pub fn sort(self) -> SortOrder {
        match self {
            Surface::Admin => SortOrder::Newest,
            Surface::Public => SortOrder::FeaturedThenNewest,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filter: ListingFilter,
    pub sort: SortOrder,
    pub page: u64,
    pub limit: u64,
}

impl ListQuery {
    pub fn window(&self) -> PageWindow {
        PageWindow {
            offset: (self.page - 1).saturating_mul(self.limit),
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageMeta {
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}

impl PageMeta {
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        Self {
            total,
            page,
            pages: total.div_ceil(limit.max(1)),
        }
    }
}

/// Kind-specific query parameters.
pub trait Queryable: Listing {
    fn push_kind_filters(
        params: &Params<'_>,
        surface: Surface,
        filter: &mut ListingFilter,
    ) -> Result<(), QueryError>;
}

/// Borrowed view over raw query parameters.
pub struct Params<'a>(&'a HashMap<String, String>);

impl<'a> Params<'a> {
    /// Value of `name`, `None` when absent or blank.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.0
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn parse<T: FromStr>(&self, name: &'static str, expected: &str) -> Result<Option<T>, QueryError> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| QueryError::new(name, format!("expected {expected}, got {raw:?}"))),
        }
    }

    fn price(&self, name: &'static str) -> Result<Option<f64>, QueryError> {
        match self.parse::<f64>(name, "a non-negative number")? {
            Some(value) if !value.is_finite() || value < 0.0 => Err(QueryError::new(
                name,
                "expected a non-negative number",
            )),
            other => Ok(other),
        }
    }
}

pub fn build_query<L: Queryable>(
    params: &HashMap<String, String>,
    surface: Surface,
) -> Result<ListQuery, QueryError> {
    let params = Params(params);

    let page = params
        .parse::<u64>("page", "a positive integer")?
        .unwrap_or(1);
    if page == 0 {
        return Err(QueryError::new("page", "must be at least 1"));
    }
    let limit = params
        .parse::<u64>("limit", "a positive integer")?
        .unwrap_or_else(|| surface.default_limit());
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(QueryError::new(
            "limit",
            format!("must be between 1 and {MAX_PAGE_LIMIT}"),
        ));
    }

    let mut filter = ListingFilter::new();
    if let Some(status) = params.get("status") {
        filter.push(Predicate::Equals(
            Field::Status,
            FilterValue::Text(status.to_string()),
        ));
    }
    if params.get("featured") == Some("true") {
        filter.push(Predicate::Equals(Field::Featured, FilterValue::Bool(true)));
    }
    let min = params.price("minPrice")?;
    let max = params.price("maxPrice")?;
    if min.is_some() || max.is_some() {
        filter.push(Predicate::PriceRange { min, max });
    }
    if let Some(search) = params.get("search") {
        filter.push(Predicate::AnyContains(
            L::SEARCH_FIELDS.to_vec(),
            search.to_string(),
        ));
    }
    L::push_kind_filters(&params, surface, &mut filter)?;

    Ok(ListQuery {
        filter,
        sort: surface.sort(),
        page,
        limit,
    })
}

impl Queryable for Property {
    fn push_kind_filters(
        params: &Params<'_>,
        surface: Surface,
        filter: &mut ListingFilter,
    ) -> Result<(), QueryError> {
        if let Some(bedrooms) = params.parse::<u32>("bedrooms", "a non-negative integer")? {
            filter.push(Predicate::Equals(
                Field::Bedrooms,
                FilterValue::Int(i64::from(bedrooms)),
            ));
        }
        if let Some(location) = params.get("location") {
            filter.push(Predicate::Contains(Field::Location, location.to_string()));
        }
        if let Some(category) = params.get("propertyType") {
            match surface {
                Surface::Public => push_public_category(category, filter),
                Surface::Admin => filter.push(Predicate::Equals(
                    Field::PropertyType,
                    FilterValue::Text(category.to_string()),
                )),
            }
        }
        Ok(())
    }
}

/// Public browsing tabs: Buy, Rent and Airbnb/Short Let. Anything else is ignored.
fn push_public_category(category: &str, filter: &mut ListingFilter) {
    let predicate = match category {
        "Buy" => Predicate::Equals(
            Field::Status,
            FilterValue::Text(PropertyStatus::ForSale.as_str().to_string()),
        ),
        "Rent" => Predicate::Equals(
            Field::Status,
            FilterValue::Text(PropertyStatus::ForRent.as_str().to_string()),
        ),
        "Airbnb" | "Short Let" => Predicate::Equals(
            Field::PropertyType,
            FilterValue::Text(PropertyType::ShortLet.as_str().to_string()),
        ),
        _ => return,
    };
    filter.push(predicate);
}

impl Queryable for Car {
    fn push_kind_filters(
        params: &Params<'_>,
        _surface: Surface,
        filter: &mut ListingFilter,
    ) -> Result<(), QueryError> {
        if let Some(make) = params.get("make") {
            filter.push(Predicate::Contains(Field::Make, make.to_string()));
        }
        if let Some(model) = params.get("model") {
            filter.push(Predicate::Contains(Field::Model, model.to_string()));
        }
        if let Some(year) = params.parse::<u16>("year", "a model year")? {
            filter.push(Predicate::Equals(Field::Year, FilterValue::Int(i64::from(year))));
        }
        Ok(())
    }
}
