//! Dashboard statistics over both catalogs.
//!
//! Totals are computed with store-side counts and sums so the dashboard does
//! not page through whole collections. `totalValue` adds raw prices and does
//! not convert between currencies.
use crate::model::{Car, CarStatus, Field, Property, PropertyStatus, PropertyType};
use crate::store::{
    CatalogStore, FilterValue, ListingFilter, ListingStore, PageWindow, Predicate, SortOrder,
    StoreResult,
};
use serde::Serialize;
use utoipa::ToSchema;

pub const RECENT_LIMIT: u64 = 5;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyStats {
    pub total: u64,
    pub for_sale: u64,
    pub for_rent: u64,
    pub sold: u64,
    pub rented: u64,
    pub available: u64,
    pub taken: u64,
    pub short_let: u64,
    pub featured: u64,
    /// Sum of prices over listings still on the market.
    pub total_value: f64,
    pub recent: Vec<Property>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarStats {
    pub total: u64,
    pub for_sale: u64,
    pub sold: u64,
    pub featured: u64,
    pub total_value: f64,
    pub recent: Vec<Car>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTotals {
    pub listings: u64,
    pub featured: u64,
    pub total_value: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogStats {
    pub properties: PropertyStats,
    pub cars: CarStats,
    pub totals: CatalogTotals,
}

fn status_is(status: &str) -> ListingFilter {
    ListingFilter::new().and(Predicate::Equals(
        Field::Status,
        FilterValue::Text(status.to_string()),
    ))
}

fn featured_only() -> ListingFilter {
    ListingFilter::new().and(Predicate::Equals(Field::Featured, FilterValue::Bool(true)))
}

async fn property_stats(store: &dyn CatalogStore) -> StoreResult<PropertyStats> {
    let count = move |filter: ListingFilter| async move {
        ListingStore::<Property>::count(store, &filter).await
    };
    let sum = move |filter: ListingFilter| async move {
        ListingStore::<Property>::sum_price(store, &filter).await
    };

    let mut total_value = 0.0;
    for status in [
        PropertyStatus::ForSale,
        PropertyStatus::ForRent,
        PropertyStatus::Available,
    ] {
        total_value += sum(status_is(status.as_str())).await?;
    }

    Ok(PropertyStats {
        total: count(ListingFilter::new()).await?,
        for_sale: count(status_is(PropertyStatus::ForSale.as_str())).await?,
        for_rent: count(status_is(PropertyStatus::ForRent.as_str())).await?,
        sold: count(status_is(PropertyStatus::Sold.as_str())).await?,
        rented: count(status_is(PropertyStatus::Rented.as_str())).await?,
        available: count(status_is(PropertyStatus::Available.as_str())).await?,
        taken: count(status_is(PropertyStatus::Taken.as_str())).await?,
        short_let: count(ListingFilter::new().and(Predicate::Equals(
            Field::PropertyType,
            FilterValue::Text(PropertyType::ShortLet.as_str().to_string()),
        )))
        .await?,
        featured: count(featured_only()).await?,
        total_value,
        recent: ListingStore::<Property>::list(
            store,
            &ListingFilter::new(),
            SortOrder::Newest,
            PageWindow::first(RECENT_LIMIT),
        )
        .await?,
    })
}

async fn car_stats(store: &dyn CatalogStore) -> StoreResult<CarStats> {
    let count = move |filter: ListingFilter| async move {
        ListingStore::<Car>::count(store, &filter).await
    };
    let for_sale = status_is(CarStatus::ForSale.as_str());

    Ok(CarStats {
        total: count(ListingFilter::new()).await?,
        for_sale: count(for_sale.clone()).await?,
        sold: count(status_is(CarStatus::Sold.as_str())).await?,
        featured: count(featured_only()).await?,
        total_value: ListingStore::<Car>::sum_price(store, &for_sale).await?,
        recent: ListingStore::<Car>::list(
            store,
            &ListingFilter::new(),
            SortOrder::Newest,
            PageWindow::first(RECENT_LIMIT),
        )
        .await?,
    })
}

pub async fn catalog_stats(store: &dyn CatalogStore) -> StoreResult<CatalogStats> {
    let (properties, cars) = tokio::try_join!(property_stats(store), car_stats(store))?;
    let totals = CatalogTotals {
        listings: properties.total + cars.total,
        featured: properties.featured + cars.featured,
        total_value: properties.total_value + cars.total_value,
    };
    Ok(CatalogStats {
        properties,
        cars,
        totals,
    })
}
